// engine/resource.rs - 实体资源
//! 把查询字符串形式的请求分发给实体服务和条件查询服务

use serde_json::Value;

use crate::api::{ListRequest, Page, RequestOptions};
use crate::schema::Record;

use super::core::{EngineError, EngineResult, QueryService};
use super::service::EntityService;

/// 一类实体对外提供的操作
pub struct Resource<R: Record> {
    service: EntityService<R>,
    query: QueryService<R>,
    options: RequestOptions,
}

impl<R: Record> Resource<R> {
    pub fn new(service: EntityService<R>, query: QueryService<R>, options: RequestOptions) -> Self {
        Self { service, query, options }
    }

    pub fn service(&self) -> &EntityService<R> {
        &self.service
    }

    pub fn query(&self) -> &QueryService<R> {
        &self.query
    }

    /// 按条件分页查询，例如 `name.contains=AA&page=0&size=5&sort=id,desc`
    pub fn list(&self, query: &str) -> EngineResult<Page<R>> {
        tracing::debug!("REST request to get a page of {} : {}", R::ENTITY_NAME, query);
        let request = ListRequest::parse::<R>(query, &self.options)?;
        self.query.find_page_by_criteria(Some(&request.criteria), &request.page)
    }

    /// 按条件计数，分页和排序参数不影响结果
    pub fn count(&self, query: &str) -> EngineResult<u64> {
        tracing::debug!("REST request to count {} by criteria: {}", R::ENTITY_NAME, query);
        let request = ListRequest::parse::<R>(query, &self.options)?;
        self.query.count_by_criteria(Some(&request.criteria))
    }

    pub fn get(&self, id: i64) -> EngineResult<R> {
        self.service.get(id)
    }

    pub fn create(&self, record: R) -> EngineResult<R> {
        self.service.create(record)
    }

    pub fn update(&self, id: i64, record: R) -> EngineResult<R> {
        self.service.update(id, record)
    }

    /// 部分更新，记录不存在时返回 NotFound
    pub fn partial_update(&self, id: i64, patch: &Value) -> EngineResult<R> {
        self.service
            .partial_update(id, patch)?
            .ok_or(EngineError::NotFound { entity: R::ENTITY_NAME, id })
    }

    pub fn delete(&self, id: i64) -> EngineResult<()> {
        self.service.delete(id)?;
        Ok(())
    }
}
