// engine/core.rs - 查询引擎核心
//! 错误类型、条件查询服务和商店引擎

use std::sync::Arc;

use crate::api::{Page, PageRequest};
use crate::config::{AppConfig, ConfigError};
use crate::query::{sort_records, unknown_sort_field, Criteria, FilterBuilder, FilterOptions, QueryError};
use crate::registry::{Repository, StoreError};
use crate::schema::{Bill, Category, Favorite, Product, Record, Size};

use super::resource::Resource;

/// 引擎错误类型
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("Invalid page request: {0}")]
    InvalidPageRequest(String),

    #[error("{message}")]
    BadRequest {
        entity: &'static str,
        key: &'static str,
        message: String,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("{entity} {id} does not belong to the current user")]
    Forbidden { entity: &'static str, id: i64 },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn bad_request(entity: &'static str, key: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest { entity, key, message: message.into() }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// 校验分页参数和排序字段（在访问存储之前）
pub(crate) fn check_page<R: Record>(page: &PageRequest, max_page_size: usize) -> EngineResult<()> {
    page.validate(max_page_size)?;
    if let Some(field) = unknown_sort_field::<R>(&page.sort) {
        return Err(EngineError::UnknownSortField(field.to_string()));
    }
    Ok(())
}

/// 对已过滤的记录排序并截取一页
pub(crate) fn paginate<R: Record>(mut records: Vec<R>, page: &PageRequest) -> Page<R> {
    sort_records(&mut records, &page.sort);
    let total = records.len();
    let content: Vec<R> = records.into_iter().skip(page.offset()).take(page.size).collect();
    Page::new(content, total, page.page, page.size)
}

fn describe(criteria: Option<&Criteria>) -> String {
    criteria.map(|c| c.to_string()).unwrap_or_else(|| "Criteria{}".to_string())
}

/// 条件查询服务
///
/// 查询、分页和计数都从同一个 Specification 计算，`count_by_criteria`
/// 总是等于 `find_by_criteria` 的结果数量。
pub struct QueryService<R: Record> {
    repository: Arc<dyn Repository<R>>,
    filter: FilterBuilder<R>,
    max_page_size: usize,
}

impl<R: Record> QueryService<R> {
    pub fn new(repository: Arc<dyn Repository<R>>) -> Self {
        Self {
            repository,
            filter: FilterBuilder::new(),
            max_page_size: 2000,
        }
    }

    pub fn with_filter_options(mut self, options: FilterOptions) -> Self {
        self.filter = FilterBuilder::with_options(options);
        self
    }

    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// 返回所有满足条件的记录
    pub fn find_by_criteria(&self, criteria: Option<&Criteria>) -> EngineResult<Vec<R>> {
        tracing::debug!("find {} by criteria : {}", R::ENTITY_NAME, describe(criteria));
        let spec = self.filter.build_specification(criteria)?;
        Ok(spec.apply(self.repository.find_all()?))
    }

    /// 返回满足条件的一页记录
    pub fn find_page_by_criteria(&self, criteria: Option<&Criteria>, page: &PageRequest) -> EngineResult<Page<R>> {
        tracing::debug!(
            "find {} by criteria : {}, page: {:?}",
            R::ENTITY_NAME,
            describe(criteria),
            page
        );
        let spec = self.filter.build_specification(criteria)?;
        check_page::<R>(page, self.max_page_size)?;
        let matched = spec.apply(self.repository.find_all()?);
        Ok(paginate(matched, page))
    }

    /// 返回满足条件的记录数
    pub fn count_by_criteria(&self, criteria: Option<&Criteria>) -> EngineResult<u64> {
        tracing::debug!("count {} by criteria : {}", R::ENTITY_NAME, describe(criteria));
        let spec = self.filter.build_specification(criteria)?;
        let records = self.repository.find_all()?;
        Ok(spec.count(&records) as u64)
    }
}

/// 按实体类型取得对应的资源
pub trait ResourceProvider<R: Record> {
    fn resource(&self) -> &Resource<R>;
}

/// 商店引擎 - 持有五类实体的资源
pub struct ShopEngine {
    pub(crate) config: Arc<AppConfig>,
    pub(crate) sizes: Resource<Size>,
    pub(crate) categories: Resource<Category>,
    pub(crate) products: Resource<Product>,
    pub(crate) bills: Resource<Bill>,
    pub(crate) favorites: Resource<Favorite>,
}

impl ShopEngine {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sizes(&self) -> &Resource<Size> {
        &self.sizes
    }

    pub fn categories(&self) -> &Resource<Category> {
        &self.categories
    }

    pub fn products(&self) -> &Resource<Product> {
        &self.products
    }

    pub fn bills(&self) -> &Resource<Bill> {
        &self.bills
    }

    pub fn favorites(&self) -> &Resource<Favorite> {
        &self.favorites
    }

    /// 获取引擎统计
    pub fn stats(&self) -> EngineResult<EngineStats> {
        Ok(EngineStats {
            sizes: self.sizes.service().count()?,
            categories: self.categories.service().count()?,
            products: self.products.service().count()?,
            bills: self.bills.service().count()?,
            favorites: self.favorites.service().count()?,
        })
    }
}

impl ResourceProvider<Size> for ShopEngine {
    fn resource(&self) -> &Resource<Size> {
        &self.sizes
    }
}

impl ResourceProvider<Category> for ShopEngine {
    fn resource(&self) -> &Resource<Category> {
        &self.categories
    }
}

impl ResourceProvider<Product> for ShopEngine {
    fn resource(&self) -> &Resource<Product> {
        &self.products
    }
}

impl ResourceProvider<Bill> for ShopEngine {
    fn resource(&self) -> &Resource<Bill> {
        &self.bills
    }
}

impl ResourceProvider<Favorite> for ShopEngine {
    fn resource(&self) -> &Resource<Favorite> {
        &self.favorites
    }
}

/// 引擎统计信息
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EngineStats {
    pub sizes: usize,
    pub categories: usize,
    pub products: usize,
    pub bills: usize,
    pub favorites: usize,
}
