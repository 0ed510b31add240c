// engine/service.rs - 实体服务
//! 通用的增删改查服务，所有实体共用

use std::sync::Arc;

use serde_json::Value;

use crate::api::{Page, PageRequest};
use crate::registry::Repository;
use crate::schema::Record;

use super::core::{check_page, paginate, EngineError, EngineResult};

/// 实体服务
pub struct EntityService<R: Record> {
    pub(crate) repository: Arc<dyn Repository<R>>,
    max_page_size: usize,
}

impl<R: Record> EntityService<R> {
    pub fn new(repository: Arc<dyn Repository<R>>) -> Self {
        Self { repository, max_page_size: 2000 }
    }

    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// 保存记录（新增或覆盖）
    pub fn save(&self, mut record: R) -> EngineResult<R> {
        tracing::debug!("Request to save {} : {:?}", R::ENTITY_NAME, record);
        record.prepare_for_save();
        record
            .validate()
            .map_err(|msg| EngineError::bad_request(R::ENTITY_NAME, "validation", msg))?;
        Ok(self.repository.save(record)?)
    }

    /// 新建记录，不允许带 id
    pub fn create(&self, record: R) -> EngineResult<R> {
        if record.id().is_some() {
            return Err(EngineError::bad_request(
                R::ENTITY_NAME,
                "idexists",
                format!("A new {} cannot already have an ID", R::ENTITY_NAME),
            ));
        }
        self.save(record)
    }

    /// 整体更新：记录 id 必须与路径 id 一致且已存在
    pub fn update(&self, id: i64, record: R) -> EngineResult<R> {
        tracing::debug!("Request to update {} : {}", R::ENTITY_NAME, id);
        self.check_update_target(id, record.id())?;
        self.save(record)
    }

    /// 部分更新：只合并 patch 中非 null 的字段
    ///
    /// 记录在检查之后被并发删除时返回 `Ok(None)`。
    pub fn partial_update(&self, id: i64, patch: &Value) -> EngineResult<Option<R>> {
        tracing::debug!("Request to partially update {} : {}", R::ENTITY_NAME, id);
        self.check_update_target(id, patch.get("id").and_then(Value::as_i64))?;

        let Some(existing) = self.repository.find_by_id(id)? else {
            return Ok(None);
        };
        let merged = merge_patch(&existing, patch)?;
        self.save(merged).map(Some)
    }

    fn check_update_target(&self, id: i64, record_id: Option<i64>) -> EngineResult<()> {
        match record_id {
            None => Err(EngineError::bad_request(R::ENTITY_NAME, "idnull", "Invalid id")),
            Some(rid) if rid != id => Err(EngineError::bad_request(R::ENTITY_NAME, "idinvalid", "Invalid ID")),
            Some(_) if !self.repository.exists_by_id(id)? => {
                Err(EngineError::bad_request(R::ENTITY_NAME, "idnotfound", "Entity not found"))
            }
            Some(_) => Ok(()),
        }
    }

    /// 分页列出全部记录
    pub fn find_all(&self, page: &PageRequest) -> EngineResult<Page<R>> {
        tracing::debug!("Request to get all {} : {:?}", R::ENTITY_NAME, page);
        check_page::<R>(page, self.max_page_size)?;
        Ok(paginate(self.repository.find_all()?, page))
    }

    pub fn find_one(&self, id: i64) -> EngineResult<Option<R>> {
        tracing::debug!("Request to get {} : {}", R::ENTITY_NAME, id);
        Ok(self.repository.find_by_id(id)?)
    }

    /// 按 id 获取，不存在时返回 NotFound
    pub fn get(&self, id: i64) -> EngineResult<R> {
        self.find_one(id)?
            .ok_or(EngineError::NotFound { entity: R::ENTITY_NAME, id })
    }

    /// 删除记录，返回记录是否存在
    pub fn delete(&self, id: i64) -> EngineResult<bool> {
        tracing::debug!("Request to delete {} : {}", R::ENTITY_NAME, id);
        Ok(self.repository.delete_by_id(id)?)
    }

    pub fn count(&self) -> EngineResult<usize> {
        Ok(self.repository.count()?)
    }
}

/// 把 patch 中非 null 的字段覆盖到现有记录上
fn merge_patch<R: Record>(existing: &R, patch: &Value) -> EngineResult<R> {
    let Value::Object(changes) = patch else {
        return Err(EngineError::bad_request(R::ENTITY_NAME, "invalidpatch", "patch must be a JSON object"));
    };
    let mut current = serde_json::to_value(existing)?;
    if let Value::Object(target) = &mut current {
        for (key, value) in changes.iter().filter(|(_, v)| !v.is_null()) {
            target.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(current).map_err(|e| EngineError::bad_request(R::ENTITY_NAME, "invalidpatch", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortOrder;
    use crate::registry::MemoryRepository;
    use crate::schema::{Bill, Product, Size};
    use serde_json::json;

    fn size_service() -> EntityService<Size> {
        EntityService::new(Arc::new(MemoryRepository::new()))
    }

    fn bad_request_key<T: std::fmt::Debug>(result: EngineResult<T>) -> &'static str {
        match result {
            Err(EngineError::BadRequest { key, .. }) => key,
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[test]
    fn test_create_assigns_id_and_rejects_existing() {
        let svc = size_service();
        let created = svc.create(Size::new("AAAA")).unwrap();
        assert_eq!(created.id, Some(1));
        assert_eq!(bad_request_key(svc.create(Size::new("BBBB").with_id(5))), "idexists");
        assert_eq!(svc.count().unwrap(), 1);
    }

    #[test]
    fn test_update_checks_ids() {
        let svc = size_service();
        svc.create(Size::new("AAAA")).unwrap();

        assert_eq!(bad_request_key(svc.update(1, Size::new("BBBB"))), "idnull");
        assert_eq!(bad_request_key(svc.update(1, Size::new("BBBB").with_id(2))), "idinvalid");
        assert_eq!(bad_request_key(svc.update(9, Size::new("BBBB").with_id(9))), "idnotfound");

        let updated = svc.update(1, Size::new("BBBB").with_id(1)).unwrap();
        assert_eq!(updated.name, "BBBB");
        assert_eq!(svc.get(1).unwrap().name, "BBBB");
    }

    #[test]
    fn test_partial_update_keeps_unset_fields() {
        let svc: EntityService<Product> = EntityService::new(Arc::new(MemoryRepository::new()));
        let mut product = Product::new("Runner", 50.0, "runner.png", 41);
        product.color = Some("red".to_string());
        svc.create(product).unwrap();

        let patched = svc
            .partial_update(1, &json!({ "id": 1, "price": 60.0, "color": null }))
            .unwrap()
            .unwrap();
        assert_eq!(patched.price, 60.0);
        assert_eq!(patched.color.as_deref(), Some("red"));
        assert_eq!(patched.name, "Runner");

        assert_eq!(bad_request_key(svc.partial_update(1, &json!({ "price": 1.0 }))), "idnull");
        assert_eq!(bad_request_key(svc.partial_update(1, &json!({ "id": 1, "price": "cheap" }))), "invalidpatch");
    }

    #[test]
    fn test_validation_failure_is_bad_request() {
        let svc: EntityService<Product> = EntityService::new(Arc::new(MemoryRepository::new()));
        let mut product = Product::new("Runner", 50.0, "runner.png", 41);
        product.quantity = Some(-1);
        assert_eq!(bad_request_key(svc.create(product)), "validation");
    }

    #[test]
    fn test_save_runs_pre_save_hook() {
        let svc: EntityService<Bill> = EntityService::new(Arc::new(MemoryRepository::new()));
        let bill = svc.create(Bill::new(10.0, vec![1])).unwrap();
        assert!(bill.created_date.is_some());
    }

    #[test]
    fn test_find_all_and_delete() {
        let svc = size_service();
        for name in ["40", "38", "39"] {
            svc.create(Size::new(name)).unwrap();
        }
        let page = svc
            .find_all(&PageRequest::new(0, 2).with_sort(SortOrder::asc("name")))
            .unwrap();
        let names: Vec<&str> = page.content.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["38", "39"]);
        assert_eq!(page.total_elements, 3);

        assert!(svc.delete(2).unwrap());
        assert!(!svc.delete(2).unwrap());
        assert!(matches!(svc.get(2), Err(EngineError::NotFound { id: 2, .. })));
    }
}
