// registry.rs - 记录仓库
// 所有实体共用一套泛型仓库接口，替代逐实体生成的 Repository

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::schema::Record;

/// 存储错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Lock poisoned: {0}")]
    Poisoned(String),

    #[error("No id left to allocate for {0}")]
    IdExhausted(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// 可查询的记录集合
pub trait Repository<R: Record>: Send + Sync {
    /// 保存记录：没有 id 时分配新 id，否则覆盖同 id 记录
    fn save(&self, record: R) -> StoreResult<R>;

    fn find_by_id(&self, id: i64) -> StoreResult<Option<R>>;

    fn exists_by_id(&self, id: i64) -> StoreResult<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }

    /// 全部记录（按 id 升序）
    fn find_all(&self) -> StoreResult<Vec<R>>;

    /// 删除记录，返回是否存在
    fn delete_by_id(&self, id: i64) -> StoreResult<bool>;

    fn count(&self) -> StoreResult<usize>;
}

/// 内存仓库 - 线程安全，可克隆共享
#[derive(Clone)]
pub struct MemoryRepository<R: Record> {
    inner: Arc<RwLock<RepositoryInner<R>>>,
}

struct RepositoryInner<R> {
    /// id -> 记录
    records: BTreeMap<i64, R>,
    /// 下一个可分配的 id
    next_id: i64,
}

impl<R: Record> MemoryRepository<R> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RepositoryInner {
                records: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }

    /// 用一组记录初始化
    pub fn with_records(records: impl IntoIterator<Item = R>) -> StoreResult<Self> {
        let repo = Self::new();
        for record in records {
            repo.save(record)?;
        }
        Ok(repo)
    }
}

impl<R: Record> Default for MemoryRepository<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E>(_: E) -> StoreError {
    StoreError::Poisoned("memory repository".to_string())
}

impl<R: Record> Repository<R> for MemoryRepository<R> {
    fn save(&self, mut record: R) -> StoreResult<R> {
        let mut inner = self.inner.write().map_err(poisoned)?;

        let id = match record.id() {
            Some(id) => id,
            None => {
                let id = inner.next_id;
                record.set_id(id);
                id
            }
        };
        // 手动指定的 id 也要推进计数器，避免之后冲突
        let after = id.checked_add(1).ok_or(StoreError::IdExhausted(R::ENTITY_NAME))?;
        inner.next_id = inner.next_id.max(after);
        inner.records.insert(id, record.clone());
        Ok(record)
    }

    fn find_by_id(&self, id: i64) -> StoreResult<Option<R>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.records.get(&id).cloned())
    }

    fn exists_by_id(&self, id: i64) -> StoreResult<bool> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.records.contains_key(&id))
    }

    fn find_all(&self) -> StoreResult<Vec<R>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.records.values().cloned().collect())
    }

    fn delete_by_id(&self, id: i64) -> StoreResult<bool> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        Ok(inner.records.remove(&id).is_some())
    }

    fn count(&self) -> StoreResult<usize> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Size;
    use std::thread;

    #[test]
    fn test_save_assigns_ids() {
        let repo = MemoryRepository::<Size>::new();
        let a = repo.save(Size::new("38")).unwrap();
        let b = repo.save(Size::new("39")).unwrap();
        assert_eq!(a.id, Some(1));
        assert_eq!(b.id, Some(2));
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_explicit_id_advances_counter() {
        let repo = MemoryRepository::<Size>::new();
        repo.save(Size::new("40").with_id(10)).unwrap();
        let next = repo.save(Size::new("41")).unwrap();
        assert_eq!(next.id, Some(11));
    }

    #[test]
    fn test_deleted_ids_are_not_reused() {
        let repo = MemoryRepository::with_records(vec![Size::new("38"), Size::new("39")]).unwrap();
        assert!(repo.delete_by_id(2).unwrap());
        assert_eq!(repo.save(Size::new("40")).unwrap().id, Some(3));
    }

    #[test]
    fn test_max_id_is_rejected() {
        let repo = MemoryRepository::<Size>::new();
        assert!(matches!(
            repo.save(Size::new("38").with_id(i64::MAX)),
            Err(StoreError::IdExhausted("size"))
        ));
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_upsert_find_delete() {
        let repo = MemoryRepository::with_records(vec![Size::new("38")]).unwrap();
        repo.save(Size::new("38.5").with_id(1)).unwrap();
        assert_eq!(repo.find_by_id(1).unwrap().unwrap().name, "38.5");
        assert!(repo.exists_by_id(1).unwrap());

        assert!(repo.delete_by_id(1).unwrap());
        assert!(!repo.delete_by_id(1).unwrap());
        assert!(repo.find_by_id(1).unwrap().is_none());
    }

    #[test]
    fn test_concurrent_saves() {
        let repo = MemoryRepository::<Size>::new();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let repo = repo.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        repo.save(Size::new(format!("{}-{}", t, i))).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(repo.count().unwrap(), 100);
        let ids: Vec<i64> = repo.find_all().unwrap().iter().filter_map(|s| s.id).collect();
        assert_eq!(ids, (1..=100).collect::<Vec<_>>());
    }
}
