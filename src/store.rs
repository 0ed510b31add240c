// store.rs - 持久化仓库
// 使用 sled 存储记录，每种实体一棵树，值用 bincode 编码

use sled::{Db, Tree};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Mutex;

use crate::registry::{Repository, StoreError, StoreResult};
use crate::schema::Record;

/// 打开（或创建）存储数据库
pub fn open_db(path: &Path) -> StoreResult<Db> {
    let db = sled::open(path)?;
    tracing::info!("sled storage opened at {:?}", path);
    Ok(db)
}

/// sled 仓库
pub struct SledRepository<R: Record> {
    tree: Tree,
    /// 各实体的 id 序列（实体名 -> 下一个 id），只增不减
    sequences: Tree,
    /// 串行化 id 分配和写入
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> SledRepository<R> {
    /// 打开实体对应的树（树名即实体名）
    pub fn open(db: &Db) -> StoreResult<Self> {
        let tree = db.open_tree(R::ENTITY_NAME)?;
        let sequences = db.open_tree(SEQUENCE_TREE)?;
        Ok(Self {
            tree,
            sequences,
            write_lock: Mutex::new(()),
            _record: PhantomData,
        })
    }

    /// id 编码为大端字节，保证树内按 id 升序
    fn key(id: i64) -> [u8; 8] {
        (id as u64 ^ (1 << 63)).to_be_bytes()
    }

    fn decode_key(bytes: &[u8]) -> Option<i64> {
        let raw: [u8; 8] = bytes.try_into().ok()?;
        Some((u64::from_be_bytes(raw) ^ (1 << 63)) as i64)
    }

    /// 下一个可分配的 id：取序列值和现有最大 id + 1 中较大者，删除过的 id 不会再分配
    fn next_id(&self) -> StoreResult<i64> {
        let stored = match self.sequences.get(R::ENTITY_NAME)? {
            Some(raw) => Self::decode_key(&raw).unwrap_or(1),
            None => 1,
        };
        let after_last = match self.tree.last()? {
            Some((key, _)) => match Self::decode_key(&key) {
                Some(id) => next_after::<R>(id)?,
                None => 1,
            },
            None => 1,
        };
        Ok(stored.max(after_last).max(1))
    }

    /// 把序列推进到 id 之后
    fn advance_sequence(&self, id: i64) -> StoreResult<()> {
        let next = next_after::<R>(id)?.max(self.next_id()?);
        self.sequences.insert(R::ENTITY_NAME, Self::key(next).to_vec())?;
        Ok(())
    }
}

/// 序列树名
const SEQUENCE_TREE: &str = "__sequences";

fn next_after<R: Record>(id: i64) -> StoreResult<i64> {
    id.checked_add(1).ok_or(StoreError::IdExhausted(R::ENTITY_NAME))
}

impl<R: Record> Repository<R> for SledRepository<R> {
    fn save(&self, mut record: R) -> StoreResult<R> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Poisoned(format!("{} store", R::ENTITY_NAME)))?;

        let id = match record.id() {
            Some(id) => id,
            None => {
                let id = self.next_id()?;
                record.set_id(id);
                id
            }
        };

        let data = bincode::serialize(&record)?;
        self.advance_sequence(id)?;
        self.tree.insert(Self::key(id), data)?;
        self.tree.flush()?;
        self.sequences.flush()?;
        Ok(record)
    }

    fn find_by_id(&self, id: i64) -> StoreResult<Option<R>> {
        match self.tree.get(Self::key(id))? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    fn exists_by_id(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tree.contains_key(Self::key(id))?)
    }

    fn find_all(&self) -> StoreResult<Vec<R>> {
        self.tree
            .iter()
            .map(|entry| -> StoreResult<R> {
                let (_, data) = entry?;
                Ok(bincode::deserialize(&data)?)
            })
            .collect()
    }

    fn delete_by_id(&self, id: i64) -> StoreResult<bool> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Poisoned(format!("{} store", R::ENTITY_NAME)))?;
        let removed = self.tree.remove(Self::key(id))?.is_some();
        self.tree.flush()?;
        Ok(removed)
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.tree.len())
    }
}
