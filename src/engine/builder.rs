// engine/builder.rs - 商店引擎构建器
//! 使用 Builder 模式构建 ShopEngine

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use sled::Db;

use crate::api::RequestOptions;
use crate::config::{AppConfig, StorageBackend, CONFIG};
use crate::query::FilterOptions;
use crate::registry::{MemoryRepository, Repository};
use crate::schema::{Bill, Category, Favorite, Product, Record, Size};
use crate::store::{open_db, SledRepository};

use super::core::{EngineResult, QueryService, ShopEngine};
use super::resource::Resource;
use super::service::EntityService;

/// 种子数据文件内容
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub sizes: Vec<Size>,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub bills: Vec<Bill>,
    pub favorites: Vec<Favorite>,
}

impl SeedData {
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// 商店引擎构建器
#[derive(Default)]
pub struct ShopEngineBuilder {
    config: Option<Arc<AppConfig>>,
    backend: Option<StorageBackend>,
    storage_path: Option<PathBuf>,
    seed_file: Option<PathBuf>,
    seed: Option<SeedData>,
    skip_seed: bool,
}

impl ShopEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置配置（默认使用全局配置）
    pub fn with_config(mut self, config: Arc<AppConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// 设置存储后端
    pub fn with_backend(mut self, backend: StorageBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// 设置 sled 存储路径
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// 从 JSON 文件导入种子数据
    pub fn with_seed_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_file = Some(path.into());
        self
    }

    /// 直接提供种子数据
    pub fn with_seed(mut self, seed: SeedData) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 不导入任何种子数据
    pub fn without_seed(mut self) -> Self {
        self.skip_seed = true;
        self
    }

    /// 构建引擎
    pub fn build(self) -> EngineResult<ShopEngine> {
        let config = self.config.unwrap_or_else(|| Arc::new(CONFIG.clone()));
        let backend = self.backend.unwrap_or(config.storage.backend);

        let db = match backend {
            StorageBackend::Memory => None,
            StorageBackend::Sled => {
                let storage_path = self
                    .storage_path
                    .unwrap_or_else(|| PathBuf::from(&config.storage.data_path));
                std::fs::create_dir_all(&storage_path)?;
                Some(open_db(&storage_path)?)
            }
        };

        let engine = ShopEngine {
            sizes: build_resource(db.as_ref(), &config)?,
            categories: build_resource(db.as_ref(), &config)?,
            products: build_resource(db.as_ref(), &config)?,
            bills: build_resource(db.as_ref(), &config)?,
            favorites: build_resource(db.as_ref(), &config)?,
            config: config.clone(),
        };
        tracing::info!("shop engine ready ({:?} backend)", backend);

        if self.skip_seed {
            return Ok(engine);
        }
        let seed = match (self.seed, self.seed_file) {
            (Some(seed), _) => Some(seed),
            (None, Some(path)) => Some(SeedData::load(&path)?),
            (None, None) => match config.storage.seed_file.as_deref().map(Path::new) {
                Some(path) if path.exists() => Some(SeedData::load(path)?),
                Some(path) => {
                    tracing::warn!("seed file {:?} not found, starting empty", path);
                    None
                }
                None => None,
            },
        };
        if let Some(seed) = seed {
            import_seed(&engine, seed)?;
        }
        Ok(engine)
    }
}

fn build_resource<R: Record>(db: Option<&Db>, config: &AppConfig) -> EngineResult<Resource<R>> {
    let repository: Arc<dyn Repository<R>> = match db {
        Some(db) => Arc::new(SledRepository::<R>::open(db)?),
        None => Arc::new(MemoryRepository::<R>::new()),
    };
    let max_page_size = config.pagination.max_page_size;
    let filter_options = FilterOptions {
        case_insensitive_like: config.query.case_insensitive_like,
    };

    Ok(Resource::new(
        EntityService::new(repository.clone()).with_max_page_size(max_page_size),
        QueryService::new(repository)
            .with_filter_options(filter_options)
            .with_max_page_size(max_page_size),
        RequestOptions::from_config(&config.pagination, &config.query.ignored_params),
    ))
}

fn import_seed(engine: &ShopEngine, seed: SeedData) -> EngineResult<()> {
    seed_resource(&engine.sizes, seed.sizes)?;
    seed_resource(&engine.categories, seed.categories)?;
    seed_resource(&engine.products, seed.products)?;
    seed_resource(&engine.bills, seed.bills)?;
    seed_resource(&engine.favorites, seed.favorites)?;
    Ok(())
}

/// 只向空仓库导入，已有数据（如 sled 重启）时跳过
fn seed_resource<R: Record>(resource: &Resource<R>, records: Vec<R>) -> EngineResult<()> {
    let service = resource.service();
    if records.is_empty() || service.count()? > 0 {
        return Ok(());
    }
    let total = records.len();
    for record in records {
        service.save(record)?;
    }
    tracing::info!("seeded {} {} records", total, R::ENTITY_NAME);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ResourceProvider;
    use tempfile::tempdir;

    fn memory_config() -> Arc<AppConfig> {
        Arc::new(AppConfig::default())
    }

    #[test]
    fn test_builder() {
        let engine = ShopEngineBuilder::new()
            .with_config(memory_config())
            .without_seed()
            .build()
            .unwrap();
        assert_eq!(engine.stats().unwrap().sizes, 0);
    }

    #[test]
    fn test_bundled_seed_file() {
        let engine = ShopEngineBuilder::new()
            .with_config(memory_config())
            .with_seed_file(concat!(env!("CARGO_MANIFEST_DIR"), "/seed.json"))
            .build()
            .unwrap();

        let stats = engine.stats().unwrap();
        assert_eq!(stats.sizes, 5);
        assert_eq!(stats.products, 2);
        assert_eq!(engine.sizes().count("name.in=38,39").unwrap(), 2);

        let sizes: &Resource<Size> = engine.resource();
        assert_eq!(sizes.get(3).unwrap().name, "40");
    }

    #[test]
    fn test_sled_backend_persists_and_skips_reseed() {
        let dir = tempdir().unwrap();
        let seed = || SeedData {
            sizes: vec![Size::new("38"), Size::new("39")],
            ..SeedData::default()
        };

        {
            let engine = ShopEngineBuilder::new()
                .with_config(memory_config())
                .with_backend(StorageBackend::Sled)
                .with_storage_path(dir.path())
                .with_seed(seed())
                .build()
                .unwrap();
            engine.sizes().create(Size::new("40")).unwrap();
        }

        let engine = ShopEngineBuilder::new()
            .with_config(memory_config())
            .with_backend(StorageBackend::Sled)
            .with_storage_path(dir.path())
            .with_seed(seed())
            .build()
            .unwrap();
        assert_eq!(engine.stats().unwrap().sizes, 3);
    }

    #[test]
    fn test_missing_seed_file_is_error() {
        let result = ShopEngineBuilder::new()
            .with_config(memory_config())
            .with_seed_file("/nonexistent/seed.json")
            .build();
        assert!(result.is_err());
    }
}
