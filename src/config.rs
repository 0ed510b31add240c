// 配置模块 - 支持外部配置文件
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// 配置文件路径
pub const CONFIG_FILE: &str = "./config.toml";

/// 配置加载错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

// ============== 配置结构体 ==============

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub pagination: PaginationConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

/// 存储后端
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sled,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// sled 数据目录
    pub data_path: String,
    /// 启动时导入的 JSON 种子数据（可选）
    #[serde(default)]
    pub seed_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PaginationConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct QueryConfig {
    /// contains / doesNotContain 是否忽略大小写
    pub case_insensitive_like: bool,
    /// 列表请求中直接忽略的参数
    pub ignored_params: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// RUST_LOG 未设置时使用的过滤规则
    pub filter: String,
}

// ============== 默认配置 ==============

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                data_path: "./storage".to_string(),
                seed_file: None,
            },
            pagination: PaginationConfig {
                default_page_size: 20,
                max_page_size: 2000,
            },
            query: QueryConfig {
                case_insensitive_like: false,
                ignored_params: vec!["cacheBuster".to_string(), "eagerload".to_string()],
            },
            logging: LoggingConfig {
                filter: "info".to_string(),
            },
        }
    }
}

// ============== 配置加载 ==============

impl AppConfig {
    /// 从配置文件加载，失败则使用默认配置
    pub fn load() -> Self {
        Self::load_from_file(CONFIG_FILE).unwrap_or_else(|e| {
            tracing::warn!("cannot load config file '{}': {}, using defaults", CONFIG_FILE, e);
            Self::default()
        })
    }

    /// 从指定文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// 生成默认配置文件
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
        let default_content = include_str!("../config.toml");
        fs::write(path, default_content)?;
        Ok(())
    }
}

// ============== 全局配置实例 ==============

/// 全局配置实例 (懒加载)
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::load);

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_bundled_config_parses() {
        let config = AppConfig::from_toml(include_str!("../config.toml")).unwrap();
        assert_eq!(config.pagination.default_page_size, 20);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.query.ignored_params.contains(&"cacheBuster".to_string()));
    }

    #[test]
    fn test_generate_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        AppConfig::generate_default_config(&path).unwrap();
        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.pagination.max_page_size, 2000);
    }

    #[test]
    fn test_sled_backend() {
        let config = AppConfig::from_toml(
            r#"
            [storage]
            backend = "sled"
            data_path = "/tmp/shoes"
            seed_file = "seed.json"

            [pagination]
            default_page_size = 10
            max_page_size = 100

            [query]
            case_insensitive_like = true
            ignored_params = []

            [logging]
            filter = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Sled);
        assert_eq!(config.storage.seed_file.as_deref(), Some("seed.json"));
        assert!(config.query.case_insensitive_like);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(matches!(
            AppConfig::load_from_file("/nonexistent/config.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
