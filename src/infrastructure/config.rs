//! 配置基础设施
//!
//! 配置从 TOML 文件加载，找不到文件时使用默认值。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 指定配置文件路径的环境变量
pub const CONFIG_ENV: &str = "ESTOQUE_CONFIG";

/// 系统配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 存储配置
    pub storage: StorageConfig,
    /// 库存配置
    pub inventory: InventoryConfig,
    /// HTTP 服务配置
    pub http: HttpConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    File,
    Memory,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// 数据目录
    pub data_dir: PathBuf,
    /// 产品快照的键
    pub products_key: String,
}

/// 产品编码生成策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeStrategy {
    /// `P` + 当前列表长度 + 1，删除后可能重复
    #[default]
    ListLength,
    /// 持久化的递增序号，不会重复
    Monotonic,
}

/// 库存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// 每页条数
    pub page_size: usize,
    pub code_strategy: CodeStrategy,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_address: String,
    pub port: u16,
    /// 请求超时时间（秒）
    pub timeout_seconds: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: PathBuf::from("./data"),
            products_key: "ia_sistem_produtos".to_string(),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            code_strategy: CodeStrategy::ListLength,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3001,
            timeout_seconds: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// 从配置文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::FileRead(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::FileWrite(e.to_string()))?;
        }

        fs::write(path.as_ref(), content).map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let key = self.storage.products_key.as_str();
        if key.is_empty() || key.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "无效的产品快照键: {:?}",
                key
            )));
        }

        if self.inventory.page_size == 0 {
            return Err(ConfigError::Validation("每页条数必须大于0".to_string()));
        }

        if self.http.port == 0 {
            return Err(ConfigError::Validation("HTTP端口必须大于0".to_string()));
        }
        if self.http.bind_address.is_empty() {
            return Err(ConfigError::Validation("绑定地址不能为空".to_string()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "无效的日志级别: {}，有效值: {:?}",
                self.logging.level, valid_levels
            )));
        }

        Ok(())
    }

    /// HTTP 监听地址，形如 `127.0.0.1:3001`
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.http.bind_address, self.http.port)
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("文件读取错误: {0}")]
    FileRead(String),
    #[error("文件写入错误: {0}")]
    FileWrite(String),
    #[error("配置解析错误: {0}")]
    Parse(String),
    #[error("配置序列化错误: {0}")]
    Serialize(String),
    #[error("配置验证错误: {0}")]
    Validation(String),
}

/// 配置文件的查找顺序：环境变量、`config.toml`、`./config/config.toml`
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.trim().is_empty() {
            paths.push(PathBuf::from(path));
        }
    }
    paths.push(PathBuf::from("config.toml"));
    paths.push(PathBuf::from("./config/config.toml"));
    paths
}

/// 从文件或默认值加载并验证配置
///
/// 返回配置以及实际使用的文件路径（使用默认值时为 `None`）。
pub fn load_config() -> Result<(Config, Option<PathBuf>), ConfigError> {
    for path in candidate_paths() {
        if path.exists() {
            let config = Config::load_from_file(&path)?;
            config.validate()?;
            return Ok((config, Some(path)));
        }
    }

    let config = Config::default();
    config.validate()?;
    Ok((config, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.products_key, "ia_sistem_produtos");
        assert_eq!(config.inventory.page_size, 10);
        assert_eq!(config.inventory.code_strategy, CodeStrategy::ListLength);
        assert_eq!(config.listen_address(), "127.0.0.1:3001");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.inventory.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.products_key = "a/b".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [inventory]
            code_strategy = "monotonic"

            [storage]
            backend = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.inventory.code_strategy, CodeStrategy::Monotonic);
        assert_eq!(config.inventory.page_size, 10);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.http.port, 3001);
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("conf/test_config.toml");

        let mut config = Config::default();
        config.http.port = 9090;
        config.save_to_file(&config_path).unwrap();

        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.http.port, 9090);
        assert_eq!(loaded.storage.data_dir, config.storage.data_dir);
    }
}
