//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件
//! The loaded value is passed explicitly into the services, there is no global instance.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::search::mode::{DeploymentFlags, DeploymentTier};

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    pub server: ServerConfig,
    /// Database configuration / 数据库配置
    pub database: DatabaseConfig,
    /// Search configuration / 搜索配置
    #[serde(default)]
    pub search: SearchConfig,
}

/// Server configuration / 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Database configuration / 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Data directory path / 数据目录路径
    pub data_dir: String,
    /// Main database file path (relative to data_dir) / 主数据库文件路径
    pub db_file: String,
}

/// Search configuration / 搜索配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Deployment flags driving backend selection / 部署标记（决定搜索后端）
    #[serde(default)]
    pub deployment: DeploymentFlags,
    /// Managed index connection settings / 托管索引连接配置
    #[serde(default)]
    pub index: ManagedIndexConfig,
}

/// Managed index configuration / 托管索引配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedIndexConfig {
    /// Data API base URL, empty when no managed index is provisioned / 数据API地址
    pub endpoint: String,
    /// API key sent with every request / API密钥
    pub api_key: String,
    /// Cluster (data source) name / 数据源名称
    pub data_source: String,
    /// Database name / 数据库名称
    pub database: String,
    /// Collection holding the figures / 集合名称
    pub collection: String,
    /// Search index name / 搜索索引名称
    pub index_name: String,
    /// Request timeout in seconds / 请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8190,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            db_file: "figbox.db".to_string(),
        }
    }
}

impl Default for ManagedIndexConfig {
    fn default() -> Self {
        Self {
            endpoint: "".to_string(),
            api_key: "".to_string(),
            data_source: "Cluster0".to_string(),
            database: "figbox".to_string(),
            collection: "figures".to_string(),
            index_name: "figures".to_string(),
            timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Get the full database URL / 获取完整的数据库URL
    pub fn get_database_url(&self) -> String {
        let db_path = Path::new(&self.database.data_dir).join(&self.database.db_file);
        format!("sqlite:{}?mode=rwc", db_path.to_string_lossy())
    }

    /// Get the full data directory path / 获取完整的数据目录路径
    pub fn get_data_dir(&self) -> PathBuf {
        PathBuf::from(&self.database.data_dir)
    }

    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Apply environment overrides once at startup / 启动时应用环境变量覆盖
    ///
    /// `FIGBOX_TIER`, `FIGBOX_TEST_MODE`, `FIGBOX_INTEGRATION_TEST`,
    /// `FIGBOX_INDEX_ENDPOINT` and `FIGBOX_INDEX_API_KEY` are read here and
    /// nowhere else.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let deployment = &mut self.search.deployment;
        if let Some(tier) = lookup("FIGBOX_TIER") {
            match tier.parse::<DeploymentTier>() {
                Ok(t) => deployment.tier = t,
                Err(e) => tracing::warn!("Ignoring FIGBOX_TIER: {}", e),
            }
        }
        if let Some(v) = lookup("FIGBOX_TEST_MODE") {
            deployment.test_mode = parse_flag(&v);
        }
        if let Some(v) = lookup("FIGBOX_INTEGRATION_TEST") {
            deployment.integration_test = parse_flag(&v);
        }
        if let Some(endpoint) = lookup("FIGBOX_INDEX_ENDPOINT") {
            self.search.index.endpoint = endpoint;
        }
        if let Some(key) = lookup("FIGBOX_INDEX_API_KEY") {
            self.search.index.api_key = key;
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config() -> Result<AppConfig, String> {
    let config_path = get_config_path();

    if config_path.exists() {
        // Load existing config / 加载现有配置
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        // Create default config / 创建默认配置
        let config = AppConfig::default();
        save_config(&config)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config: &AppConfig) -> Result<(), String> {
    let config_path = get_config_path();

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(&config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}
