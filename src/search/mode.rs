//! Backend mode selection / 搜索后端模式选择
//!
//! A pure function of explicit deployment flags. The search service resolves
//! it once at construction and every operation runs on the resulting backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deployment tier / 部署层级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentTier {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for DeploymentTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown deployment tier: {}", other)),
        }
    }
}

/// Flags that decide which backend serves searches / 决定搜索后端的部署标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeploymentFlags {
    #[serde(default)]
    pub tier: DeploymentTier,
    /// Unit test run / 单元测试模式
    #[serde(default)]
    pub test_mode: bool,
    /// Integration test run / 集成测试模式
    #[serde(default)]
    pub integration_test: bool,
}

/// Search execution mode / 搜索执行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Externally hosted full-text index / 托管全文索引
    Managed,
    /// In-process approximation / 本地近似匹配
    Local,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Managed => write!(f, "managed"),
            SearchMode::Local => write!(f, "local"),
        }
    }
}

/// Managed only in production with both test markers off / 仅生产环境且非测试时使用托管索引
pub fn select_mode(flags: &DeploymentFlags) -> SearchMode {
    let production = flags.tier == DeploymentTier::Production;
    if production && !flags.test_mode && !flags.integration_test {
        SearchMode::Managed
    } else {
        SearchMode::Local
    }
}
