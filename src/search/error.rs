use thiserror::Error;

/// Search subsystem errors / 搜索子系统错误
#[derive(Debug, Error)]
pub enum SearchError {
    /// Caller identity could not be parsed, no backend was touched / 用户标识无效
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Record store unreachable or query failed / 数据存储访问失败
    #[error("store error: {0}")]
    Store(String),

    /// Managed index request failed / 托管索引请求失败
    #[error("index error: {0}")]
    Index(String),

    /// Managed index returned a document we cannot map / 索引文档无法映射
    #[error("projection error: {0}")]
    Projection(String),
}

impl From<sqlx::Error> for SearchError {
    fn from(e: sqlx::Error) -> Self {
        SearchError::Store(e.to_string())
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        SearchError::Index(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
