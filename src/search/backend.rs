//! Search backend trait / 搜索后端抽象
//!
//! - `LocalMatcher`: in-process matching over the record store
//! - `ManagedIndex`: external full-text index, falls back to `LocalMatcher`
//!
//! Backends receive already-normalized queries and parsed user ids, and
//! return raw records. Projection happens in the service.

use async_trait::async_trait;

use super::error::Result;
use super::mode::SearchMode;
use super::query::{NormalizedQuery, UserId, Window};
use crate::models::Figure;

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Word-wheel search on `name`/`manufacturer` / 联想搜索
    async fn autocomplete(&self, query: &NormalizedQuery, user: &UserId, window: Window) -> Result<Vec<Figure>>;

    /// Substring search on `name`/`manufacturer` with offset / 子串搜索
    async fn partial(&self, query: &NormalizedQuery, user: &UserId, window: Window) -> Result<Vec<Figure>>;

    /// Multi-field search, every term must hit some field / 多字段搜索
    async fn search(&self, query: &NormalizedQuery, user: &UserId) -> Result<Vec<Figure>>;

    fn mode(&self) -> SearchMode;
}
