use sqlx::SqlitePool;
use std::sync::Arc;

use crate::search::SearchService;

/// Shared application state / 应用共享状态
pub struct AppState {
    pub db: SqlitePool,
    pub search: Arc<SearchService>,
}

impl AppState {
    pub fn new(db: SqlitePool, search: SearchService) -> Self {
        Self {
            db,
            search: Arc::new(search),
        }
    }
}
