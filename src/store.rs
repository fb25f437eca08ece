//! Figure record store (read side) / 手办记录存储（只读）
//!
//! The search subsystem only ever reads records, and only through
//! `FigureStore::find`.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::models::Figure;
use crate::search::error::{Result, SearchError};
use crate::search::query::UserId;

/// Record predicate / 记录查询条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FigurePredicate {
    pub owner: UserId,
}

impl FigurePredicate {
    pub fn owned_by(owner: UserId) -> Self {
        Self { owner }
    }

    pub fn matches(&self, figure: &Figure) -> bool {
        self.owner.owns(&figure.user_id)
    }
}

/// Read capability over figure records / 记录读取能力
#[async_trait]
pub trait FigureStore: Send + Sync {
    async fn find(&self, predicate: &FigurePredicate) -> Result<Vec<Figure>>;
}

/// SQLite-backed store / SQLite 存储
pub struct SqliteFigureStore {
    db: SqlitePool,
}

impl SqliteFigureStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FigureStore for SqliteFigureStore {
    async fn find(&self, predicate: &FigurePredicate) -> Result<Vec<Figure>> {
        let figures = sqlx::query_as::<_, Figure>(
            "SELECT id, user_id, manufacturer, name, scale, link, location, box_number, image, created_at, updated_at
             FROM figures WHERE user_id = ? ORDER BY created_at, id"
        )
        .bind(predicate.owner.to_string())
        .fetch_all(&self.db)
        .await?;

        Ok(figures)
    }
}

/// In-memory store for local development and tests / 内存存储（开发与测试用）
pub struct MemoryFigureStore {
    figures: Vec<Figure>,
    fail: bool,
    calls: AtomicUsize,
}

impl MemoryFigureStore {
    pub fn new(figures: Vec<Figure>) -> Self {
        Self {
            figures,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// A store whose every read fails / 每次读取都失败的存储
    pub fn unreachable() -> Self {
        Self {
            figures: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `find` calls served so far / 已执行的查询次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FigureStore for MemoryFigureStore {
    async fn find(&self, predicate: &FigurePredicate) -> Result<Vec<Figure>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SearchError::Store("store unreachable".to_string()));
        }
        Ok(self.figures.iter().filter(|f| predicate.matches(f)).cloned().collect())
    }
}
