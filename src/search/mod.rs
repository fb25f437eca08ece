//! Figure search / 手办搜索
//!
//! Two interchangeable backends behind one service:
//! - Local: case-insensitive matching over the user's records
//! - Managed: external full-text index, used only in production
//!
//! The backend is chosen once from the deployment flags. Every result is
//! scoped to the calling user.

pub mod backend;
pub mod error;
pub mod local;
pub mod managed;
pub mod mode;
pub mod projector;
pub mod query;
pub mod service;

#[cfg(test)]
mod testing;

pub use backend::SearchBackend;
pub use error::{Result, SearchError};
pub use local::{FigureFilter, LocalMatcher};
pub use managed::{HttpIndexClient, IndexClient, ManagedIndex};
pub use mode::{select_mode, DeploymentFlags, DeploymentTier, SearchMode};
pub use projector::FigureSummary;
pub use query::{escape_pattern, NormalizedQuery, UserId, Window};
pub use service::SearchService;
