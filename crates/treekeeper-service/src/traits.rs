use async_trait::async_trait;
use thiserror::Error;
use treekeeper_core::tree::{TreeRecord, UpdateTree};
use treekeeper_core::visit::{CreateVisit, TreeVisitRecord};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Abstraction over the tree record store.
///
/// The TUI programs against this trait; `HttpService` wraps the remote API.
/// The visit history is append-only and must come back in a stable,
/// meaningful order (newest first) — callers render it as returned.
#[async_trait]
pub trait TreeService: Send + Sync {
    async fn fetch_tree(&self, id: &str) -> Result<TreeRecord, ServiceError>;

    async fn fetch_visit_history(
        &self,
        tree_id: &str,
    ) -> Result<Vec<TreeVisitRecord>, ServiceError>;

    async fn update_tree(&self, update: &UpdateTree) -> Result<TreeRecord, ServiceError>;

    async fn append_visit(&self, visit: &CreateVisit) -> Result<TreeVisitRecord, ServiceError>;
}
