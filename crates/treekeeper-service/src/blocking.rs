use tokio::runtime::Runtime;
use treekeeper_core::tree::{TreeRecord, UpdateTree};
use treekeeper_core::visit::{CreateVisit, TreeVisitRecord};

use crate::traits::TreeService;
use crate::{HttpService, ServiceError};

/// Blocking wrapper around the async `HttpService`.
///
/// Creates an internal tokio runtime and uses `block_on()` for each call.
/// Designed for sync callers like the TUI.
pub struct BlockingHttpService {
    inner: HttpService,
    rt: Runtime,
}

impl BlockingHttpService {
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: HttpService::new(base_url),
            rt: Runtime::new().expect("failed to create tokio runtime"),
        }
    }

    pub fn with_api_key(base_url: &str, key: String) -> Self {
        Self {
            inner: HttpService::with_api_key(base_url, key),
            rt: Runtime::new().expect("failed to create tokio runtime"),
        }
    }

    pub fn health_check(&self) -> Result<(), ServiceError> {
        self.rt.block_on(self.inner.health_check())
    }

    pub fn fetch_tree(&self, id: &str) -> Result<TreeRecord, ServiceError> {
        self.rt.block_on(self.inner.fetch_tree(id))
    }

    pub fn fetch_visit_history(&self, tree_id: &str) -> Result<Vec<TreeVisitRecord>, ServiceError> {
        self.rt.block_on(self.inner.fetch_visit_history(tree_id))
    }

    pub fn update_tree(&self, update: &UpdateTree) -> Result<TreeRecord, ServiceError> {
        self.rt.block_on(self.inner.update_tree(update))
    }

    pub fn append_visit(&self, visit: &CreateVisit) -> Result<TreeVisitRecord, ServiceError> {
        self.rt.block_on(self.inner.append_visit(visit))
    }
}
