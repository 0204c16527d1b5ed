use treekeeper_core::tree::TreeRecord;
use treekeeper_core::visit::TreeVisitRecord;
use treekeeper_service::{BlockingHttpService, ServiceError};

/// Read-side cache for one tree id, shared by every edit session in the app.
///
/// Writes never patch the cached value directly: a successful write
/// invalidates the touched entry and the next read refetches, so sibling
/// sessions always observe what the server actually stored.
pub struct TreeCache {
    tree_id: String,
    tree: Option<TreeRecord>,
    history: Option<Vec<TreeVisitRecord>>,
}

impl TreeCache {
    pub fn new(tree_id: &str) -> Self {
        Self {
            tree_id: tree_id.to_string(),
            tree: None,
            history: None,
        }
    }

    pub fn tree_id(&self) -> &str {
        &self.tree_id
    }

    /// Cached record, fetching on a miss.
    pub fn tree(&mut self, service: &BlockingHttpService) -> Result<&TreeRecord, ServiceError> {
        match self.tree {
            Some(ref tree) => Ok(tree),
            None => {
                let fetched = service.fetch_tree(&self.tree_id)?;
                Ok(self.tree.insert(fetched))
            }
        }
    }

    /// Cached visit history, fetching on a miss. Kept in the order the
    /// gateway returned it.
    pub fn history(
        &mut self,
        service: &BlockingHttpService,
    ) -> Result<&[TreeVisitRecord], ServiceError> {
        match self.history {
            Some(ref history) => Ok(history),
            None => {
                let fetched = service.fetch_visit_history(&self.tree_id)?;
                Ok(self.history.insert(fetched))
            }
        }
    }

    pub fn cached_tree(&self) -> Option<&TreeRecord> {
        self.tree.as_ref()
    }

    pub fn cached_history(&self) -> Option<&[TreeVisitRecord]> {
        self.history.as_deref()
    }

    pub fn invalidate_tree(&mut self) {
        self.tree = None;
    }

    pub fn invalidate_history(&mut self) {
        self.history = None;
    }
}
