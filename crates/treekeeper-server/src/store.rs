use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use tracing::debug;
use treekeeper_core::health::HealthStatus;
use treekeeper_core::maintenance::MaintenanceKind;
use treekeeper_core::tree::{TreeRecord, UpdateTree};
use treekeeper_core::visit::{CreateVisit, TreeVisitRecord, VISIT_DATE_FORMAT};
use treekeeper_service::ServiceError;
use uuid::Uuid;

/// In-memory backing store for the reference server. The real deployment
/// talks to the city inventory API; this exists for local runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    trees: HashMap<String, TreeRecord>,
    // Per tree, newest visit first. Display order is whatever we return.
    history: HashMap<String, Vec<TreeVisitRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_tree(&self, tree: TreeRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.trees.insert(tree.id_tree.clone(), tree);
    }

    pub fn get_tree(&self, id: &str) -> Result<TreeRecord, ServiceError> {
        let inner = self.inner.lock().unwrap();
        inner
            .trees
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("tree {id}")))
    }

    /// Apply a partial update. A submitted health label also refreshes the
    /// stored numeric scale so the pair never diverges.
    pub fn update_tree(&self, update: &UpdateTree) -> Result<TreeRecord, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        let tree = inner
            .trees
            .get_mut(&update.id_tree)
            .ok_or_else(|| ServiceError::NotFound(format!("tree {}", update.id_tree)))?;

        if let Some(health) = update.health {
            tree.health = Some(health);
            tree.health_num = Some(i64::from(health.scale()));
        }
        if let Some(ref notes) = update.notes {
            tree.notes = Some(notes.clone());
        }
        debug!("updated tree {}", update.id_tree);
        Ok(tree.clone())
    }

    pub fn visit_history(&self, tree_id: &str) -> Result<Vec<TreeVisitRecord>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        if !inner.trees.contains_key(tree_id) {
            return Err(ServiceError::NotFound(format!("tree {tree_id}")));
        }
        Ok(inner.history.get(tree_id).cloned().unwrap_or_default())
    }

    /// Append a visit. Payloads without any maintenance field are rejected;
    /// the client predicate should have skipped them already.
    pub fn append_visit(&self, visit: &CreateVisit) -> Result<TreeVisitRecord, ServiceError> {
        if !visit.has_maintenance_fields() {
            return Err(ServiceError::InvalidInput(
                "visit has no maintenance fields or comment".into(),
            ));
        }

        let date_visit = NaiveDateTime::parse_from_str(&visit.date_visit, VISIT_DATE_FORMAT)
            .map_err(|e| ServiceError::InvalidInput(format!("bad date_visit: {e}")))?
            .and_utc();

        let mut inner = self.inner.lock().unwrap();
        if !inner.trees.contains_key(&visit.id_tree) {
            return Err(ServiceError::NotFound(format!("tree {}", visit.id_tree)));
        }

        let mut record = TreeVisitRecord {
            id_treehistory: Uuid::new_v4().to_string(),
            id_tree: visit.id_tree.clone(),
            date_visit,
            volunteer: visit.volunteer.clone(),
            comment: visit.comment.clone(),
            watered: None,
            mulched: None,
            weeded: None,
            staked: None,
            braced: None,
            pruned: None,
        };
        for &kind in MaintenanceKind::ALL {
            if let Some(value) = visit.flag(kind) {
                match kind {
                    MaintenanceKind::Watered => record.watered = Some(value),
                    MaintenanceKind::Mulched => record.mulched = Some(value),
                    MaintenanceKind::Weeded => record.weeded = Some(value),
                    MaintenanceKind::Staked => record.staked = Some(value),
                    MaintenanceKind::Braced => record.braced = Some(value),
                    MaintenanceKind::Pruned => record.pruned = Some(value),
                }
            }
        }

        debug!("appended visit for tree {}", visit.id_tree);
        inner
            .history
            .entry(visit.id_tree.clone())
            .or_default()
            .insert(0, record.clone());
        Ok(record)
    }

    /// Insert a demo record and return it. Used by `--seed` and by tests.
    pub fn seed_demo(&self) -> TreeRecord {
        let tree = TreeRecord {
            id_tree: "1".into(),
            common: Some("Red Maple".into()),
            scientific: Some("Acer rubrum".into()),
            date_planted: Some("2018-04-22".into()),
            health: Some(HealthStatus::Stump),
            health_num: Some(3),
            address: Some("512 Dolores St".into()),
            city: Some("San Francisco".into()),
            neighborhood: Some("Mission".into()),
            lat: Some(37.7585),
            lng: Some(-122.4233),
            owner: Some("Public".into()),
            id_reference: Some("SF-00512".into()),
            who: Some("Friends of the Urban Forest".into()),
            country: Some("USA".into()),
            zip: Some("94110".into()),
            notes: Some("young street tree, check stakes".into()),
        };
        self.insert_tree(tree.clone());
        tree
    }
}
