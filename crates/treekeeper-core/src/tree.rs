use serde::{Deserialize, Serialize};

use crate::health::HealthStatus;

/// A single tree inventory record as served by the remote API.
///
/// Field names are the wire contract (`idTree`, `healthNum`, ...) and are
/// produced by the `camelCase` rename; do not rename fields casually.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeRecord {
    pub id_tree: String,
    #[serde(default)]
    pub common: Option<String>,
    #[serde(default)]
    pub scientific: Option<String>,
    #[serde(default)]
    pub date_planted: Option<String>,
    #[serde(default)]
    pub health: Option<HealthStatus>,
    #[serde(default)]
    pub health_num: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub id_reference: Option<String>,
    #[serde(default)]
    pub who: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TreeRecord {
    /// Current health label, preferring the numeric scale (the source of
    /// truth for edits) over a stored label.
    pub fn derived_health(&self) -> Option<HealthStatus> {
        self.health_num
            .and_then(HealthStatus::from_scale)
            .or(self.health)
    }

    /// Slider position for the record, if its health is known.
    pub fn health_scale(&self) -> Option<u8> {
        self.derived_health().map(|h| h.scale())
    }
}

/// Partial update for a tree's mutable fields. Exactly one of `health` or
/// `notes` is set per write; absent fields are left off the payload so the
/// server only touches what was edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTree {
    pub id_tree: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl UpdateTree {
    pub fn health(id_tree: &str, health: HealthStatus) -> Self {
        Self {
            id_tree: id_tree.to_string(),
            health: Some(health),
            notes: None,
        }
    }

    pub fn notes(id_tree: &str, notes: &str) -> Self {
        Self {
            id_tree: id_tree.to_string(),
            health: None,
            notes: Some(notes.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_deserializes_wire_names() {
        let record: TreeRecord = serde_json::from_value(json!({
            "idTree": "77",
            "common": "Red Maple",
            "scientific": "Acer rubrum",
            "datePlanted": "2018-04-22",
            "health": "fair",
            "healthNum": 5,
            "lat": 40.7128,
            "lng": -74.0060,
            "idReference": "REF-9"
        }))
        .unwrap();
        assert_eq!(record.id_tree, "77");
        assert_eq!(record.health, Some(HealthStatus::Fair));
        assert_eq!(record.health_num, Some(5));
        assert_eq!(record.id_reference.as_deref(), Some("REF-9"));
        assert!(record.notes.is_none());
    }

    #[test]
    fn derived_health_prefers_numeric_scale() {
        let record: TreeRecord = serde_json::from_value(json!({
            "idTree": "77",
            "health": "good",
            "healthNum": 3
        }))
        .unwrap();
        // Stored label disagrees with the scale; the scale wins.
        assert_eq!(record.derived_health(), Some(HealthStatus::Stump));
        assert_eq!(record.health_scale(), Some(3));
    }

    #[test]
    fn derived_health_falls_back_to_label() {
        let record: TreeRecord = serde_json::from_value(json!({
            "idTree": "77",
            "health": "poor"
        }))
        .unwrap();
        assert_eq!(record.derived_health(), Some(HealthStatus::Poor));
    }

    #[test]
    fn derived_health_unknown_when_both_absent() {
        let record: TreeRecord =
            serde_json::from_value(json!({ "idTree": "77" })).unwrap();
        assert_eq!(record.derived_health(), None);
        assert_eq!(record.health_scale(), None);
    }

    #[test]
    fn update_payload_carries_label_never_number() {
        let update = UpdateTree::health("42", HealthStatus::Fair);
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, json!({ "idTree": "42", "health": "fair" }));
    }

    #[test]
    fn notes_update_omits_health_key() {
        let update = UpdateTree::notes("42", "new graft looks stable");
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(
            value,
            json!({ "idTree": "42", "notes": "new graft looks stable" })
        );
    }
}
