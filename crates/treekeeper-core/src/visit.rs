use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::maintenance::{MaintenanceKind, MaintenanceToggleSet, YesNo};

/// Timestamp format the history endpoint expects on visit creation.
pub const VISIT_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// One maintenance/inspection event for a tree. Append-only: created by a
/// form submission, never edited afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeVisitRecord {
    pub id_treehistory: String,
    pub id_tree: String,
    pub date_visit: DateTime<Utc>,
    #[serde(default)]
    pub volunteer: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub watered: Option<YesNo>,
    #[serde(default)]
    pub mulched: Option<YesNo>,
    #[serde(default)]
    pub weeded: Option<YesNo>,
    #[serde(default)]
    pub staked: Option<YesNo>,
    #[serde(default)]
    pub braced: Option<YesNo>,
    #[serde(default)]
    pub pruned: Option<YesNo>,
}

impl TreeVisitRecord {
    pub fn flag(&self, kind: MaintenanceKind) -> Option<YesNo> {
        match kind {
            MaintenanceKind::Watered => self.watered,
            MaintenanceKind::Mulched => self.mulched,
            MaintenanceKind::Weeded => self.weeded,
            MaintenanceKind::Staked => self.staked,
            MaintenanceKind::Braced => self.braced,
            MaintenanceKind::Pruned => self.pruned,
        }
    }

    /// Comma-joined "maintenance done" list in display order, empty when
    /// nothing was done on this visit.
    pub fn maintenance_summary(&self) -> String {
        MaintenanceKind::ALL
            .iter()
            .filter(|&&kind| matches!(self.flag(kind), Some(YesNo::Yes)))
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Payload for appending a visit.
///
/// `date_visit` stays snake_case on the wire (historical contract, unlike
/// the camelCase read side). Flags appear only once touched, so key
/// presence carries meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVisit {
    #[serde(rename = "idTree")]
    pub id_tree: String,
    pub date_visit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watered: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mulched: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weeded: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staked: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub braced: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pruned: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volunteer: Option<String>,
}

impl CreateVisit {
    pub fn new(id_tree: &str, at: DateTime<Local>) -> Self {
        Self {
            id_tree: id_tree.to_string(),
            date_visit: at.format(VISIT_DATE_FORMAT).to_string(),
            watered: None,
            mulched: None,
            weeded: None,
            staked: None,
            braced: None,
            pruned: None,
            comment: None,
            volunteer: None,
        }
    }

    pub fn now(id_tree: &str) -> Self {
        Self::new(id_tree, Local::now())
    }

    pub fn flag(&self, kind: MaintenanceKind) -> Option<YesNo> {
        match kind {
            MaintenanceKind::Watered => self.watered,
            MaintenanceKind::Mulched => self.mulched,
            MaintenanceKind::Weeded => self.weeded,
            MaintenanceKind::Staked => self.staked,
            MaintenanceKind::Braced => self.braced,
            MaintenanceKind::Pruned => self.pruned,
        }
    }

    pub fn set_flag(&mut self, kind: MaintenanceKind, value: YesNo) {
        let slot = match kind {
            MaintenanceKind::Watered => &mut self.watered,
            MaintenanceKind::Mulched => &mut self.mulched,
            MaintenanceKind::Weeded => &mut self.weeded,
            MaintenanceKind::Staked => &mut self.staked,
            MaintenanceKind::Braced => &mut self.braced,
            MaintenanceKind::Pruned => &mut self.pruned,
        };
        *slot = Some(value);
    }

    /// Copy every touched flag from the draft toggle state.
    pub fn with_toggles(mut self, toggles: &MaintenanceToggleSet) -> Self {
        for (kind, value) in toggles.entries() {
            self.set_flag(kind, value);
        }
        self
    }

    /// Attach a comment unless it is blank.
    pub fn with_comment(mut self, comment: &str) -> Self {
        let trimmed = comment.trim();
        if !trimmed.is_empty() {
            self.comment = Some(trimmed.to_string());
        }
        self
    }

    /// Attach a volunteer name unless it is blank.
    pub fn with_volunteer(mut self, volunteer: &str) -> Self {
        let trimmed = volunteer.trim();
        if !trimmed.is_empty() {
            self.volunteer = Some(trimmed.to_string());
        }
        self
    }

    /// True when the payload carries any of the six flag keys or a comment.
    /// Key presence is what counts, not the value: a flag toggled on and
    /// back to "no" still qualifies. Payloads failing this must not be sent.
    pub fn has_maintenance_fields(&self) -> bool {
        MaintenanceKind::ALL.iter().any(|&kind| self.flag(kind).is_some())
            || self.comment.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn base_visit() -> CreateVisit {
        let at = Local.with_ymd_and_hms(2024, 6, 1, 14, 30, 0).unwrap();
        CreateVisit::new("42", at)
    }

    #[test]
    fn date_visit_uses_contract_format() {
        assert_eq!(base_visit().date_visit, "2024/06/01 14:30:00");
    }

    #[test]
    fn bare_payload_has_no_maintenance_fields() {
        assert!(!base_visit().has_maintenance_fields());
    }

    #[test]
    fn one_flag_qualifies() {
        let mut visit = base_visit();
        visit.set_flag(MaintenanceKind::Watered, YesNo::Yes);
        assert!(visit.has_maintenance_fields());
    }

    #[test]
    fn comment_alone_qualifies() {
        let visit = base_visit().with_comment("trimmed");
        assert!(visit.has_maintenance_fields());
    }

    #[test]
    fn flag_toggled_back_to_no_still_qualifies() {
        let mut toggles = MaintenanceToggleSet::new();
        toggles.toggle(MaintenanceKind::Staked);
        toggles.toggle(MaintenanceKind::Staked);
        let visit = base_visit().with_toggles(&toggles);
        assert_eq!(visit.staked, Some(YesNo::No));
        assert!(visit.has_maintenance_fields());
    }

    #[test]
    fn blank_comment_and_volunteer_are_dropped() {
        let visit = base_visit().with_comment("   ").with_volunteer("");
        assert!(visit.comment.is_none());
        assert!(visit.volunteer.is_none());
        assert!(!visit.has_maintenance_fields());
    }

    #[test]
    fn serialized_payload_omits_untouched_flags() {
        let mut toggles = MaintenanceToggleSet::new();
        toggles.toggle(MaintenanceKind::Watered);
        let visit = base_visit().with_toggles(&toggles);
        let value = serde_json::to_value(&visit).unwrap();
        assert_eq!(
            value,
            json!({
                "idTree": "42",
                "date_visit": "2024/06/01 14:30:00",
                "watered": "yes"
            })
        );
    }

    #[test]
    fn record_summary_in_display_order() {
        let record: TreeVisitRecord = serde_json::from_value(json!({
            "idTreehistory": "h1",
            "idTree": "42",
            "dateVisit": "2024-06-01T14:30:00Z",
            "pruned": "yes",
            "watered": "yes",
            "mulched": "no"
        }))
        .unwrap();
        assert_eq!(record.maintenance_summary(), "watered, pruned");
    }

    #[test]
    fn record_summary_empty_when_nothing_done() {
        let record: TreeVisitRecord = serde_json::from_value(json!({
            "idTreehistory": "h1",
            "idTree": "42",
            "dateVisit": "2024-06-01T14:30:00Z",
            "comment": "just looking"
        }))
        .unwrap();
        assert_eq!(record.maintenance_summary(), "");
    }
}
