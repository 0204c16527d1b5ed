use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The six maintenance flags recorded per visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceKind {
    Watered,
    Mulched,
    Weeded,
    Staked,
    Braced,
    Pruned,
}

impl MaintenanceKind {
    /// Fixed display order for summaries and the maintenance form.
    pub const ALL: &[MaintenanceKind] = &[
        MaintenanceKind::Watered,
        MaintenanceKind::Mulched,
        MaintenanceKind::Weeded,
        MaintenanceKind::Staked,
        MaintenanceKind::Braced,
        MaintenanceKind::Pruned,
    ];

    /// The wire key and the "done" form of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceKind::Watered => "watered",
            MaintenanceKind::Mulched => "mulched",
            MaintenanceKind::Weeded => "weeded",
            MaintenanceKind::Staked => "staked",
            MaintenanceKind::Braced => "braced",
            MaintenanceKind::Pruned => "pruned",
        }
    }

    /// Base verb, shown on a form button while the flag is off.
    pub fn verb(&self) -> &'static str {
        match self {
            MaintenanceKind::Watered => "water",
            MaintenanceKind::Mulched => "mulch",
            MaintenanceKind::Weeded => "weed",
            MaintenanceKind::Staked => "stake",
            MaintenanceKind::Braced => "brace",
            MaintenanceKind::Pruned => "prune",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "watered" => Some(MaintenanceKind::Watered),
            "mulched" => Some(MaintenanceKind::Mulched),
            "weeded" => Some(MaintenanceKind::Weeded),
            "staked" => Some(MaintenanceKind::Staked),
            "braced" => Some(MaintenanceKind::Braced),
            "pruned" => Some(MaintenanceKind::Pruned),
            _ => None,
        }
    }
}

impl fmt::Display for MaintenanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flag value as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn as_str(&self) -> &'static str {
        match self {
            YesNo::Yes => "yes",
            YesNo::No => "no",
        }
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True unless the value is null or the string `"no"`. History rows have
/// carried both booleans and yes/no strings over time, so anything else
/// counts as positive.
pub fn flag_is_set(value: &Value) -> bool {
    !value.is_null() && value.as_str() != Some("no")
}

/// Derive the "maintenance done" list from a record's raw flag values.
/// Returns the qualifying flag names joined with `", "` in the fixed
/// display order, or an empty string when none qualify.
pub fn summarize(flags: &Map<String, Value>) -> String {
    let done: Vec<&str> = MaintenanceKind::ALL
        .iter()
        .filter(|kind| flags.get(kind.as_str()).is_some_and(flag_is_set))
        .map(|kind| kind.as_str())
        .collect();
    done.join(", ")
}

/// In-memory yes/no state for the six flags of a visit being drafted.
///
/// All flags start unset (equivalent to "no"). A flag that has been toggled
/// keeps an explicit value even after being toggled back to `No`, mirroring
/// how the outgoing payload carries every touched key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceToggleSet {
    state: [Option<YesNo>; 6],
}

impl MaintenanceToggleSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn idx(kind: MaintenanceKind) -> usize {
        kind as usize
    }

    pub fn value(&self, kind: MaintenanceKind) -> Option<YesNo> {
        self.state[Self::idx(kind)]
    }

    pub fn is_on(&self, kind: MaintenanceKind) -> bool {
        matches!(self.value(kind), Some(YesNo::Yes))
    }

    /// Unset or `"no"` becomes `"yes"`; `"yes"` becomes `"no"`.
    pub fn toggle(&mut self, kind: MaintenanceKind) {
        let next = match self.value(kind) {
            Some(YesNo::Yes) => YesNo::No,
            _ => YesNo::Yes,
        };
        self.state[Self::idx(kind)] = Some(next);
    }

    /// Button label mirroring the flag state: base verb when off, past
    /// participle when on. Derived, so it can never drift from the state.
    pub fn label(&self, kind: MaintenanceKind) -> &'static str {
        if self.is_on(kind) {
            kind.as_str()
        } else {
            kind.verb()
        }
    }

    pub fn has_any_selected(&self) -> bool {
        MaintenanceKind::ALL.iter().any(|&kind| self.is_on(kind))
    }

    /// Flags currently on, in display order.
    pub fn selected(&self) -> Vec<MaintenanceKind> {
        MaintenanceKind::ALL
            .iter()
            .copied()
            .filter(|&kind| self.is_on(kind))
            .collect()
    }

    /// Every touched flag with its value, in display order. Includes flags
    /// toggled back to `No`.
    pub fn entries(&self) -> Vec<(MaintenanceKind, YesNo)> {
        MaintenanceKind::ALL
            .iter()
            .filter_map(|&kind| self.value(kind).map(|v| (kind, v)))
            .collect()
    }

    /// Pre-submit summary of what is selected so far.
    pub fn summary(&self) -> String {
        self.selected()
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
