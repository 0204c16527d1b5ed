use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Tree condition on the 1-6 ordinal scale used by the inventory API.
///
/// The numeric scale is the editing source of truth; the label is derived
/// from it for display and for write payloads, never stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Dead,
    Missing,
    Stump,
    Poor,
    Fair,
    Good,
}

impl HealthStatus {
    /// Scale order: position 1 is `Dead`, position 6 is `Good`.
    pub const ALL: &[HealthStatus] = &[
        HealthStatus::Dead,
        HealthStatus::Missing,
        HealthStatus::Stump,
        HealthStatus::Poor,
        HealthStatus::Fair,
        HealthStatus::Good,
    ];

    pub const SCALE_MIN: u8 = 1;
    pub const SCALE_MAX: u8 = 6;

    /// Map a raw scale value to its label. Total only over 1..=6; anything
    /// else means "unknown health", not an error.
    pub fn from_scale(value: i64) -> Option<Self> {
        match value {
            1 => Some(HealthStatus::Dead),
            2 => Some(HealthStatus::Missing),
            3 => Some(HealthStatus::Stump),
            4 => Some(HealthStatus::Poor),
            5 => Some(HealthStatus::Fair),
            6 => Some(HealthStatus::Good),
            _ => None,
        }
    }

    pub fn scale(&self) -> u8 {
        match self {
            HealthStatus::Dead => 1,
            HealthStatus::Missing => 2,
            HealthStatus::Stump => 3,
            HealthStatus::Poor => 4,
            HealthStatus::Fair => 5,
            HealthStatus::Good => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Dead => "dead",
            HealthStatus::Missing => "missing",
            HealthStatus::Stump => "stump",
            HealthStatus::Poor => "poor",
            HealthStatus::Fair => "fair",
            HealthStatus::Good => "good",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "dead" => Some(HealthStatus::Dead),
            "missing" => Some(HealthStatus::Missing),
            "stump" => Some(HealthStatus::Stump),
            "poor" => Some(HealthStatus::Poor),
            "fair" => Some(HealthStatus::Fair),
            "good" => Some(HealthStatus::Good),
            _ => None,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s).ok_or_else(|| CoreError::InvalidHealthLabel(s.to_string()))
    }
}
