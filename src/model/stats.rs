use serde::{Deserialize, Serialize};

/// Aggregate counts computed by the service. Never derived locally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSummary {
    pub total: u64,
    pub applied: u64,
    pub interview: u64,
    pub offer: u64,
    pub rejected: u64,
}
