// ── Aggregate statistics ──
//
// Counters computed server-side. The dashboard record is a singleton; the
// per-constituency and per-MLA records are keyed by their foreign id.

use serde::{Deserialize, Serialize};

use super::Record;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub total_constituencies: u64,
    pub total_mlas: u64,
    pub active_mlas: u64,
    pub total_parties: u64,
    pub total_issues: u64,
    pub resolved_issues: u64,
    pub pending_issues: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstituencyStats {
    pub constituency_id: String,
    #[serde(default)]
    pub total_issues: u64,
    #[serde(default)]
    pub resolved_issues: u64,
    #[serde(default)]
    pub pending_issues: u64,
    #[serde(default)]
    pub in_progress_issues: u64,
    #[serde(default)]
    pub average_resolution_days: Option<f64>,
}

impl Record for ConstituencyStats {
    fn id(&self) -> &str {
        &self.constituency_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlaStats {
    pub mla_id: String,
    #[serde(default)]
    pub total_issues: u64,
    #[serde(default)]
    pub resolved_issues: u64,
    #[serde(default)]
    pub pending_issues: u64,
    /// Fraction in `0.0..=1.0`.
    #[serde(default)]
    pub resolution_rate: f64,
}

impl Record for MlaStats {
    fn id(&self) -> &str {
        &self.mla_id
    }
}
