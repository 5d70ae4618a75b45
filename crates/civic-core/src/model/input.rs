// ── Mutation payloads ──
//
// Bodies for create (POST) and update (PUT) calls. The server assigns ids
// and timestamps and echoes the stored record back.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{MlaStatus, ReservedCategory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstituencyInput {
    pub name: String,
    pub code: String,
    pub district: String,
    pub reserved_category: ReservedCategory,
    pub population: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlaInput {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub party_id: String,
    pub constituency_id: String,
    pub term_start: NaiveDate,
    pub term_end: NaiveDate,
    pub status: MlaStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyInput {
    pub name: String,
    pub abbreviation: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
