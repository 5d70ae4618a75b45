use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

/// Reservation status of a constituency's seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservedCategory {
    General,
    Sc,
    St,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constituency {
    pub id: String,
    pub name: String,
    pub code: String,
    pub district: String,
    pub reserved_category: ReservedCategory,
    pub population: u64,
    /// Square kilometres.
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Constituency {
    fn id(&self) -> &str {
        &self.id
    }
}
