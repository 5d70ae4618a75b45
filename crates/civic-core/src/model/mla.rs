use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MlaStatus {
    Active,
    Inactive,
    Ended,
    Suspended,
}

impl MlaStatus {
    /// Wire form, as used in list filters.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Ended => "ENDED",
            Self::Suspended => "SUSPENDED",
        }
    }
}

/// A member of the legislative assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mla {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub party_id: String,
    pub constituency_id: String,
    pub term_start: NaiveDate,
    pub term_end: NaiveDate,
    pub status: MlaStatus,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl Mla {
    pub fn is_active(&self) -> bool {
        self.status == MlaStatus::Active
    }
}

impl Record for Mla {
    fn id(&self) -> &str {
        &self.id
    }
}
