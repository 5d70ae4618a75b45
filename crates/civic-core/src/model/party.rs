use serde::{Deserialize, Serialize};

use super::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
    /// CSS colour used for charts and badges (e.g. `"#FF9933"`).
    pub color: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Record for Party {
    fn id(&self) -> &str {
        &self.id
    }
}
