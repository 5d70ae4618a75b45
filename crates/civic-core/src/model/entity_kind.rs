use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The entity types the store keeps metadata for.
///
/// Wire names follow the backend's camelCase (`"constituencies"`,
/// `"dashboardStats"`, ...) and are what configuration files use.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum EntityKind {
    Constituencies,
    Mlas,
    Parties,
    DashboardStats,
    ConstituencyStats,
    MlaStats,
}

impl EntityKind {
    /// Kinds the sync service and initializer can load as a whole.
    ///
    /// Per-record statistics are fetched on demand by id and have no
    /// collection endpoint.
    pub fn is_syncable(self) -> bool {
        matches!(
            self,
            Self::Constituencies | Self::Mlas | Self::Parties | Self::DashboardStats
        )
    }

    /// Collection route for this kind. Per-record statistics live under
    /// `{path}/{id}/stats` of their parent collection.
    pub fn path(self) -> &'static str {
        match self {
            Self::Constituencies | Self::ConstituencyStats => "/constituencies",
            Self::Mlas | Self::MlaStats => "/mlas",
            Self::Parties => "/parties",
            Self::DashboardStats => "/dashboard/stats",
        }
    }

    /// Route of the statistics for one record of the parent collection.
    pub fn record_stats_path(self, id: &str) -> String {
        format!("{}/{id}/stats", self.path())
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}
