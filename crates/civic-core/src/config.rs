// ── Runtime sync configuration ──
//
// Plain structs handed to the sync service and initializer. Core never
// reads config files; civic-config builds these from TOML/env.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::CoreError;
use crate::model::EntityKind;

/// Called once per failed entity fetch, with the kind that failed.
pub type ErrorCallback = Arc<dyn Fn(EntityKind, &CoreError) + Send + Sync>;

/// Called once per successful entity fetch.
pub type SuccessCallback = Arc<dyn Fn(EntityKind) + Send + Sync>;

/// Configuration for the periodic sync service.
#[derive(Clone)]
pub struct SyncConfig {
    /// When `false`, `start()` does nothing. Manual syncs still work.
    pub enabled: bool,
    /// Time between the starts of consecutive sync cycles.
    pub interval: Duration,
    /// Entity types refreshed each cycle.
    pub entities: Vec<EntityKind>,
    /// Discard a fetch result if a later-issued fetch for the same kind
    /// has already been written.
    pub reject_stale_results: bool,
    pub on_error: Option<ErrorCallback>,
    pub on_success: Option<SuccessCallback>,
}

pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(5 * 60);

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: DEFAULT_SYNC_INTERVAL,
            entities: vec![
                EntityKind::Constituencies,
                EntityKind::Mlas,
                EntityKind::Parties,
            ],
            reject_stale_results: false,
            on_error: None,
            on_success: None,
        }
    }
}

impl SyncConfig {
    pub fn with_entities(mut self, entities: impl IntoIterator<Item = EntityKind>) -> Self {
        self.entities = entities.into_iter().collect();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(EntityKind, &CoreError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(EntityKind) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(f));
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.interval.is_zero() {
            return Err(CoreError::config("sync interval must be greater than zero"));
        }
        validate_entities(&self.entities)
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("enabled", &self.enabled)
            .field("interval", &self.interval)
            .field("entities", &self.entities)
            .field("reject_stale_results", &self.reject_stale_results)
            .field("on_error", &self.on_error.is_some())
            .field("on_success", &self.on_success.is_some())
            .finish()
    }
}

/// Configuration for the one-shot bootstrap.
#[derive(Debug, Clone)]
pub struct InitializerConfig {
    /// Entity types loaded concurrently on `initialize()`.
    pub entities: Vec<EntityKind>,
    /// Hand the same entity list to the sync service once loading settles.
    pub enable_sync: bool,
    /// Interval for the sync service, and callbacks for both the initial
    /// loads and later sync cycles. Its `entities` are
    /// replaced by this config's `entities` at hand-off.
    pub sync: SyncConfig,
}

impl Default for InitializerConfig {
    fn default() -> Self {
        let sync = SyncConfig::default();
        Self {
            entities: sync.entities.clone(),
            enable_sync: true,
            sync,
        }
    }
}

impl InitializerConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        self.sync_config().validate()
    }

    /// The sync configuration handed off after bootstrap.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            entities: self.entities.clone(),
            ..self.sync.clone()
        }
    }
}

fn validate_entities(entities: &[EntityKind]) -> Result<(), CoreError> {
    if entities.is_empty() {
        return Err(CoreError::config("entity list must not be empty"));
    }
    let mut seen = HashSet::with_capacity(entities.len());
    for &kind in entities {
        if !kind.is_syncable() {
            return Err(CoreError::config(format!(
                "{kind} cannot be loaded as a collection"
            )));
        }
        if !seen.insert(kind) {
            return Err(CoreError::config(format!("{kind} is listed more than once")));
        }
    }
    Ok(())
}
