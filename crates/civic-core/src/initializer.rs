// ── One-shot bootstrap ──
//
// Loads the configured entity types concurrently, then optionally hands
// the same list to the sync service. Entity failures are recorded in the
// store's metadata, reported through the configured callbacks, and never
// fail the bootstrap as a whole.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use civic_api::Gateway;
use futures_util::future::join_all;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::InitializerConfig;
use crate::error::CoreError;
use crate::loader;
use crate::model::EntityKind;
use crate::store::DataStore;
use crate::sync::SyncService;

/// What one `initialize()` call did.
#[derive(Debug, Clone, Default)]
pub struct InitReport {
    /// `true` if the store was already initialized and nothing ran.
    pub skipped: bool,
    pub loaded: Vec<(EntityKind, usize)>,
    pub failed: Vec<(EntityKind, CoreError)>,
    pub sync_started: bool,
}

pub struct Initializer {
    store: Arc<DataStore>,
    gateway: Arc<dyn Gateway>,
    sync: SyncService,
    config: InitializerConfig,
    initialized: AtomicBool,
    // Serializes concurrent `initialize()` calls.
    run_lock: Mutex<()>,
}

impl Initializer {
    /// Build an initializer with its own sync service over the same store
    /// and gateway.
    pub fn new(
        store: Arc<DataStore>,
        gateway: Arc<dyn Gateway>,
        config: InitializerConfig,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let sync = SyncService::new(Arc::clone(&store), Arc::clone(&gateway), config.sync_config())?;
        Ok(Self::with_sync(store, gateway, sync, config))
    }

    /// Build an initializer around an existing sync service. The service's
    /// configuration is replaced at hand-off when `enable_sync` is set.
    pub fn with_sync(
        store: Arc<DataStore>,
        gateway: Arc<dyn Gateway>,
        sync: SyncService,
        config: InitializerConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            sync,
            config,
            initialized: AtomicBool::new(false),
            run_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    pub fn sync(&self) -> &SyncService {
        &self.sync
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Load every configured entity type, then start sync if enabled.
    ///
    /// A second call while initialized is a no-op. Only configuration
    /// problems fail the call; individual loads fail into the store's
    /// error metadata and the returned report.
    pub async fn initialize(&self) -> Result<InitReport, CoreError> {
        let _guard = self.run_lock.lock().await;
        if self.is_initialized() {
            return Ok(InitReport {
                skipped: true,
                ..InitReport::default()
            });
        }
        self.config.validate()?;

        let store = self.store.as_ref();
        let gateway = self.gateway.as_ref();
        let results = join_all(self.config.entities.iter().map(|&kind| async move {
            (kind, loader::load_tracked(store, gateway, kind).await)
        }))
        .await;

        let callbacks = &self.config.sync;
        let mut report = InitReport::default();
        for (kind, result) in results {
            match result {
                Ok(count) => {
                    if let Some(ref on_success) = callbacks.on_success {
                        on_success(kind);
                    }
                    report.loaded.push((kind, count));
                }
                Err(e) => {
                    warn!(entity = %kind, error = %e, "initial load failed");
                    if let Some(ref on_error) = callbacks.on_error {
                        on_error(kind, &e);
                    }
                    report.failed.push((kind, e));
                }
            }
        }

        if self.config.enable_sync {
            self.sync.configure(self.config.sync_config())?;
            self.sync.start();
            report.sync_started = self.sync.is_running();
        }

        self.initialized.store(true, Ordering::Release);
        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            sync = report.sync_started,
            "initialization complete"
        );
        Ok(report)
    }

    /// Stop sync, clear the store, and allow `initialize()` to run again.
    pub fn destroy(&self) {
        self.sync.stop();
        self.store.clear_all();
        self.initialized.store(false, Ordering::Release);
        info!("store torn down");
    }
}

impl std::fmt::Debug for Initializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Initializer")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}
