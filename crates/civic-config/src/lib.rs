//! Configuration for the civic data layer.
//!
//! TOML file + `CIVIC_` environment overrides, bearer-token resolution,
//! and translation to `civic_api::TransportConfig` and
//! `civic_core::{SyncConfig, InitializerConfig}`. Core never reads files;
//! host applications load a [`Config`] here and hand the results in.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use civic_api::{HttpGateway, TransportConfig};
use civic_core::{CoreError, EntityKind, InitializerConfig, SyncConfig};
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("bearer token variable '{var}' is not set")]
    MissingToken { var: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to build gateway: {0}")]
    Gateway(#[from] civic_api::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub sync: SyncSection,
}

/// Backend connection settings.
#[derive(Debug, Deserialize, Serialize)]
pub struct ApiSection {
    /// API root; entity routes are joined onto it (e.g. `.../api/mlas`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment variable holding the bearer token.
    pub token_env: Option<String>,

    /// Bearer token (plaintext -- prefer `token_env`).
    pub token: Option<String>,

    /// Path to a PEM CA certificate to trust in addition to system roots.
    pub ca_cert: Option<PathBuf>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            token_env: None,
            token: None,
            ca_cert: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api".into()
}
fn default_timeout() -> u64 {
    30
}

/// Background refresh and bootstrap settings.
#[derive(Debug, Deserialize, Serialize)]
pub struct SyncSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Wire names: `constituencies`, `mlas`, `parties`, `dashboardStats`.
    #[serde(default = "default_entities")]
    pub entities: Vec<String>,

    #[serde(default)]
    pub reject_stale_results: bool,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_ms: default_interval_ms(),
            entities: default_entities(),
            reject_stale_results: false,
        }
    }
}

fn default_enabled() -> bool {
    true
}
fn default_interval_ms() -> u64 {
    5 * 60 * 1000
}
fn default_entities() -> Vec<String> {
    ["constituencies", "mlas", "parties"]
        .map(String::from)
        .to_vec()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "civic", "civic").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("civic");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults, then `path` (if it exists), then `CIVIC_` variables.
///
/// Nested keys use a double underscore: `CIVIC_SYNC__INTERVAL_MS=60000`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CIVIC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write it to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Translation to runtime configs ──────────────────────────────────

impl Config {
    /// Resolve the bearer token: `token_env` variable first, then the
    /// plaintext `token`. `None` when neither is configured.
    pub fn resolve_token(&self) -> Result<Option<SecretString>, ConfigError> {
        if let Some(ref var) = self.api.token_env {
            return match std::env::var(var) {
                Ok(val) => Ok(Some(SecretString::from(val))),
                Err(_) => match self.api.token {
                    Some(ref token) => Ok(Some(SecretString::from(token.clone()))),
                    None => Err(ConfigError::MissingToken { var: var.clone() }),
                },
            };
        }
        Ok(self.api.token.clone().map(SecretString::from))
    }

    pub fn transport_config(&self) -> Result<TransportConfig, ConfigError> {
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::validation("api.timeout_secs", "must be at least 1"));
        }
        Ok(TransportConfig {
            timeout: Duration::from_secs(self.api.timeout_secs),
            bearer_token: self.resolve_token()?,
            ca_cert: self.api.ca_cert.clone(),
            ..TransportConfig::default()
        })
    }

    /// Build the HTTP gateway described by `[api]`.
    pub fn gateway(&self) -> Result<HttpGateway, ConfigError> {
        let url: url::Url = self.api.base_url.parse().map_err(|_| {
            ConfigError::validation(
                "api.base_url",
                format!("invalid URL: {}", self.api.base_url),
            )
        })?;
        Ok(HttpGateway::new(url.as_str(), &self.transport_config()?)?)
    }

    /// Parse `[sync].entities` into entity kinds.
    pub fn entities(&self) -> Result<Vec<EntityKind>, ConfigError> {
        self.sync
            .entities
            .iter()
            .map(|name| {
                EntityKind::from_str(name).map_err(|_| {
                    ConfigError::validation(
                        "sync.entities",
                        format!("unknown entity type '{name}'"),
                    )
                })
            })
            .collect()
    }

    /// The sync service configuration, validated. Callbacks are left
    /// unset for the host to attach.
    pub fn sync_config(&self) -> Result<SyncConfig, ConfigError> {
        let config = SyncConfig {
            enabled: self.sync.enabled,
            interval: Duration::from_millis(self.sync.interval_ms),
            entities: self.entities()?,
            reject_stale_results: self.sync.reject_stale_results,
            ..SyncConfig::default()
        };
        config.validate().map_err(|e| match e {
            CoreError::Config { message } => ConfigError::validation("sync", message),
            other => ConfigError::validation("sync", other.to_string()),
        })?;
        Ok(config)
    }

    /// Bootstrap configuration: load `[sync].entities`, then hand off to
    /// sync when `[sync].enabled`.
    pub fn initializer_config(&self) -> Result<InitializerConfig, ConfigError> {
        let sync = self.sync_config()?;
        Ok(InitializerConfig {
            entities: sync.entities.clone(),
            enable_sync: sync.enabled,
            sync,
        })
    }
}
