// ── Core error types ──
//
// User-facing errors from civic-core. Consumers never see raw transport
// errors: the `From<civic_api::Error>` impl translates them into variants
// whose Display text is fit to show next to a retry button.

use thiserror::Error;

use crate::model::EntityKind;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the server: {reason}")]
    ConnectionFailed { reason: String },

    #[error("The server took too long to respond")]
    Timeout,

    #[error("Your session has expired -- please sign in again")]
    Unauthorized,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    /// The backend answered `success: false`.
    #[error("{message}")]
    Rejected { message: String },

    /// Some ids of a bulk delete could not be removed.
    #[error("Failed to delete {} of {total} {entity}: {}", .failed.len(), .failed.join(", "))]
    PartialDelete {
        entity: EntityKind,
        total: usize,
        failed: Vec<String>,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Server error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<civic_api::Error> for CoreError {
    fn from(err: civic_api::Error) -> Self {
        match err {
            civic_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                } else if e.status().map(|s| s.as_u16()) == Some(404) {
                    CoreError::NotFound {
                        entity_type: "Resource".into(),
                        identifier: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            civic_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            civic_api::Error::InvalidHeader(msg) => CoreError::Config {
                message: format!("Invalid header value: {msg}"),
            },
            civic_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            civic_api::Error::Unauthorized => CoreError::Unauthorized,
            civic_api::Error::Http {
                status: 404,
                message,
            } => CoreError::NotFound {
                entity_type: "Resource".into(),
                identifier: message,
            },
            civic_api::Error::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            civic_api::Error::Rejected { message } => CoreError::Rejected { message },
            civic_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Unexpected response from server: {message}"))
            }
        }
    }
}
