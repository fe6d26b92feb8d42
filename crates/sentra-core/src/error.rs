// ── Core error types ──
//
// User-facing errors from sentra-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<sentra_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

use crate::model::CameraId;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Backend request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Camera not found: {identifier}")]
    CameraNotFound { identifier: String },

    #[error("Stream unavailable for camera {camera_id}: {reason}")]
    StreamUnavailable { camera_id: CameraId, reason: String },

    // ── Orchestrator errors ──────────────────────────────────────────
    #[error("Camera directory is not loaded")]
    DirectoryNotLoaded,

    #[error("No camera selected")]
    NoSelection,

    #[error("Feed orchestrator has been shut down")]
    Closed,

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Backend error: {message}")]
    Backend {
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
    /// Returns `true` if retrying the same call might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout => true,
            Self::Backend { status, .. } => status.is_none_or(|s| s >= 500 || s == 429),
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sentra_api::Error> for CoreError {
    fn from(err: sentra_api::Error) -> Self {
        match err {
            sentra_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Backend {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            sentra_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            sentra_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            sentra_api::Error::InvalidToken(msg) => CoreError::Config {
                message: format!("Invalid API token: {msg}"),
            },
            sentra_api::Error::Http { status, message } => CoreError::Backend {
                message,
                status: Some(status),
            },
            sentra_api::Error::Backend { message } => CoreError::Backend {
                message,
                status: None,
            },
            sentra_api::Error::MissingPayload { key } => {
                CoreError::Internal(format!("response missing '{key}' payload"))
            }
            sentra_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
