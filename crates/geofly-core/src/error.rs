// ── Core error types ──
//
// Consumer-facing errors from geofly-core. These are NOT transport
// specific -- consumers never see reqwest values or raw JSON parse
// failures directly. The `From<geofly_api::Error>` impl translates
// wire-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Geofence service unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Rejections ───────────────────────────────────────────────────
    #[error("Request rejected by service: {message}")]
    Rejected {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Zone not found: {id}")]
    ZoneNotFound { id: String },

    #[error("Tourist not found: {id}")]
    TouristNotFound { id: String },

    #[error("Alert not found: {id}")]
    AlertNotFound { id: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from wire-layer errors ────────────────────────────────

impl From<geofly_api::Error> for CoreError {
    fn from(err: geofly_api::Error) -> Self {
        match err {
            geofly_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            geofly_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::Unreachable {
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Rejected {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            geofly_api::Error::Api { status, body } => CoreError::Rejected {
                message: body,
                status: Some(status),
            },
            geofly_api::Error::Envelope { message } => CoreError::Rejected {
                message,
                status: None,
            },
            geofly_api::Error::InvalidApiKey(reason) => CoreError::Config {
                message: format!("invalid API key: {reason}"),
            },
            geofly_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            geofly_api::Error::RealtimeConnect(reason) => CoreError::Unreachable {
                reason: format!("realtime channel: {reason}"),
            },
            geofly_api::Error::RealtimeExhausted { candidates } => CoreError::Unreachable {
                reason: format!("all {candidates} realtime endpoints unreachable"),
            },
            geofly_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("deserialization error: {message}"))
            }
        }
    }
}
