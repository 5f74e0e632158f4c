use thiserror::Error;

/// Top-level error type for the `geofly-api` crate.
///
/// Covers every failure mode of the remote service: transport, timeout,
/// HTTP rejection, envelope-level rejection, and the realtime channel.
/// `geofly-core` maps these into consumer-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request exceeded the configured timeout.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Remote rejection ────────────────────────────────────────────
    /// Non-2xx HTTP status, with the raw response body.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// 2xx response whose envelope carried `success: false`.
    #[error("API rejected request: {message}")]
    Envelope { message: String },

    /// Invalid API key material (cannot be sent as a header).
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    // ── Realtime channel ────────────────────────────────────────────
    /// WebSocket connection to a candidate endpoint failed.
    #[error("Realtime connection failed: {0}")]
    RealtimeConnect(String),

    /// Every candidate realtime endpoint failed in one pass.
    #[error("All {candidates} realtime endpoints unreachable")]
    RealtimeExhausted { candidates: usize },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the remote was unreachable (as opposed to
    /// reachable-but-rejecting): connect failures and timeouts.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::RealtimeConnect(_) | Self::RealtimeExhausted { .. } => {
                true
            }
            _ => false,
        }
    }

    /// The HTTP status carried by a rejection, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
