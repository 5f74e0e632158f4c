// Shared transport configuration for building reqwest::Client instances.
//
// The REST client and the health probe share timeout and identification
// headers through this module.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

/// Protocol version advertised in the `X-API-Version` header.
pub const API_VERSION: &str = "1.0";

/// Client identifier advertised in the `X-Client` header and in the
/// realtime authentication handshake.
pub const CLIENT_NAME: &str = "geofly-rs";

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout. The remote is considered "slow" past this
    /// point and the request is aborted.
    pub timeout: Duration,
    /// Value for the `X-Client` header.
    pub client_name: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            client_name: CLIENT_NAME.to_owned(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// Injects `X-API-Version` and `X-Client` as default headers on every
    /// request. The `Authorization` header is attached per request by the
    /// client, since the API key is runtime-mutable.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut headers = HeaderMap::new();
        headers.insert("X-API-Version", HeaderValue::from_static(API_VERSION));
        let client_value = HeaderValue::from_str(&self.client_name)
            .unwrap_or_else(|_| HeaderValue::from_static(CLIENT_NAME));
        headers.insert("X-Client", client_value);

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(format!("{CLIENT_NAME}/0.1.0"))
            .default_headers(headers)
            .build()
            .map_err(crate::error::Error::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_ten_seconds() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn builds_client() {
        let config = TransportConfig::default();
        assert!(config.build_client().is_ok());
    }
}
