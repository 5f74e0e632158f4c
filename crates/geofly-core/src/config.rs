// ── Runtime façade configuration ──
//
// Describes *how* the façade talks to the geofence service. Carries the
// credential and tuning knobs, but never touches disk -- the hosting
// application (or geofly-config) constructs one and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Configuration for one [`GeofenceFacade`](crate::GeofenceFacade).
#[derive(Debug, Clone)]
pub struct FacadeConfig {
    /// Service base URL (e.g., `https://geofence.example.com`).
    pub base_url: Url,
    /// Bearer token for every request and the realtime handshake.
    pub api_key: SecretString,
    /// Serve the built-in demo dataset instead of calling the service.
    pub use_static_data: bool,
    /// Open the realtime push channel after the initial load.
    pub realtime: bool,
    /// Re-run the bulk read on a fixed interval.
    pub polling: bool,
    /// Interval between polls.
    pub poll_interval: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://geofence-api-production.up.railway.app")
                .expect("default base url is valid"),
            api_key: SecretString::from("demo-api-key".to_owned()),
            use_static_data: false,
            realtime: true,
            polling: true,
            poll_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
        }
    }
}
