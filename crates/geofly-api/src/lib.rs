// geofly-api: Async Rust client for the geofence safety service (REST + realtime)

pub mod client;
pub mod error;
pub mod realtime;
pub mod transport;
pub mod types;

pub use client::GeofenceClient;
pub use error::Error;
pub use realtime::{PushEvent, RealtimeHandle, ReconnectConfig};
pub use transport::TransportConfig;
