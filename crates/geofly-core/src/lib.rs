// geofly-core: Synchronized read model between geofly-api and UI consumers.

pub mod config;
pub mod error;
pub mod facade;
pub mod metrics;
pub mod mock;
pub mod store;
pub mod stream;

mod source;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::FacadeConfig;
pub use error::CoreError;
pub use facade::{GeofenceFacade, SyncStatus};
pub use metrics::DashboardMetrics;
pub use mock::StaticDataset;
pub use store::SyncStore;
pub use stream::EntityStream;

// Re-export the wire model at the crate root for ergonomics.
pub use geofly_api::types::{
    Alert, AlertKind, AlertQuery, EmergencyContact, GeoPoint, Severity, Tourist,
    TouristRegistration, TouristStatus, Zone, ZoneCategory, ZoneDraft, ZoneMetadata, ZoneUpdate,
};
