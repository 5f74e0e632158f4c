// ── Data source selection ──
//
// The façade reads and writes through exactly one of two sources,
// chosen at startup: the remote service, or the built-in static
// dataset. The static source synthesizes ids and timestamps locally
// and never fails, which is what makes offline/demo mode total.

use chrono::Utc;
use uuid::Uuid;

use geofly_api::types::{
    Alert, AlertKind, AlertQuery, GeoPoint, Severity, Tourist, Zone, ZoneCategory, ZoneDraft,
    ZoneMetadata, ZoneUpdate,
};
use geofly_api::{Error as ApiError, GeofenceClient};

use crate::mock::StaticDataset;

/// Limit applied to the alert bulk read, matching the dashboard's needs.
const ALERT_FETCH_LIMIT: u32 = 50;

/// Where the façade's data comes from.
pub(crate) enum Source {
    /// Authenticated calls against the remote service.
    Remote(GeofenceClient),
    /// The built-in demo dataset; all operations are local and infallible.
    Static,
}

impl Source {
    pub(crate) fn is_static(&self) -> bool {
        matches!(self, Self::Static)
    }

    // ── Bulk reads ───────────────────────────────────────────────────

    pub(crate) async fn load_zones(&self) -> Result<Vec<Zone>, ApiError> {
        match self {
            Self::Remote(client) => client.list_zones().await,
            Self::Static => Ok(StaticDataset::load().zones),
        }
    }

    pub(crate) async fn load_tourists(&self) -> Result<Vec<Tourist>, ApiError> {
        match self {
            Self::Remote(client) => client.list_tourists().await,
            Self::Static => Ok(StaticDataset::load().tourists),
        }
    }

    pub(crate) async fn load_alerts(&self) -> Result<Vec<Alert>, ApiError> {
        match self {
            Self::Remote(client) => {
                let query = AlertQuery {
                    limit: Some(ALERT_FETCH_LIMIT),
                    acknowledged: Some(false),
                    ..AlertQuery::default()
                };
                client.list_alerts(&query).await
            }
            Self::Static => Ok(StaticDataset::load().alerts),
        }
    }

    // ── Zone mutations ───────────────────────────────────────────────

    pub(crate) async fn create_zone(&self, draft: &ZoneDraft) -> Result<Zone, ApiError> {
        match self {
            Self::Remote(client) => client.create_zone(draft).await,
            Self::Static => {
                let now = Utc::now();
                Ok(Zone {
                    id: format!("zone-{}", Uuid::new_v4()),
                    name: draft.name.clone(),
                    category: draft.category,
                    coordinates: draft.coordinates,
                    radius: draft.radius,
                    active: draft.active,
                    created_at: now,
                    updated_at: now,
                    description: draft.description.clone(),
                    alerts_enabled: draft.alerts_enabled,
                    metadata: Some(ZoneMetadata {
                        tourists: 0,
                        alerts: 0,
                        safety_level: 100,
                    }),
                })
            }
        }
    }

    /// Returns the confirmed zone, or `None` when the static source has
    /// no zone with that id (a local no-op).
    pub(crate) async fn update_zone(
        &self,
        existing: Option<&Zone>,
        zone_id: &str,
        updates: &ZoneUpdate,
    ) -> Result<Option<Zone>, ApiError> {
        match self {
            Self::Remote(client) => client.update_zone(zone_id, updates).await.map(Some),
            Self::Static => Ok(existing.map(|zone| {
                let mut updated = zone.clone();
                updates.apply_to(&mut updated, Utc::now());
                updated
            })),
        }
    }

    pub(crate) async fn delete_zone(&self, zone_id: &str) -> Result<(), ApiError> {
        match self {
            Self::Remote(client) => client.delete_zone(zone_id).await,
            Self::Static => Ok(()),
        }
    }

    // ── Alert mutations ──────────────────────────────────────────────

    /// Returns the acknowledged alert, or `None` when the static source
    /// has no alert with that id.
    pub(crate) async fn acknowledge_alert(
        &self,
        existing: Option<&Alert>,
        alert_id: &str,
    ) -> Result<Option<Alert>, ApiError> {
        match self {
            Self::Remote(client) => client.acknowledge_alert(alert_id).await.map(Some),
            Self::Static => Ok(existing.map(|alert| {
                let mut acked = alert.clone();
                acked.acknowledged = true;
                acked
            })),
        }
    }

    pub(crate) async fn resolve_alert(
        &self,
        alert_id: &str,
        resolution: Option<&str>,
    ) -> Result<(), ApiError> {
        match self {
            Self::Remote(client) => client.resolve_alert(alert_id, resolution).await.map(|_| ()),
            Self::Static => Ok(()),
        }
    }

    // ── Tourist mutations ────────────────────────────────────────────

    /// Returns the updated tourist, or `None` when the static source has
    /// no tourist with that id.
    pub(crate) async fn update_tourist_location(
        &self,
        existing: Option<&Tourist>,
        tourist_id: &str,
        location: GeoPoint,
    ) -> Result<Option<Tourist>, ApiError> {
        match self {
            Self::Remote(client) => client
                .update_tourist_location(tourist_id, location)
                .await
                .map(Some),
            Self::Static => Ok(existing.map(|tourist| {
                let mut moved = tourist.clone();
                moved.location = location;
                moved.last_seen = Utc::now();
                moved
            })),
        }
    }

    // ── Emergency ────────────────────────────────────────────────────

    /// Remote: fire the endpoint and let push/poll deliver the server's
    /// record (`None`). Static: synthesize the critical alert to prepend.
    pub(crate) async fn trigger_emergency(
        &self,
        tourist_name: Option<&str>,
        tourist_id: &str,
        location: GeoPoint,
        message: Option<&str>,
    ) -> Result<Option<Alert>, ApiError> {
        match self {
            Self::Remote(client) => {
                client
                    .trigger_emergency_alert(tourist_id, location, message)
                    .await?;
                Ok(None)
            }
            Self::Static => Ok(Some(Alert {
                id: format!("alert-{}", Uuid::new_v4()),
                tourist_id: tourist_id.to_owned(),
                tourist_name: tourist_name.unwrap_or("Unknown Tourist").to_owned(),
                zone_id: "emergency".to_owned(),
                zone_name: "Emergency Alert".to_owned(),
                zone_category: ZoneCategory::Emergency,
                kind: AlertKind::Violation,
                location,
                timestamp: Utc::now(),
                severity: Severity::Critical,
                message: message
                    .unwrap_or("Emergency alert triggered by tourist")
                    .to_owned(),
                acknowledged: false,
                resolved_at: None,
            })),
        }
    }

    pub(crate) async fn broadcast_alert(
        &self,
        zone_id: &str,
        message: &str,
        severity: Severity,
    ) -> Result<(), ApiError> {
        match self {
            Self::Remote(client) => client.broadcast_alert(zone_id, message, severity).await,
            Self::Static => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_loads_serve_the_demo_dataset() {
        let source = Source::Static;
        assert_eq!(source.load_zones().await.unwrap().len(), 4);
        assert_eq!(source.load_tourists().await.unwrap().len(), 2);
        assert!(source.load_alerts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn static_create_zone_synthesizes_id_and_metadata() {
        let source = Source::Static;
        let draft = ZoneDraft {
            name: "Test".to_owned(),
            category: ZoneCategory::Safe,
            coordinates: GeoPoint::new(1.0, 2.0),
            radius: 100.0,
            active: true,
            description: None,
            alerts_enabled: true,
        };

        let zone = source.create_zone(&draft).await.unwrap();
        assert!(zone.id.starts_with("zone-"));
        assert_eq!(zone.metadata.unwrap().safety_level, 100);
    }

    #[tokio::test]
    async fn static_emergency_is_critical_in_the_emergency_zone() {
        let source = Source::Static;
        let alert = source
            .trigger_emergency(Some("Rahul Sharma"), "tourist-001", GeoPoint::new(1.0, 2.0), None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.zone_category, ZoneCategory::Emergency);
        assert_eq!(alert.tourist_name, "Rahul Sharma");
        assert!(!alert.acknowledged);
    }

    #[tokio::test]
    async fn static_update_unknown_zone_is_a_no_op() {
        let source = Source::Static;
        let result = source
            .update_zone(None, "ghost", &ZoneUpdate::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
