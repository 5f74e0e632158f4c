// Wire types for the geofence service REST + realtime API.
//
// Field names follow the remote's camelCase JSON. These double as the
// client-side read model: the service owns the schema, we mirror it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Response envelope ────────────────────────────────────────────────

/// JSON envelope wrapping every REST response.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// ── Geography ────────────────────────────────────────────────────────

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

// ── Protocol enums ───────────────────────────────────────────────────

/// Safety classification of a zone.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ZoneCategory {
    Safe,
    Caution,
    Restricted,
    Emergency,
}

/// What kind of zone event an alert records.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertKind {
    Entry,
    Exit,
    Violation,
    Proximity,
}

/// Alert severity, ordered `Low < Medium < High < Critical`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Tourist safety status derived from recent activity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TouristStatus {
    Safe,
    Caution,
    Danger,
    Emergency,
}

// ── Zones ────────────────────────────────────────────────────────────

/// Aggregate summary the service attaches to a zone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneMetadata {
    pub tourists: u32,
    pub alerts: u32,
    pub safety_level: u8,
}

/// A named geographic region with a safety category and radius.
///
/// Invariant: `radius` is meters and must be positive; the service
/// rejects zero-radius zones and so does the local validation in
/// `geofly-core`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category: ZoneCategory,
    pub coordinates: GeoPoint,
    pub radius: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    pub alerts_enabled: bool,
    #[serde(default)]
    pub metadata: Option<ZoneMetadata>,
}

/// Zone creation payload: everything the server does not assign.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub category: ZoneCategory,
    pub coordinates: GeoPoint,
    pub radius: f64,
    pub active: bool,
    #[serde(default)]
    pub description: Option<String>,
    pub alerts_enabled: bool,
}

/// Partial zone update. Absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<ZoneCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts_enabled: Option<bool>,
}

impl ZoneUpdate {
    /// Apply this partial update to an existing zone, bumping `updated_at`.
    pub fn apply_to(&self, zone: &mut Zone, now: DateTime<Utc>) {
        if let Some(ref name) = self.name {
            zone.name = name.clone();
        }
        if let Some(category) = self.category {
            zone.category = category;
        }
        if let Some(coordinates) = self.coordinates {
            zone.coordinates = coordinates;
        }
        if let Some(radius) = self.radius {
            zone.radius = radius;
        }
        if let Some(active) = self.active {
            zone.active = active;
        }
        if let Some(ref description) = self.description {
            zone.description = Some(description.clone());
        }
        if let Some(alerts_enabled) = self.alerts_enabled {
            zone.alerts_enabled = alerts_enabled;
        }
        zone.updated_at = now;
    }
}

// ── Tourists ─────────────────────────────────────────────────────────

/// Someone a tourist has asked to be contacted in an emergency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relation: String,
}

/// A tracked tourist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tourist {
    pub id: String,
    pub name: String,
    pub digital_id: String,
    pub location: GeoPoint,
    pub safety_score: u8,
    pub status: TouristStatus,
    pub last_seen: DateTime<Utc>,
    pub device_id: String,
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
}

/// Registration payload: everything the server does not assign.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouristRegistration {
    pub name: String,
    pub digital_id: String,
    pub location: GeoPoint,
    pub safety_score: u8,
    pub status: TouristStatus,
    pub device_id: String,
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
}

// ── Alerts ───────────────────────────────────────────────────────────

/// A record of a zone-related safety event tied to a tourist.
///
/// The referenced zone/tourist ids are taken on trust from the service;
/// alerts naming unknown entities are still kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub tourist_id: String,
    pub tourist_name: String,
    pub zone_id: String,
    pub zone_name: String,
    #[serde(rename = "zoneType")]
    pub zone_category: ZoneCategory,
    #[serde(rename = "alertType")]
    pub kind: AlertKind,
    pub location: GeoPoint,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    pub acknowledged: bool,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Server-side filter for the alert list endpoint.
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
    pub limit: Option<u32>,
    pub acknowledged: Option<bool>,
    pub severity: Option<Severity>,
    pub zone_id: Option<String>,
}

impl AlertQuery {
    /// Render as query-string pairs, omitting unset filters.
    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(acknowledged) = self.acknowledged {
            params.push(("acknowledged", acknowledged.to_string()));
        }
        if let Some(severity) = self.severity {
            params.push(("severity", severity.to_string()));
        }
        if let Some(ref zone_id) = self.zone_id {
            params.push(("zoneId", zone_id.clone()));
        }
        params
    }
}

// ── Monitoring ───────────────────────────────────────────────────────

/// One zone boundary crossed or approached in a violation check.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub zone_id: String,
    pub zone_name: String,
    #[serde(rename = "zoneType")]
    pub zone_category: ZoneCategory,
    pub violation_type: AlertKind,
    pub severity: Severity,
    pub distance: f64,
}

/// A zone near the checked location, with the distance to its boundary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyZone {
    pub zone_id: String,
    pub zone_name: String,
    #[serde(rename = "zoneType")]
    pub zone_category: ZoneCategory,
    pub distance: f64,
}

/// Result of a point-in-zone check for one tourist location.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationCheck {
    #[serde(default)]
    pub violations: Vec<Violation>,
    #[serde(default)]
    pub nearby_zones: Vec<NearbyZone>,
}

// ── Analytics ────────────────────────────────────────────────────────

/// Inclusive time range for analytics queries.
#[derive(Debug, Clone, Copy)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PeakHour {
    pub hour: u8,
    pub count: u32,
}

/// Per-zone analytics summary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStatistics {
    pub total_visitors: u64,
    pub average_stay_duration: f64,
    pub alerts_count: u64,
    pub safety_score: f64,
    #[serde(default)]
    pub peak_hours: Vec<PeakHour>,
    #[serde(default)]
    pub violation_types: std::collections::HashMap<String, u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneMetricsEntry {
    pub zone_id: String,
    pub zone_name: String,
    pub tourist_count: u32,
    pub alert_count: u32,
    pub safety_level: u8,
}

/// Server-computed dashboard aggregate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub total_tourists: u64,
    pub active_tourists: u64,
    pub total_zones: u64,
    pub active_alerts: u64,
    pub safety_score: f64,
    #[serde(default)]
    pub recent_alerts: Vec<Alert>,
    #[serde(default)]
    pub zone_metrics: Vec<ZoneMetricsEntry>,
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zone_round_trips_camel_case() {
        let json = r#"{
            "id": "zone-001",
            "name": "Harbour Promenade",
            "type": "caution",
            "coordinates": { "lat": 28.7041, "lng": 77.4025 },
            "radius": 300.0,
            "active": true,
            "createdAt": "2026-08-01T09:00:00Z",
            "updatedAt": "2026-08-01T09:00:00Z",
            "description": "Busy at night",
            "alertsEnabled": true,
            "metadata": { "tourists": 12, "alerts": 1, "safetyLevel": 70 }
        }"#;

        let zone: Zone = serde_json::from_str(json).unwrap();
        assert_eq!(zone.category, ZoneCategory::Caution);
        assert_eq!(zone.metadata.unwrap().safety_level, 70);

        let back = serde_json::to_value(&zone).unwrap();
        assert_eq!(back["type"], "caution");
        assert_eq!(back["alertsEnabled"], true);
    }

    #[test]
    fn alert_field_renames() {
        let json = r#"{
            "id": "alert-1",
            "touristId": "tourist-001",
            "touristName": "Rahul Sharma",
            "zoneId": "zone-003",
            "zoneName": "Industrial Area",
            "zoneType": "restricted",
            "alertType": "entry",
            "location": { "lat": 28.69, "lng": 77.38 },
            "timestamp": "2026-08-01T10:30:00Z",
            "severity": "high",
            "message": "Entered restricted zone",
            "acknowledged": false
        }"#;

        let alert: Alert = serde_json::from_str(json).unwrap();
        assert_eq!(alert.kind, AlertKind::Entry);
        assert_eq!(alert.zone_category, ZoneCategory::Restricted);
        assert!(alert.resolved_at.is_none());
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Low < Severity::Medium);
    }

    #[test]
    fn alert_query_omits_unset_filters() {
        let params = AlertQuery::default().to_params();
        assert!(params.is_empty());

        let query = AlertQuery {
            limit: Some(50),
            acknowledged: Some(false),
            severity: Some(Severity::Critical),
            zone_id: None,
        };
        let params = query.to_params();
        assert_eq!(
            params,
            vec![
                ("limit", "50".to_owned()),
                ("acknowledged", "false".to_owned()),
                ("severity", "critical".to_owned()),
            ]
        );
    }

    #[test]
    fn zone_update_applies_partially() {
        let json = r#"{
            "id": "zone-001",
            "name": "Old name",
            "type": "safe",
            "coordinates": { "lat": 1.0, "lng": 2.0 },
            "radius": 100.0,
            "active": true,
            "createdAt": "2026-08-01T09:00:00Z",
            "updatedAt": "2026-08-01T09:00:00Z",
            "alertsEnabled": true
        }"#;
        let mut zone: Zone = serde_json::from_str(json).unwrap();

        let update = ZoneUpdate {
            name: Some("New name".into()),
            active: Some(false),
            ..ZoneUpdate::default()
        };
        let now = Utc::now();
        update.apply_to(&mut zone, now);

        assert_eq!(zone.name, "New name");
        assert!(!zone.active);
        assert_eq!(zone.radius, 100.0);
        assert_eq!(zone.updated_at, now);
    }

    #[test]
    fn envelope_with_missing_data() {
        let json = r#"{ "success": false, "error": "zone not found", "timestamp": "now" }"#;
        let envelope: Envelope<Zone> = serde_json::from_str(json).unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.error.as_deref(), Some("zone not found"));
    }
}
