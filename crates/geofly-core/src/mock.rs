// ── Built-in demo dataset ──
//
// The fixed fallback data served whenever the remote is disabled or
// fully unreachable. The UI contract is "never show an empty screen":
// zones and tourists are always non-empty, the alert list starts empty.
//
// Timestamps are stamped at load time so freshness-based logic (the
// five-minute "active tourist" window) sees live-looking data.

use chrono::{Duration, Utc};

use geofly_api::types::{
    Alert, EmergencyContact, GeoPoint, Tourist, TouristStatus, Zone, ZoneCategory, ZoneMetadata,
};

/// The static fallback dataset.
#[derive(Debug, Clone)]
pub struct StaticDataset {
    pub zones: Vec<Zone>,
    pub tourists: Vec<Tourist>,
    pub alerts: Vec<Alert>,
}

impl StaticDataset {
    /// Build the demo dataset with timestamps relative to now.
    pub fn load() -> Self {
        let now = Utc::now();

        let zones = vec![
            Zone {
                id: "zone-001".to_owned(),
                name: "KIET Main Campus Safe Zone".to_owned(),
                category: ZoneCategory::Safe,
                coordinates: GeoPoint::new(28.7041, 77.4025),
                radius: 500.0,
                active: true,
                created_at: now,
                updated_at: now,
                description: Some(
                    "Main campus area with high security presence and CCTV coverage".to_owned(),
                ),
                alerts_enabled: true,
                metadata: Some(ZoneMetadata {
                    tourists: 45,
                    alerts: 0,
                    safety_level: 95,
                }),
            },
            Zone {
                id: "zone-002".to_owned(),
                name: "Shipra Mall Commercial Area".to_owned(),
                category: ZoneCategory::Caution,
                coordinates: GeoPoint::new(28.7156, 77.4089),
                radius: 300.0,
                active: true,
                created_at: now,
                updated_at: now,
                description: Some(
                    "Busy commercial area, exercise caution during peak hours".to_owned(),
                ),
                alerts_enabled: true,
                metadata: Some(ZoneMetadata {
                    tourists: 23,
                    alerts: 2,
                    safety_level: 75,
                }),
            },
            Zone {
                id: "zone-003".to_owned(),
                name: "Industrial Area - Restricted".to_owned(),
                category: ZoneCategory::Restricted,
                coordinates: GeoPoint::new(28.6987, 77.3876),
                radius: 800.0,
                active: true,
                created_at: now,
                updated_at: now,
                description: Some("Industrial zone with restricted access for tourists".to_owned()),
                alerts_enabled: true,
                metadata: Some(ZoneMetadata {
                    tourists: 0,
                    alerts: 0,
                    safety_level: 30,
                }),
            },
            Zone {
                id: "zone-004".to_owned(),
                name: "Ghaziabad Railway Station".to_owned(),
                category: ZoneCategory::Caution,
                coordinates: GeoPoint::new(28.6692, 77.4538),
                radius: 400.0,
                active: true,
                created_at: now,
                updated_at: now,
                description: Some(
                    "High traffic area with moderate security, stay alert".to_owned(),
                ),
                alerts_enabled: true,
                metadata: Some(ZoneMetadata {
                    tourists: 12,
                    alerts: 1,
                    safety_level: 70,
                }),
            },
        ];

        let tourists = vec![
            Tourist {
                id: "tourist-001".to_owned(),
                name: "Rahul Sharma".to_owned(),
                digital_id: "TR-KIET001".to_owned(),
                location: GeoPoint::new(28.7041, 77.4025),
                safety_score: 85,
                status: TouristStatus::Safe,
                last_seen: now,
                device_id: "device-001".to_owned(),
                emergency_contacts: vec![EmergencyContact {
                    name: "Priya Sharma".to_owned(),
                    phone: "+91-9876543210".to_owned(),
                    relation: "Spouse".to_owned(),
                }],
            },
            Tourist {
                id: "tourist-002".to_owned(),
                name: "Amit Kumar".to_owned(),
                digital_id: "TR-KIET002".to_owned(),
                location: GeoPoint::new(28.7156, 77.4089),
                safety_score: 75,
                status: TouristStatus::Caution,
                last_seen: now - Duration::minutes(2),
                device_id: "device-002".to_owned(),
                emergency_contacts: vec![EmergencyContact {
                    name: "Sunita Kumar".to_owned(),
                    phone: "+91-9876543211".to_owned(),
                    relation: "Mother".to_owned(),
                }],
            },
        ];

        Self {
            zones,
            tourists,
            alerts: Vec::new(),
        }
    }
}
