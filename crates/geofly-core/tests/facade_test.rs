// End-to-end tests for `GeofenceFacade`: startup fallback policy,
// static-mode mutations, and remote mutation error propagation.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use geofly_core::{
    AlertKind, CoreError, FacadeConfig, GeoPoint, GeofenceFacade, Severity, ZoneCategory,
    ZoneDraft, ZoneUpdate,
};

// ── Config helpers ──────────────────────────────────────────────────

fn base_config(url: &str) -> FacadeConfig {
    FacadeConfig {
        base_url: Url::parse(url).expect("test url"),
        api_key: SecretString::from("test-key".to_owned()),
        use_static_data: false,
        realtime: false,
        polling: false,
        poll_interval: Duration::from_secs(30),
        request_timeout: Duration::from_secs(2),
    }
}

fn static_config() -> FacadeConfig {
    FacadeConfig {
        use_static_data: true,
        ..base_config("http://127.0.0.1:9")
    }
}

async fn started(config: FacadeConfig) -> GeofenceFacade {
    let facade = GeofenceFacade::new(config).expect("facade should build");
    facade.start().await;
    facade
}

fn envelope(data: serde_json::Value) -> serde_json::Value {
    json!({ "success": true, "data": data, "timestamp": "2026-08-01T12:00:00Z" })
}

fn remote_zone_json() -> serde_json::Value {
    json!([{
        "id": "remote-zone-1",
        "name": "Remote Zone",
        "type": "safe",
        "coordinates": { "lat": 10.0, "lng": 20.0 },
        "radius": 150.0,
        "active": true,
        "createdAt": "2026-08-01T09:00:00Z",
        "updatedAt": "2026-08-01T09:00:00Z",
        "alertsEnabled": true
    }])
}

fn remote_tourists_json() -> serde_json::Value {
    json!([{
        "id": "remote-tourist-1",
        "name": "Remote Tourist",
        "digitalId": "TR-R1",
        "location": { "lat": 10.0, "lng": 20.0 },
        "safetyScore": 90,
        "status": "safe",
        "lastSeen": "2026-08-01T09:00:00Z",
        "deviceId": "dev-r1",
        "emergencyContacts": []
    }])
}

// ── Startup fallback policy ─────────────────────────────────────────

#[tokio::test]
async fn all_reads_failing_switches_to_offline_mode() {
    // Nothing listens on port 9: every bulk read gets a connect error.
    let facade = started(base_config("http://127.0.0.1:9")).await;

    let status = facade.current_status();
    assert!(!status.connected);
    assert!(!status.loading);
    let error = status.error.expect("offline error should be recorded");
    assert!(error.starts_with("API unavailable"), "got: {error}");

    // All three collections equal the static fallback dataset.
    assert_eq!(facade.zones().len(), 4);
    assert_eq!(facade.tourists().len(), 2);
    assert!(facade.alerts().is_empty());

    facade.shutdown().await;
}

#[tokio::test]
async fn single_failed_read_backfills_only_that_collection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(remote_zone_json())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tourists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(remote_tourists_json())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/alerts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let facade = started(base_config(&server.uri())).await;

    let status = facade.current_status();
    assert!(status.connected);
    assert!(status.error.is_none());

    // Zones and tourists hold remote data; alerts fell back to the
    // static dataset's empty list.
    assert_eq!(facade.zones().len(), 1);
    assert_eq!(facade.zones()[0].id, "remote-zone-1");
    assert_eq!(facade.tourists().len(), 1);
    assert!(facade.alerts().is_empty());

    facade.shutdown().await;
}

#[tokio::test]
async fn static_mode_populates_without_network() {
    let facade = started(static_config()).await;

    let status = facade.current_status();
    assert!(status.connected);
    assert!(status.error.is_none());
    assert_eq!(facade.zones().len(), 4);
    assert_eq!(facade.tourists().len(), 2);

    facade.shutdown().await;
}

// ── Static-mode mutations ───────────────────────────────────────────

#[tokio::test]
async fn static_zone_lifecycle_is_synchronous() {
    let facade = started(static_config()).await;
    let before = facade.zones().len();

    let draft = ZoneDraft {
        name: "Pop-up Event Area".to_owned(),
        category: ZoneCategory::Caution,
        coordinates: GeoPoint::new(28.70, 77.40),
        radius: 120.0,
        active: true,
        description: None,
        alerts_enabled: true,
    };

    let zone = facade.create_zone(draft).await.expect("create should succeed");
    assert_eq!(facade.zones().len(), before + 1);

    let updated = facade
        .update_zone(&zone.id, ZoneUpdate {
            name: Some("Renamed Area".to_owned()),
            ..ZoneUpdate::default()
        })
        .await
        .expect("update should succeed");
    assert_eq!(updated.name, "Renamed Area");
    assert_eq!(
        facade.store().zone_by_id(&zone.id).expect("zone present").name,
        "Renamed Area"
    );

    facade.delete_zone(&zone.id).await.expect("delete should succeed");
    assert_eq!(facade.zones().len(), before);
    assert!(facade.store().zone_by_id(&zone.id).is_none());

    facade.shutdown().await;
}

#[tokio::test]
async fn create_zone_rejects_non_positive_radius() {
    let facade = started(static_config()).await;

    let draft = ZoneDraft {
        name: "Bad Zone".to_owned(),
        category: ZoneCategory::Safe,
        coordinates: GeoPoint::new(0.0, 0.0),
        radius: 0.0,
        active: true,
        description: None,
        alerts_enabled: true,
    };

    let result = facade.create_zone(draft).await;
    assert!(matches!(result, Err(CoreError::Validation { .. })));
    assert_eq!(facade.zones().len(), 4);

    facade.shutdown().await;
}

#[tokio::test]
async fn emergency_alert_is_synthesized_and_prepended() {
    let facade = started(static_config()).await;

    facade
        .trigger_emergency_alert("tourist-001", GeoPoint::new(28.70, 77.40), None)
        .await
        .expect("emergency should succeed");

    let alerts = facade.alerts();
    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.severity, Severity::Critical);
    assert_eq!(alert.zone_category, ZoneCategory::Emergency);
    assert_eq!(alert.kind, AlertKind::Violation);
    assert_eq!(alert.tourist_name, "Rahul Sharma");
    assert_eq!(facade.active_alerts().len(), 1);
    assert_eq!(facade.critical_alerts().len(), 1);

    facade.shutdown().await;
}

#[tokio::test]
async fn acknowledge_is_idempotent() {
    let facade = started(static_config()).await;

    facade
        .trigger_emergency_alert("tourist-001", GeoPoint::new(28.70, 77.40), None)
        .await
        .expect("emergency should succeed");
    let alert_id = facade.alerts()[0].id.clone();

    facade
        .acknowledge_alert(&alert_id)
        .await
        .expect("first acknowledge should succeed");
    facade
        .acknowledge_alert(&alert_id)
        .await
        .expect("second acknowledge should succeed");

    let alerts = facade.alerts();
    assert_eq!(alerts.len(), 1, "no duplicate entries");
    assert!(alerts[0].acknowledged);
    assert!(facade.active_alerts().is_empty());

    facade.shutdown().await;
}

#[tokio::test]
async fn resolve_removes_exactly_one_alert() {
    let facade = started(static_config()).await;

    facade
        .trigger_emergency_alert("tourist-001", GeoPoint::new(28.70, 77.40), Some("first"))
        .await
        .expect("emergency should succeed");
    facade
        .trigger_emergency_alert("tourist-002", GeoPoint::new(28.71, 77.41), Some("second"))
        .await
        .expect("emergency should succeed");

    let alerts = facade.alerts();
    assert_eq!(alerts.len(), 2);
    let victim = alerts[0].id.clone();
    let survivor = alerts[1].id.clone();

    facade
        .resolve_alert(&victim, None)
        .await
        .expect("resolve should succeed");

    let remaining = facade.alerts();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, survivor);

    facade.shutdown().await;
}

#[tokio::test]
async fn tourist_location_update_patches_location_and_last_seen() {
    let facade = started(static_config()).await;

    let before = facade
        .store()
        .tourist_by_id("tourist-002")
        .expect("tourist present");

    facade
        .update_tourist_location("tourist-002", GeoPoint::new(1.5, 2.5))
        .await
        .expect("location update should succeed");

    let after = facade
        .store()
        .tourist_by_id("tourist-002")
        .expect("tourist present");
    assert_eq!(after.location, GeoPoint::new(1.5, 2.5));
    assert!(after.last_seen > before.last_seen);

    facade.shutdown().await;
}

#[tokio::test]
async fn unknown_tourist_location_update_errors() {
    let facade = started(static_config()).await;

    let result = facade
        .update_tourist_location("ghost", GeoPoint::new(0.0, 0.0))
        .await;
    assert!(matches!(result, Err(CoreError::TouristNotFound { .. })));

    facade.shutdown().await;
}

// ── Dashboard metrics ───────────────────────────────────────────────

#[tokio::test]
async fn metrics_over_static_dataset() {
    let facade = started(static_config()).await;

    let metrics = facade.dashboard_metrics();
    assert_eq!(metrics.total_tourists, 2);
    // Both demo tourists were seen within the five-minute window.
    assert_eq!(metrics.active_tourists, 2);
    assert_eq!(metrics.total_zones, 4);
    assert_eq!(metrics.active_alerts, 0);
    assert_eq!(metrics.violations, 0);
    // Mean of 85 and 75.
    assert_eq!(metrics.average_safety_score, 80);

    facade.shutdown().await;
}

// ── Remote mutation failures ────────────────────────────────────────

#[tokio::test]
async fn remote_mutation_failure_propagates_and_records_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(remote_zone_json())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tourists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(remote_tourists_json())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/zones"))
        .respond_with(ResponseTemplate::new(422).set_body_string("radius out of range"))
        .mount(&server)
        .await;

    let facade = started(base_config(&server.uri())).await;
    assert!(facade.current_status().connected);
    let zones_before = facade.zones().len();

    let draft = ZoneDraft {
        name: "Doomed".to_owned(),
        category: ZoneCategory::Safe,
        coordinates: GeoPoint::new(0.0, 0.0),
        radius: 10.0,
        active: true,
        description: None,
        alerts_enabled: true,
    };

    let result = facade.create_zone(draft).await;
    match result {
        Err(CoreError::Rejected { status, .. }) => assert_eq!(status, Some(422)),
        other => panic!("expected Rejected, got: {other:?}"),
    }

    // Collection untouched, failure recorded for the UI.
    assert_eq!(facade.zones().len(), zones_before);
    assert!(facade.current_status().error.is_some());

    facade.shutdown().await;
}
