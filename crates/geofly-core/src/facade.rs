// ── Sync façade ──
//
// Single owner of the synchronized read model. Handles the initial
// load with per-collection fallback, periodic polling, realtime push
// application, and the optimistic mutation API consumed by UIs.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use geofly_api::types::{
    Alert, GeoPoint, Severity, Tourist, TouristStatus, Zone, ZoneDraft, ZoneUpdate,
};
use geofly_api::{GeofenceClient, PushEvent, RealtimeHandle, ReconnectConfig, TransportConfig};

use crate::config::FacadeConfig;
use crate::error::CoreError;
use crate::metrics::{self, DashboardMetrics};
use crate::mock::StaticDataset;
use crate::source::Source;
use crate::store::SyncStore;
use crate::stream::EntityStream;

/// Error message surfaced when every bulk read fails.
const OFFLINE_ERROR: &str = "API unavailable - using offline mode";

// ── SyncStatus ───────────────────────────────────────────────────────

/// Connection flags observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SyncStatus {
    /// At least one bulk read succeeded on the last refresh (or static
    /// mode is active).
    pub connected: bool,
    /// The initial load is in progress.
    pub loading: bool,
    /// Last recorded failure, if any.
    pub error: Option<String>,
}

// ── GeofenceFacade ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. Owns the store, the data source, and
/// the background tasks; UI consumers read snapshots and request
/// changes through the mutation methods -- they never touch the
/// collections directly.
#[derive(Clone)]
pub struct GeofenceFacade {
    inner: Arc<FacadeInner>,
}

struct FacadeInner {
    config: FacadeConfig,
    source: Source,
    store: Arc<SyncStore>,
    status: watch::Sender<SyncStatus>,
    cancel: CancellationToken,
    realtime: Mutex<Option<RealtimeHandle>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl GeofenceFacade {
    /// Create a façade from configuration. Does NOT load anything --
    /// call [`start()`](Self::start) to run the initial load and spawn
    /// the background tasks.
    pub fn new(config: FacadeConfig) -> Result<Self, CoreError> {
        let source = if config.use_static_data {
            Source::Static
        } else {
            let transport = TransportConfig {
                timeout: config.request_timeout,
                ..TransportConfig::default()
            };
            let client = GeofenceClient::with_transport(
                config.base_url.as_str(),
                config.api_key.clone(),
                &transport,
            )?;
            Source::Remote(client)
        };

        let (status, _) = watch::channel(SyncStatus::default());

        Ok(Self {
            inner: Arc::new(FacadeInner {
                config,
                source,
                store: Arc::new(SyncStore::new()),
                status,
                cancel: CancellationToken::new(),
                realtime: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Access the façade configuration.
    pub fn config(&self) -> &FacadeConfig {
        &self.inner.config
    }

    /// Access the underlying store.
    pub fn store(&self) -> &Arc<SyncStore> {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Run the initial load, then spawn the poll and realtime tasks.
    ///
    /// Never fails: bulk-read failures degrade to the static dataset
    /// and are reported through [`status`](Self::status) instead.
    pub async fn start(&self) {
        self.set_status(|s| {
            s.loading = true;
            s.error = None;
        });

        self.refresh().await;

        self.set_status(|s| s.loading = false);

        let mut handles = self.inner.task_handles.lock().await;

        if self.inner.config.polling {
            let facade = self.clone();
            let interval = self.inner.config.poll_interval;
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(poll_task(facade, interval, cancel)));
        }

        if self.inner.config.realtime && !self.inner.source.is_static() {
            match RealtimeHandle::connect(
                &self.inner.config.base_url,
                self.inner.config.api_key.clone(),
                ReconnectConfig::default(),
                self.inner.cancel.child_token(),
            ) {
                Ok(handle) => {
                    let rx = handle.subscribe();
                    *self.inner.realtime.lock().await = Some(handle);
                    let store = Arc::clone(&self.inner.store);
                    let cancel = self.inner.cancel.clone();
                    handles.push(tokio::spawn(push_task(store, rx, cancel)));
                }
                Err(e) => {
                    warn!(error = %e, "realtime updates unavailable, relying on polling");
                }
            }
        }

        info!("facade started");
    }

    /// Stop background tasks and close the push channel. No callbacks
    /// fire after this returns; in-flight HTTP calls are not aborted.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        if let Some(handle) = self.inner.realtime.lock().await.take() {
            handle.shutdown();
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        debug!("facade shut down");
    }

    /// One bulk-read round with per-collection fallback.
    ///
    /// Failures are compensated with static data and recorded in the
    /// status -- they are never returned to the caller.
    pub async fn refresh(&self) {
        let store = &self.inner.store;

        if self.inner.source.is_static() {
            store.load_static(&StaticDataset::load());
            self.set_status(|s| {
                s.connected = true;
                s.error = None;
            });
            debug!("loaded static dataset");
            return;
        }

        let baseline = store.begin_refresh();
        let (zones, tourists, alerts) = tokio::join!(
            self.inner.source.load_zones(),
            self.inner.source.load_tourists(),
            self.inner.source.load_alerts(),
        );

        let failed = [zones.is_err(), tourists.is_err(), alerts.is_err()]
            .into_iter()
            .filter(|f| *f)
            .count();

        // Total unavailability: serve the demo dataset and say so.
        if failed == 3 {
            warn!("all bulk reads failed, switching to offline mode");
            store.load_static(&StaticDataset::load());
            self.set_status(|s| {
                s.connected = false;
                s.error = Some(OFFLINE_ERROR.to_owned());
            });
            return;
        }

        match zones {
            Ok(zones) => store.apply_zones(zones, baseline.zones),
            Err(e) => {
                warn!(error = %e, "failed to load zones, backfilling from static data");
                store.backfill_zones(&StaticDataset::load());
            }
        }

        match tourists {
            Ok(tourists) => store.apply_tourists(tourists, baseline.tourists),
            Err(e) => {
                warn!(error = %e, "failed to load tourists, backfilling from static data");
                store.backfill_tourists(&StaticDataset::load());
            }
        }

        match alerts {
            Ok(alerts) => store.apply_alerts(alerts, baseline.alerts),
            Err(e) => {
                warn!(error = %e, "failed to load alerts, backfilling from static data");
                store.backfill_alerts(&StaticDataset::load());
            }
        }

        store.mark_refreshed();
        self.set_status(|s| {
            s.connected = true;
            s.error = None;
        });

        debug!(
            zones = store.zone_count(),
            tourists = store.tourist_count(),
            alerts = store.alert_count(),
            "refresh complete"
        );
    }

    // ── Zone mutations ───────────────────────────────────────────────

    pub async fn create_zone(&self, draft: ZoneDraft) -> Result<Zone, CoreError> {
        if draft.radius <= 0.0 {
            return Err(CoreError::Validation {
                message: format!("zone radius must be positive, got {}", draft.radius),
            });
        }

        match self.inner.source.create_zone(&draft).await {
            Ok(zone) => {
                self.inner.store.zones.upsert(zone.id.clone(), zone.clone());
                Ok(zone)
            }
            Err(e) => Err(self.record_error(e)),
        }
    }

    pub async fn update_zone(&self, zone_id: &str, updates: ZoneUpdate) -> Result<Zone, CoreError> {
        if let Some(radius) = updates.radius {
            if radius <= 0.0 {
                return Err(CoreError::Validation {
                    message: format!("zone radius must be positive, got {radius}"),
                });
            }
        }

        let existing = self.inner.store.zone_by_id(zone_id);
        match self
            .inner
            .source
            .update_zone(existing.as_deref(), zone_id, &updates)
            .await
        {
            Ok(Some(zone)) => {
                self.inner.store.zones.upsert(zone.id.clone(), zone.clone());
                Ok(zone)
            }
            Ok(None) => Err(CoreError::ZoneNotFound {
                id: zone_id.to_owned(),
            }),
            Err(e) => Err(self.record_error(e)),
        }
    }

    pub async fn delete_zone(&self, zone_id: &str) -> Result<(), CoreError> {
        match self.inner.source.delete_zone(zone_id).await {
            Ok(()) => {
                self.inner.store.zones.remove(zone_id);
                Ok(())
            }
            Err(e) => Err(self.record_error(e)),
        }
    }

    // ── Alert mutations ──────────────────────────────────────────────

    /// Mark an alert acknowledged in place. Idempotent: re-acknowledging
    /// leaves the flag set and creates no duplicate entry.
    pub async fn acknowledge_alert(&self, alert_id: &str) -> Result<(), CoreError> {
        let existing = self.inner.store.alert_by_id(alert_id);
        match self
            .inner
            .source
            .acknowledge_alert(existing.as_deref(), alert_id)
            .await
        {
            Ok(Some(alert)) => {
                self.inner.store.alerts.upsert(alert.id.clone(), alert);
                Ok(())
            }
            // Static mode with no such alert: nothing to acknowledge.
            Ok(None) => Ok(()),
            Err(e) => Err(self.record_error(e)),
        }
    }

    /// Resolve an alert, removing it from the active collection.
    pub async fn resolve_alert(
        &self,
        alert_id: &str,
        resolution: Option<&str>,
    ) -> Result<(), CoreError> {
        match self.inner.source.resolve_alert(alert_id, resolution).await {
            Ok(()) => {
                self.inner.store.alerts.remove(alert_id);
                Ok(())
            }
            Err(e) => Err(self.record_error(e)),
        }
    }

    // ── Tourist mutations ────────────────────────────────────────────

    pub async fn update_tourist_location(
        &self,
        tourist_id: &str,
        location: GeoPoint,
    ) -> Result<(), CoreError> {
        let existing = self.inner.store.tourist_by_id(tourist_id);
        match self
            .inner
            .source
            .update_tourist_location(existing.as_deref(), tourist_id, location)
            .await
        {
            Ok(Some(tourist)) => {
                self.inner
                    .store
                    .tourists
                    .upsert(tourist.id.clone(), tourist);
                Ok(())
            }
            Ok(None) => Err(CoreError::TouristNotFound {
                id: tourist_id.to_owned(),
            }),
            Err(e) => Err(self.record_error(e)),
        }
    }

    // ── Emergency ────────────────────────────────────────────────────

    /// Raise a critical emergency alert for a tourist.
    ///
    /// In static mode the alert is synthesized and prepended locally;
    /// against the remote, the service's own record arrives through the
    /// push channel or the next poll.
    pub async fn trigger_emergency_alert(
        &self,
        tourist_id: &str,
        location: GeoPoint,
        message: Option<&str>,
    ) -> Result<(), CoreError> {
        let tourist_name = self
            .inner
            .store
            .tourist_by_id(tourist_id)
            .map(|t| t.name.clone());

        match self
            .inner
            .source
            .trigger_emergency(tourist_name.as_deref(), tourist_id, location, message)
            .await
        {
            Ok(Some(alert)) => {
                self.inner.store.alerts.upsert(alert.id.clone(), alert);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => Err(self.record_error(e)),
        }
    }

    /// Broadcast a message to everyone in a zone.
    pub async fn broadcast_alert(
        &self,
        zone_id: &str,
        message: &str,
        severity: Severity,
    ) -> Result<(), CoreError> {
        self.inner
            .source
            .broadcast_alert(zone_id, message, severity)
            .await
            .map_err(|e| self.record_error(e))
    }

    // ── Status observation ───────────────────────────────────────────

    /// Subscribe to connection/loading/error changes.
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    /// Point-in-time copy of the current status.
    pub fn current_status(&self) -> SyncStatus {
        self.inner.status.borrow().clone()
    }

    /// Clear the recorded error, if any.
    pub fn clear_error(&self) {
        self.set_status(|s| s.error = None);
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn zones(&self) -> Arc<Vec<Arc<Zone>>> {
        self.inner.store.zones_snapshot()
    }

    pub fn tourists(&self) -> Arc<Vec<Arc<Tourist>>> {
        self.inner.store.tourists_snapshot()
    }

    pub fn alerts(&self) -> Arc<Vec<Arc<Alert>>> {
        self.inner.store.alerts_snapshot()
    }

    // ── Derived views ────────────────────────────────────────────────

    /// Alerts not yet acknowledged.
    pub fn active_alerts(&self) -> Vec<Arc<Alert>> {
        self.alerts()
            .iter()
            .filter(|a| !a.acknowledged)
            .cloned()
            .collect()
    }

    /// Alerts at `critical` severity.
    pub fn critical_alerts(&self) -> Vec<Arc<Alert>> {
        self.alerts()
            .iter()
            .filter(|a| a.severity == Severity::Critical)
            .cloned()
            .collect()
    }

    /// Tourists currently marked safe.
    pub fn safe_tourists(&self) -> Vec<Arc<Tourist>> {
        self.tourists()
            .iter()
            .filter(|t| t.status == TouristStatus::Safe)
            .cloned()
            .collect()
    }

    /// Zones with the active flag set.
    pub fn active_zones(&self) -> Vec<Arc<Zone>> {
        self.zones().iter().filter(|z| z.active).cloned().collect()
    }

    /// Locally computed dashboard summary.
    pub fn dashboard_metrics(&self) -> DashboardMetrics {
        metrics::compute(&self.zones(), &self.tourists(), &self.alerts(), Utc::now())
    }

    // ── Stream accessors ─────────────────────────────────────────────

    pub fn subscribe_zones(&self) -> EntityStream<Zone> {
        self.inner.store.subscribe_zones()
    }

    pub fn subscribe_tourists(&self) -> EntityStream<Tourist> {
        self.inner.store.subscribe_tourists()
    }

    pub fn subscribe_alerts(&self) -> EntityStream<Alert> {
        self.inner.store.subscribe_alerts()
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn set_status(&self, f: impl FnOnce(&mut SyncStatus)) {
        self.inner.status.send_modify(f);
    }

    /// Record a mutation failure in the status, then hand it back to
    /// the caller.
    fn record_error(&self, err: geofly_api::Error) -> CoreError {
        let core: CoreError = err.into();
        self.set_status(|s| s.error = Some(core.to_string()));
        core
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Re-run the bulk read on a fixed interval until cancelled.
async fn poll_task(
    facade: GeofenceFacade,
    interval: std::time::Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                facade.refresh().await;
            }
        }
    }
}

/// Apply realtime events to the store until cancelled or closed.
async fn push_task(
    store: Arc<SyncStore>,
    mut rx: broadcast::Receiver<PushEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = rx.recv() => {
                match event {
                    Ok(event) => store.apply_push(event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "push consumer lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}
