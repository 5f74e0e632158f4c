// ── Central reactive data store ──
//
// Owns the three synchronized collections. All mutation goes through
// the façade; UI consumers only ever see `Arc` snapshots.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use geofly_api::types::{Alert, Tourist, Zone};

use super::collection::EntityCollection;
use crate::stream::EntityStream;

/// Central reactive store for the synchronized read model.
///
/// Zones and tourists are ordered by id; alerts newest-first, so a
/// freshly raised alert always heads the snapshot.
pub struct SyncStore {
    pub(crate) zones: EntityCollection<Zone>,
    pub(crate) tourists: EntityCollection<Tourist>,
    pub(crate) alerts: EntityCollection<Alert>,
    pub(crate) last_refresh: watch::Sender<Option<DateTime<Utc>>>,
    pub(crate) last_push_event: watch::Sender<Option<DateTime<Utc>>>,
}

fn zone_order(a: &Zone, b: &Zone) -> Ordering {
    a.id.cmp(&b.id)
}

fn tourist_order(a: &Tourist, b: &Tourist) -> Ordering {
    a.id.cmp(&b.id)
}

fn alert_order(a: &Alert, b: &Alert) -> Ordering {
    b.timestamp
        .cmp(&a.timestamp)
        .then_with(|| b.id.cmp(&a.id))
}

impl SyncStore {
    pub fn new() -> Self {
        let (last_refresh, _) = watch::channel(None);
        let (last_push_event, _) = watch::channel(None);

        Self {
            zones: EntityCollection::new(zone_order),
            tourists: EntityCollection::new(tourist_order),
            alerts: EntityCollection::new(alert_order),
            last_refresh,
            last_push_event,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn zones_snapshot(&self) -> Arc<Vec<Arc<Zone>>> {
        self.zones.snapshot()
    }

    pub fn tourists_snapshot(&self) -> Arc<Vec<Arc<Tourist>>> {
        self.tourists.snapshot()
    }

    pub fn alerts_snapshot(&self) -> Arc<Vec<Arc<Alert>>> {
        self.alerts.snapshot()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn zone_by_id(&self, id: &str) -> Option<Arc<Zone>> {
        self.zones.get(id)
    }

    pub fn tourist_by_id(&self, id: &str) -> Option<Arc<Tourist>> {
        self.tourists.get(id)
    }

    pub fn alert_by_id(&self, id: &str) -> Option<Arc<Alert>> {
        self.alerts.get(id)
    }

    // ── Count accessors ──────────────────────────────────────────────

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    pub fn tourist_count(&self) -> usize {
        self.tourists.len()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_zones(&self) -> EntityStream<Zone> {
        EntityStream::new(self.zones.subscribe())
    }

    pub fn subscribe_tourists(&self) -> EntityStream<Tourist> {
        EntityStream::new(self.tourists.subscribe())
    }

    pub fn subscribe_alerts(&self) -> EntityStream<Alert> {
        EntityStream::new(self.alerts.subscribe())
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    pub fn last_push_event(&self) -> Option<DateTime<Utc>> {
        *self.last_push_event.borrow()
    }

    /// How long ago the last full refresh occurred, or `None` if never.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for SyncStore {
    fn default() -> Self {
        Self::new()
    }
}
