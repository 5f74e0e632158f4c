// ── Bulk refresh and push application ──
//
// Applies poll results and realtime events to the SyncStore. The
// per-collection fallback policy (which collections get static data)
// is decided by the façade; this module only knows how to apply.

use chrono::Utc;

use geofly_api::PushEvent;
use geofly_api::types::{Alert, Tourist, Zone};

use super::SyncStore;
use crate::mock::StaticDataset;

/// Per-collection revision counters recorded when a poll is issued.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RefreshBaseline {
    pub zones: u64,
    pub tourists: u64,
    pub alerts: u64,
}

impl SyncStore {
    /// Record the revision counters before issuing the bulk reads.
    pub(crate) fn begin_refresh(&self) -> RefreshBaseline {
        RefreshBaseline {
            zones: self.zones.baseline(),
            tourists: self.tourists.baseline(),
            alerts: self.alerts.baseline(),
        }
    }

    // ── Poll results ─────────────────────────────────────────────────

    pub(crate) fn apply_zones(&self, zones: Vec<Zone>, baseline: u64) {
        self.zones
            .apply_refresh(zones.into_iter().map(|z| (z.id.clone(), z)), baseline);
    }

    pub(crate) fn apply_tourists(&self, tourists: Vec<Tourist>, baseline: u64) {
        self.tourists
            .apply_refresh(tourists.into_iter().map(|t| (t.id.clone(), t)), baseline);
    }

    pub(crate) fn apply_alerts(&self, alerts: Vec<Alert>, baseline: u64) {
        self.alerts
            .apply_refresh(alerts.into_iter().map(|a| (a.id.clone(), a)), baseline);
    }

    /// Stamp a completed refresh round.
    pub(crate) fn mark_refreshed(&self) {
        let _ = self.last_refresh.send(Some(Utc::now()));
    }

    // ── Static fallback ──────────────────────────────────────────────

    /// Backfill a single failed collection from the static dataset.
    pub(crate) fn backfill_zones(&self, dataset: &StaticDataset) {
        self.zones
            .replace_all(dataset.zones.iter().cloned().map(|z| (z.id.clone(), z)));
    }

    pub(crate) fn backfill_tourists(&self, dataset: &StaticDataset) {
        self.tourists
            .replace_all(dataset.tourists.iter().cloned().map(|t| (t.id.clone(), t)));
    }

    pub(crate) fn backfill_alerts(&self, dataset: &StaticDataset) {
        self.alerts
            .replace_all(dataset.alerts.iter().cloned().map(|a| (a.id.clone(), a)));
    }

    /// Overwrite all three collections with the static dataset (startup
    /// in static mode, or total API unavailability).
    pub(crate) fn load_static(&self, dataset: &StaticDataset) {
        self.backfill_zones(dataset);
        self.backfill_tourists(dataset);
        self.backfill_alerts(dataset);
        self.mark_refreshed();
    }

    // ── Realtime events ──────────────────────────────────────────────

    /// Patch one collection from a push event: prepend for new alerts,
    /// replace-by-id for zone/tourist updates (unknown ids dropped).
    pub(crate) fn apply_push(&self, event: PushEvent) {
        match event {
            PushEvent::Alert(alert) => {
                self.alerts.upsert(alert.id.clone(), alert);
            }
            PushEvent::TouristUpdate(tourist) => {
                let id = tourist.id.clone();
                if !self.tourists.replace(&id, tourist) {
                    tracing::debug!(id, "push update for unknown tourist, dropped");
                }
            }
            PushEvent::ZoneUpdate(zone) => {
                let id = zone.id.clone();
                if !self.zones.replace(&id, zone) {
                    tracing::debug!(id, "push update for unknown zone, dropped");
                }
            }
        }
        let _ = self.last_push_event.send(Some(Utc::now()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use geofly_api::types::{GeoPoint, TouristStatus};

    fn tourist(id: &str, name: &str) -> Tourist {
        Tourist {
            id: id.to_owned(),
            name: name.to_owned(),
            digital_id: format!("DID-{id}"),
            location: GeoPoint::new(0.0, 0.0),
            safety_score: 80,
            status: TouristStatus::Safe,
            last_seen: Utc::now(),
            device_id: "dev".to_owned(),
            emergency_contacts: Vec::new(),
        }
    }

    #[test]
    fn push_tourist_update_replaces_by_id() {
        let store = SyncStore::new();
        let baseline = store.tourists.baseline();
        store.apply_tourists(vec![tourist("t1", "Old")], baseline);

        store.apply_push(PushEvent::TouristUpdate(tourist("t1", "New")));

        assert_eq!(store.tourist_by_id("t1").unwrap().name, "New");
        assert!(store.last_push_event().is_some());
    }

    #[test]
    fn push_tourist_update_for_unknown_id_is_dropped() {
        let store = SyncStore::new();
        store.apply_push(PushEvent::TouristUpdate(tourist("ghost", "Nobody")));
        assert_eq!(store.tourist_count(), 0);
    }

    #[test]
    fn stale_poll_does_not_clobber_push_event() {
        let store = SyncStore::new();
        let baseline = store.tourists.baseline();
        store.apply_tourists(vec![tourist("t1", "Initial")], baseline);

        // Poll issued, then a push event lands while it is in flight.
        let poll_baseline = store.tourists.baseline();
        store.apply_push(PushEvent::TouristUpdate(tourist("t1", "Pushed")));

        store.apply_tourists(vec![tourist("t1", "Stale poll")], poll_baseline);

        assert_eq!(store.tourist_by_id("t1").unwrap().name, "Pushed");
    }

    #[test]
    fn load_static_fills_all_collections() {
        let store = SyncStore::new();
        store.load_static(&StaticDataset::load());

        assert!(store.zone_count() > 0);
        assert!(store.tourist_count() > 0);
        assert_eq!(store.alert_count(), 0);
        assert!(store.last_refresh().is_some());
    }
}
