// ── Client-side dashboard metrics ──

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use geofly_api::types::{Alert, AlertKind, Tourist, Zone};

/// A tourist counts as "active" if seen within this window.
const ACTIVE_WINDOW_MINUTES: i64 = 5;

/// Summary numbers computed locally from the synchronized collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardMetrics {
    pub total_tourists: usize,
    /// Tourists last seen within the five-minute activity window.
    pub active_tourists: usize,
    pub total_zones: usize,
    /// Unacknowledged alerts.
    pub active_alerts: usize,
    /// Alerts of kind `violation`.
    pub violations: usize,
    /// Mean safety score across all tourists, rounded; 100 when empty.
    pub average_safety_score: u8,
}

pub(crate) fn compute(
    zones: &[Arc<Zone>],
    tourists: &[Arc<Tourist>],
    alerts: &[Arc<Alert>],
    now: DateTime<Utc>,
) -> DashboardMetrics {
    let cutoff = now - Duration::minutes(ACTIVE_WINDOW_MINUTES);

    let active_tourists = tourists.iter().filter(|t| t.last_seen > cutoff).count();
    let active_alerts = alerts.iter().filter(|a| !a.acknowledged).count();
    let violations = alerts
        .iter()
        .filter(|a| a.kind == AlertKind::Violation)
        .count();

    let average_safety_score = if tourists.is_empty() {
        100
    } else {
        let sum: u64 = tourists.iter().map(|t| u64::from(t.safety_score)).sum();
        let count = tourists.len() as u64;
        // Round half up, matching the dashboard's display convention.
        u8::try_from((sum + count / 2) / count).unwrap_or(100)
    };

    DashboardMetrics {
        total_tourists: tourists.len(),
        active_tourists,
        total_zones: zones.len(),
        active_alerts,
        violations,
        average_safety_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofly_api::types::{GeoPoint, TouristStatus};

    fn tourist(score: u8, last_seen: DateTime<Utc>) -> Arc<Tourist> {
        Arc::new(Tourist {
            id: format!("t-{score}"),
            name: "Test".to_owned(),
            digital_id: "DID".to_owned(),
            location: GeoPoint::new(0.0, 0.0),
            safety_score: score,
            status: TouristStatus::Safe,
            last_seen,
            device_id: "dev".to_owned(),
            emergency_contacts: Vec::new(),
        })
    }

    #[test]
    fn empty_tourist_list_scores_100() {
        let metrics = compute(&[], &[], &[], Utc::now());
        assert_eq!(metrics.average_safety_score, 100);
        assert_eq!(metrics.total_tourists, 0);
    }

    #[test]
    fn average_score_is_rounded_mean() {
        let now = Utc::now();
        let tourists = vec![tourist(80, now), tourist(60, now)];
        let metrics = compute(&[], &tourists, &[], now);
        assert_eq!(metrics.average_safety_score, 70);
    }

    #[test]
    fn active_count_honors_five_minute_window() {
        let now = Utc::now();
        let tourists = vec![
            tourist(80, now - Duration::minutes(2)),
            tourist(60, now - Duration::minutes(10)),
        ];
        let metrics = compute(&[], &tourists, &[], now);
        assert_eq!(metrics.total_tourists, 2);
        assert_eq!(metrics.active_tourists, 1);
    }
}
