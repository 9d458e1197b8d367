//! Turning stat changes into alerts.

use std::collections::BTreeSet;

use super::NotificationEvent;
use crate::stats::{CanonicalStats, Metric};

/// One alert per tracked metric whose total went up, in
/// [`Metric::ALERT_ORDER`].
///
/// Untracked metrics, unchanged or decreased totals, minutes and rating
/// never produce alerts.
pub fn compare(
    label: &str,
    old: &CanonicalStats,
    new: &CanonicalStats,
    tracked: &BTreeSet<Metric>,
) -> Vec<NotificationEvent> {
    Metric::ALERT_ORDER
        .iter()
        .filter(|metric| tracked.contains(*metric))
        .filter_map(|&metric| {
            let (before, after) = (old.get(metric), new.get(metric));
            (after > before).then(|| {
                NotificationEvent::new(
                    format!("{label}: {}!", metric.label()),
                    format!("+{} recorded. Total: {after}", after - before),
                    metric.severity(),
                )
            })
        })
        .collect()
}
