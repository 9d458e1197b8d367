//! Synthetic stat progression used while the data source is unavailable.

use rand::Rng;

use super::{CanonicalStats, Metric};

/// Pick the metric a demo tick increments from a roll in `[0, 1)`.
///
/// Weights: tackles 30%, shots 20%, shots on target 10%, fouls 10%,
/// fouls drawn 10%, nothing 20%.
pub fn pick_metric(roll: f64) -> Option<Metric> {
    if roll > 0.7 {
        Some(Metric::Tackles)
    } else if roll > 0.5 {
        Some(Metric::ShotsTotal)
    } else if roll > 0.4 {
        Some(Metric::ShotsOnTarget)
    } else if roll > 0.3 {
        Some(Metric::Fouls)
    } else if roll > 0.2 {
        Some(Metric::FoulsDrawn)
    } else {
        None
    }
}

/// Advance `previous` by one demo tick: at most one metric +1, minutes +1.
pub fn synthesize<R: Rng + ?Sized>(previous: &CanonicalStats, rng: &mut R) -> CanonicalStats {
    let mut next = previous.clone();
    if let Some(metric) = pick_metric(rng.gen::<f64>()) {
        let count = next.get_mut(metric);
        *count = count.saturating_add(1);
    }
    next.minutes = next.minutes.saturating_add(1);
    next
}
