//! Mapping of provider stat blobs onto [`CanonicalStats`].
//!
//! Upstream payloads name the same stat differently depending on which
//! feed produced them. Each canonical field has an ordered alias chain;
//! the first alias present with a non-null value wins.

use serde_json::Value;

use super::{CanonicalStats, Metric};

const TACKLES: &[&str] = &["tackles", "totalTackle"];
const FOULS: &[&str] = &["fouls", "foulsCommitted", "foulsCommited"];
const FOULS_DRAWN: &[&str] = &["foulsDrawn", "wasFouled"];
const SHOTS_TOTAL: &[&str] = &["shotsTotal", "totalShots"];
const SHOTS_ON_TARGET: &[&str] = &["shotsOnTarget", "onTargetScoringAttempt"];
const MINUTES: &[&str] = &["minutes", "minutesPlayed"];

/// Placeholder the provider sends for "no rating yet".
const RATING_PLACEHOLDER: &str = "-";

fn aliases(metric: Metric) -> &'static [&'static str] {
    match metric {
        Metric::Tackles => TACKLES,
        Metric::Fouls => FOULS,
        Metric::FoulsDrawn => FOULS_DRAWN,
        Metric::ShotsTotal => SHOTS_TOTAL,
        Metric::ShotsOnTarget => SHOTS_ON_TARGET,
    }
}

/// Merge a raw provider blob into `previous`.
///
/// Counting fields take the max of the resolved raw value and the previous
/// value, so stale or reordered snapshots can never move a total backwards.
/// The rating is replaced only by a present, non-zero, non-placeholder
/// value. `None` or a JSON `null` leaves `previous` untouched.
pub fn normalize(raw: Option<&Value>, previous: &CanonicalStats) -> CanonicalStats {
    let raw = match raw {
        Some(v) if !v.is_null() => v,
        _ => return previous.clone(),
    };

    let mut merged = previous.clone();
    for metric in Metric::ALL {
        let value = resolve_count(raw, aliases(metric));
        let slot = merged.get_mut(metric);
        *slot = (*slot).max(value);
    }
    merged.minutes = previous.minutes.max(resolve_count(raw, MINUTES));
    merged.rating = resolve_rating(raw).or(previous.rating);
    merged
}

fn first_present<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|v| !v.is_null())
}

fn resolve_count(raw: &Value, keys: &[&str]) -> u32 {
    first_present(raw, keys).map(count_value).unwrap_or(0)
}

fn count_value(value: &Value) -> u32 {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u.min(u32::MAX as u64) as u32
            } else {
                n.as_f64().map(clamp_float).unwrap_or(0)
            }
        }
        Value::String(s) => s.trim().parse::<f64>().map(clamp_float).unwrap_or(0),
        _ => 0,
    }
}

fn clamp_float(f: f64) -> u32 {
    if f.is_finite() && f > 0.0 {
        f.trunc().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

fn resolve_rating(raw: &Value) -> Option<f64> {
    let rating = match raw.get("rating")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if s.trim() != RATING_PLACEHOLDER => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (rating.is_finite() && rating != 0.0).then_some(rating)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_raw_is_identity() {
        let previous = CanonicalStats {
            tackles: 4,
            rating: Some(7.1),
            ..Default::default()
        };
        assert_eq!(normalize(None, &previous), previous);
        assert_eq!(normalize(Some(&Value::Null), &previous), previous);
    }

    #[test]
    fn resolves_provider_aliases() {
        let raw = json!({
            "totalTackle": 3,
            "foulsCommited": 1,
            "wasFouled": 2,
            "totalShots": 5,
            "onTargetScoringAttempt": 2,
            "minutesPlayed": 67,
            "rating": 7.3
        });
        let stats = normalize(Some(&raw), &CanonicalStats::default());
        assert_eq!(stats.tackles, 3);
        assert_eq!(stats.fouls, 1);
        assert_eq!(stats.fouls_drawn, 2);
        assert_eq!(stats.shots_total, 5);
        assert_eq!(stats.shots_on_target, 2);
        assert_eq!(stats.minutes, 67);
        assert_eq!(stats.rating, Some(7.3));
    }

    #[test]
    fn earlier_alias_wins_even_when_zero() {
        let raw = json!({"tackles": 0, "totalTackle": 9});
        let stats = normalize(Some(&raw), &CanonicalStats::default());
        assert_eq!(stats.tackles, 0);
    }

    #[test]
    fn null_alias_falls_through() {
        let raw = json!({"fouls": null, "foulsCommitted": 2});
        let stats = normalize(Some(&raw), &CanonicalStats::default());
        assert_eq!(stats.fouls, 2);
    }

    #[test]
    fn stale_snapshot_never_decreases_totals() {
        let previous = CanonicalStats {
            tackles: 5,
            shots_total: 3,
            minutes: 70,
            ..Default::default()
        };
        let raw = json!({"tackles": 2, "shotsTotal": 4, "minutes": 60});
        let stats = normalize(Some(&raw), &previous);
        assert_eq!(stats.tackles, 5);
        assert_eq!(stats.shots_total, 4);
        assert_eq!(stats.minutes, 70);
    }

    #[test]
    fn rating_placeholders_keep_previous() {
        let previous = CanonicalStats {
            rating: Some(6.8),
            ..Default::default()
        };
        for raw in [
            json!({"rating": "-"}),
            json!({"rating": 0}),
            json!({"rating": 0.0}),
            json!({"rating": null}),
            json!({}),
        ] {
            assert_eq!(normalize(Some(&raw), &previous).rating, Some(6.8), "{raw}");
        }
    }

    #[test]
    fn rating_is_overwritten_even_when_lower() {
        let previous = CanonicalStats {
            rating: Some(8.0),
            ..Default::default()
        };
        let stats = normalize(Some(&json!({"rating": "6.4"})), &previous);
        assert_eq!(stats.rating, Some(6.4));
    }

    #[test]
    fn tolerates_strings_floats_and_garbage() {
        let raw = json!({
            "tackles": "3",
            "fouls": 2.9,
            "foulsDrawn": -4,
            "shotsTotal": "lots",
            "shotsOnTarget": [1]
        });
        let stats = normalize(Some(&raw), &CanonicalStats::default());
        assert_eq!(stats.tackles, 3);
        assert_eq!(stats.fouls, 2);
        assert_eq!(stats.fouls_drawn, 0);
        assert_eq!(stats.shots_total, 0);
        assert_eq!(stats.shots_on_target, 0);
    }

    #[test]
    fn accumulating_merge_is_monotonic() {
        let inputs = [
            json!({"tackles": 1, "fouls": 0}),
            json!({"tackles": 3, "foulsCommitted": 1}),
            json!({"totalTackle": 2, "fouls": 0}),
            json!(null),
            json!({"tackles": 4, "wasFouled": 1}),
            json!({}),
        ];
        let mut current = CanonicalStats::default();
        for raw in &inputs {
            let next = normalize(Some(raw), &current);
            for metric in Metric::ALL {
                assert!(next.get(metric) >= current.get(metric), "{metric} decreased");
            }
            assert!(next.minutes >= current.minutes);
            current = next;
        }
        assert_eq!(current.tackles, 4);
        assert_eq!(current.fouls, 1);
        assert_eq!(current.fouls_drawn, 1);
    }
}
