//! Canonical player statistics and the metrics users can be alerted on.

pub mod demo;
pub mod normalize;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::UnknownMetric;
use crate::notify::Severity;

pub use normalize::normalize;

/// A stat a user can opt into alerts for.
///
/// Minutes and rating are part of [`CanonicalStats`] but never alertable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Tackles,
    Fouls,
    FoulsDrawn,
    ShotsTotal,
    ShotsOnTarget,
}

impl Metric {
    /// All alertable metrics in declaration order.
    pub const ALL: [Metric; 5] = [
        Metric::Tackles,
        Metric::Fouls,
        Metric::FoulsDrawn,
        Metric::ShotsTotal,
        Metric::ShotsOnTarget,
    ];

    /// Order in which deltas are announced within one target.
    pub const ALERT_ORDER: [Metric; 5] = [
        Metric::Tackles,
        Metric::ShotsTotal,
        Metric::ShotsOnTarget,
        Metric::Fouls,
        Metric::FoulsDrawn,
    ];

    /// Wire name, identical to the canonical field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tackles => "tackles",
            Self::Fouls => "fouls",
            Self::FoulsDrawn => "foulsDrawn",
            Self::ShotsTotal => "shotsTotal",
            Self::ShotsOnTarget => "shotsOnTarget",
        }
    }

    /// Short human label used in alert titles.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tackles => "Tackle",
            Self::Fouls => "Foul",
            Self::FoulsDrawn => "Fouled",
            Self::ShotsTotal => "Shot",
            Self::ShotsOnTarget => "On target",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Tackles | Self::FoulsDrawn => Severity::Success,
            Self::ShotsTotal => Severity::Info,
            Self::ShotsOnTarget => Severity::Warning,
            Self::Fouls => Severity::Danger,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// Normalized, merged stat record for one player.
///
/// The counting fields never decrease for a player over a match; `rating`
/// is whatever the provider reported last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalStats {
    #[serde(default)]
    pub tackles: u32,
    #[serde(default)]
    pub fouls: u32,
    #[serde(default)]
    pub fouls_drawn: u32,
    #[serde(default)]
    pub shots_total: u32,
    #[serde(default)]
    pub shots_on_target: u32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl CanonicalStats {
    pub fn get(&self, metric: Metric) -> u32 {
        match metric {
            Metric::Tackles => self.tackles,
            Metric::Fouls => self.fouls,
            Metric::FoulsDrawn => self.fouls_drawn,
            Metric::ShotsTotal => self.shots_total,
            Metric::ShotsOnTarget => self.shots_on_target,
        }
    }

    pub fn get_mut(&mut self, metric: Metric) -> &mut u32 {
        match metric {
            Metric::Tackles => &mut self.tackles,
            Metric::Fouls => &mut self.fouls,
            Metric::FoulsDrawn => &mut self.fouls_drawn,
            Metric::ShotsTotal => &mut self.shots_total,
            Metric::ShotsOnTarget => &mut self.shots_on_target,
        }
    }

    /// Shallow-merge `update` over `self`.
    ///
    /// Counting fields are always present in an update and replace the old
    /// values; a missing rating keeps the current one.
    pub fn merge_from(&mut self, update: &CanonicalStats) {
        let rating = update.rating.or(self.rating);
        *self = CanonicalStats {
            rating,
            ..update.clone()
        };
    }
}
