//! Signal-Space Distance Strategies
//!
//! ## Overview
//!
//! The localizer compares a live scan with each stored fingerprint over the
//! union of their access points. A metric defines how much one access point
//! contributes to the (squared) distance; the localizer sums the terms and the
//! metric turns the sum into the final distance.
//!
//! ### Variance-weighted (default)
//!
//! ```text
//! d = sqrt( Σ (live - avg)² / max(std, min_std)² )
//! ```
//!
//! A Mahalanobis-style distance with a diagonal covariance: an access point
//! whose stored RSSI was stable (small std) weighs more than one that
//! fluctuated during training.
//!
//! ### Euclidean
//!
//! ```text
//! d = sqrt( Σ (live - avg)² )
//! ```
//!
//! Ignores the stored spread entirely. Useful when fingerprints were recorded
//! from single-shot scans whose std is meaningless.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::LocalizerConfig;
use crate::index::SignalStats;

/// Distance strategy used by the localizer
pub trait SignalMetric: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Contribution of one access point, given the live RSSI and the stored statistics
    fn term(&self, live: f64, stored: SignalStats) -> f64;

    /// Turn the accumulated sum of terms into a distance
    fn finish(&self, sum: f64) -> f64 {
        libm::sqrt(sum)
    }
}

/// Squared difference scaled by the stored variance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceWeightedMetric {
    /// Floor applied to the stored std before squaring
    pub min_std: f64,
}

impl SignalMetric for VarianceWeightedMetric {
    fn name(&self) -> &'static str {
        "variance_weighted"
    }

    fn term(&self, live: f64, stored: SignalStats) -> f64 {
        let sigma = stored.std.max(self.min_std);
        let diff = live - stored.avg;
        (diff * diff) / (sigma * sigma)
    }
}

/// Plain squared difference
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EuclideanMetric;

impl SignalMetric for EuclideanMetric {
    fn name(&self) -> &'static str {
        "euclidean"
    }

    fn term(&self, live: f64, stored: SignalStats) -> f64 {
        let diff = live - stored.avg;
        diff * diff
    }
}

/// Configurable choice of [`SignalMetric`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MetricKind {
    /// [`VarianceWeightedMetric`]
    #[default]
    VarianceWeighted,
    /// [`EuclideanMetric`]
    Euclidean,
}

impl MetricKind {
    /// Instantiate the strategy with the localizer's parameters
    pub fn build(&self, config: &LocalizerConfig) -> Box<dyn SignalMetric> {
        match self {
            Self::VarianceWeighted => Box::new(VarianceWeightedMetric {
                min_std: config.min_std,
            }),
            Self::Euclidean => Box::new(EuclideanMetric),
        }
    }
}
