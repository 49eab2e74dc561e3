//! Engine configuration
//!
//! Every field defaults to the matching value in [`crate::constants`]. Configs
//! are plain structs with builder-style setters; with the `serde` feature they
//! can also be loaded from JSON:
//!
//! ```rust
//! use trackfuse_core::{MetricKind, TrackingConfig};
//!
//! let config = TrackingConfig::from_json_str(r#"{
//!     "localizer": { "k": 5, "metric": "euclidean" }
//! }"#)?;
//!
//! assert_eq!(config.localizer.k, 5);
//! assert_eq!(config.localizer.metric, MetricKind::Euclidean);
//! assert_eq!(config.reconciler.min_gps_fixes, 4);
//! # Ok::<(), trackfuse_core::TrackError>(())
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_K, DEFAULT_SIGNAL_STD, MAX_GPS_GAP_MS, MIN_GPS_FIXES, MIN_SIGNAL_STD,
    PENALTY_RSSI_DBM, STATIC_THRESHOLD_M,
};
use crate::errors::{TrackError, TrackResult};
use crate::metrics::MetricKind;

/// Reconciler thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReconcilerConfig {
    /// GPS fixes required before a pass does anything
    pub min_gps_fixes: usize,
    /// Widest accepted gap between bracketing fixes, in milliseconds
    pub max_gps_gap_ms: u64,
    /// Movement below this distance (meters) counts as stationary
    pub static_threshold_m: f64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            min_gps_fixes: MIN_GPS_FIXES,
            max_gps_gap_ms: MAX_GPS_GAP_MS,
            static_threshold_m: STATIC_THRESHOLD_M,
        }
    }
}

impl ReconcilerConfig {
    /// Set the GPS fix floor
    pub fn min_gps_fixes(mut self, count: usize) -> Self {
        self.min_gps_fixes = count;
        self
    }

    /// Set the bracketing window in milliseconds
    pub fn max_gps_gap_ms(mut self, gap_ms: u64) -> Self {
        self.max_gps_gap_ms = gap_ms;
        self
    }

    /// Set the stationary threshold in meters
    pub fn static_threshold_m(mut self, meters: f64) -> Self {
        self.static_threshold_m = meters;
        self
    }

    /// Reject values the reconciler cannot work with
    pub fn validate(&self) -> TrackResult<()> {
        // Bracketing needs a fix on each side of a sample
        if self.min_gps_fixes < 2 {
            return Err(TrackError::InvalidConfig {
                reason: "min_gps_fixes must be at least 2",
            });
        }
        if self.max_gps_gap_ms == 0 {
            return Err(TrackError::InvalidConfig {
                reason: "max_gps_gap_ms must be positive",
            });
        }
        if !(self.static_threshold_m >= 0.0 && self.static_threshold_m.is_finite()) {
            return Err(TrackError::InvalidConfig {
                reason: "static_threshold_m must be a finite non-negative distance",
            });
        }
        Ok(())
    }
}

/// Localizer parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LocalizerConfig {
    /// Number of nearest fingerprints averaged
    pub k: usize,
    /// Signal-space distance strategy
    pub metric: MetricKind,
    /// RSSI substituted for an access point heard on one side only (dBm)
    pub penalty_rssi: f64,
    /// Std assumed for a stored signal that is missing (dB)
    pub default_std: f64,
    /// Floor applied to stored std values (dB)
    pub min_std: f64,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            metric: MetricKind::VarianceWeighted,
            penalty_rssi: PENALTY_RSSI_DBM,
            default_std: DEFAULT_SIGNAL_STD,
            min_std: MIN_SIGNAL_STD,
        }
    }
}

impl LocalizerConfig {
    /// Set the neighbour count
    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Select the distance strategy
    pub fn metric(mut self, metric: MetricKind) -> Self {
        self.metric = metric;
        self
    }

    /// Reject values the localizer cannot work with
    pub fn validate(&self) -> TrackResult<()> {
        if self.k == 0 {
            return Err(TrackError::InvalidConfig {
                reason: "k must be at least 1",
            });
        }
        if !(self.min_std > 0.0 && self.min_std.is_finite()) {
            return Err(TrackError::InvalidConfig {
                reason: "min_std must be a finite positive value",
            });
        }
        if !(self.default_std > 0.0 && self.default_std.is_finite()) {
            return Err(TrackError::InvalidConfig {
                reason: "default_std must be a finite positive value",
            });
        }
        if !self.penalty_rssi.is_finite() {
            return Err(TrackError::InvalidConfig {
                reason: "penalty_rssi must be finite",
            });
        }
        Ok(())
    }
}

/// Full engine configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrackingConfig {
    /// Reconciler thresholds
    pub reconciler: ReconcilerConfig,
    /// Localizer parameters
    pub localizer: LocalizerConfig,
    /// Write every estimate to the history sink (best effort)
    pub record_estimates: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            reconciler: ReconcilerConfig::default(),
            localizer: LocalizerConfig::default(),
            record_estimates: true,
        }
    }
}

impl TrackingConfig {
    /// Replace the reconciler section
    pub fn with_reconciler(mut self, reconciler: ReconcilerConfig) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// Replace the localizer section
    pub fn with_localizer(mut self, localizer: LocalizerConfig) -> Self {
        self.localizer = localizer;
        self
    }

    /// Enable or disable estimate history
    pub fn record_estimates(mut self, enabled: bool) -> Self {
        self.record_estimates = enabled;
        self
    }

    /// Validate both sections
    pub fn validate(&self) -> TrackResult<()> {
        self.reconciler.validate()?;
        self.localizer.validate()
    }

    /// Parse and validate a JSON document; missing fields take their defaults
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> TrackResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|_| TrackError::InvalidConfig {
            reason: "configuration is not valid JSON for TrackingConfig",
        })?;
        config.validate()?;
        Ok(config)
    }
}
