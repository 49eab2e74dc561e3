//! Reconciliation Thresholds
//!
//! Values governing how RSSI samples are paired with bracketing GPS fixes.

/// Minimum number of buffered GPS fixes before a reconciliation pass runs.
///
/// Empirical floor: with fewer fixes the pass would mostly defer samples or
/// interpolate across the very first fixes of a session, which tend to be the
/// least accurate (phone GPS still converging).
pub const MIN_GPS_FIXES: usize = 4;

/// Maximum time between two bracketing GPS fixes, in milliseconds.
///
/// A walking user covers ~40 m in 30 s. Beyond that window a straight-line
/// interpolation stops describing the actual path, so the sample is dropped.
pub const MAX_GPS_GAP_MS: u64 = 30_000;

/// Distance below which the device is considered stationary, in meters.
///
/// Consumer GPS jitter is typically 3-5 m; movement under this threshold is
/// indistinguishable from noise, so the earlier fix is copied verbatim.
pub const STATIC_THRESHOLD_M: f64 = 5.0;
