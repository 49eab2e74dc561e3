//! Fingerprint Matching Parameters

/// Number of nearest fingerprints averaged into an estimate.
pub const DEFAULT_K: usize = 3;

/// RSSI assumed for an access point missing from one side of a comparison, in dBm.
///
/// -100 dBm is below the sensitivity of common WiFi chipsets, i.e. "not heard".
pub const PENALTY_RSSI_DBM: f64 = -100.0;

/// Standard deviation assumed for a stored signal that is absent, in dB.
pub const DEFAULT_SIGNAL_STD: f64 = 5.0;

/// Floor applied to stored standard deviations, in dB.
///
/// Single-sample scans report a std of 0, which would make the weighted
/// distance divide by zero.
pub const MIN_SIGNAL_STD: f64 = 0.5;
