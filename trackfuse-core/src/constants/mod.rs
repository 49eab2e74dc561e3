//! Constants for Trackfuse Core
//!
//! Centralized tunables with their units. Every configurable value in
//! [`crate::config`] defaults to one of these.
//!
//! ## Organization
//!
//! - **Geo**: Earth model used for distances
//! - **Fusion**: GPS/RSSI reconciliation thresholds
//! - **Matching**: fingerprint distance and k-NN parameters

/// Earth model constants.
pub mod geo;

/// Reconciliation thresholds for pairing RSSI samples with GPS fixes.
pub mod fusion;

/// Signal-space distance and neighbour selection parameters.
pub mod matching;

pub use fusion::{MAX_GPS_GAP_MS, MIN_GPS_FIXES, STATIC_THRESHOLD_M};
pub use geo::EARTH_RADIUS_M;
pub use matching::{DEFAULT_K, DEFAULT_SIGNAL_STD, MIN_SIGNAL_STD, PENALTY_RSSI_DBM};
