//! Core fusion engine for Trackfuse
//!
//! Estimates a device position from periodic WiFi scans in two phases:
//!
//! - **Training**: RSSI batches from the scanner are tagged with coordinates
//!   interpolated from smartphone GPS fixes, building a fingerprint database.
//! - **Query**: a live scan is matched against the stored fingerprints with a
//!   k-nearest-neighbor search in signal space, without any GPS.
//!
//! ```text
//! RSSI batches ──┐
//!                ├─→ IngestBuffers ─→ Reconciler ─→ MeasurementStore
//! GPS fixes ─────┘                                      │
//!                                                       ↓
//! live scan ───────────────→ Localizer ←── FingerprintIndex
//!                                │
//!                                ↓
//!                          PositionCache
//! ```
//!
//! Key constraints:
//! - Buffers are owned state, never globals; one engine per tracked device
//! - All work is synchronous and bounded by the buffer sizes
//! - No randomness: the same fingerprints and scan give bit-identical estimates
//!
//! ```no_run
//! use trackfuse_core::{GpsFix, MemoryStore, RssiSample, TrackingConfig, TrackingEngine};
//!
//! let engine = TrackingEngine::new(MemoryStore::new(), TrackingConfig::default())?;
//!
//! engine.ingest_gps_fix(GpsFix::new(1_000, 48.8566, 2.3522))?;
//! let report = engine.ingest_rssi_batch(vec![
//!     RssiSample::new(1_500, "aa:bb:cc:dd:ee:ff", -61.0, -60.0, 2.1, 6),
//! ])?;
//! println!("{} measurements written", report.written);
//! # Ok::<(), trackfuse_core::TrackError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod buffer;
pub mod cache;
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod geo;
pub mod index;
pub mod localize;
pub mod metrics;
pub mod reconcile;
pub mod store;
pub mod time;
pub mod traits;
pub mod types;

// Public API
pub use buffer::IngestBuffers;
pub use cache::PositionCache;
pub use config::{LocalizerConfig, ReconcilerConfig, TrackingConfig};
pub use engine::{BufferLevels, TrackingEngine};
pub use errors::{TrackError, TrackResult};
pub use index::{Fingerprint, FingerprintIndex, SignalStats};
pub use localize::{Localization, Localizer, Neighbor};
pub use metrics::{EuclideanMetric, MetricKind, SignalMetric, VarianceWeightedMetric};
pub use reconcile::{DropReason, ReconcilePass, ReconcileReport, Reconciler, Resolution};
pub use store::MemoryStore;
pub use time::Timestamp;
pub use traits::{EstimateSink, MeasurementStore};
pub use types::{Coordinates, Estimate, GpsFix, Measurement, Method, RssiSample, Scan};

/// Crate version, as published in Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
