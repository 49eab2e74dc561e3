//! Shared fixtures for the integration suites
//!
//! - A walking trajectory with matching scanner batches
//! - Helpers to build engines over a `MemoryStore`

#![allow(dead_code)]

use trackfuse_core::{
    GpsFix, MemoryStore, RssiSample, Scan, Timestamp, TrackingConfig, TrackingEngine,
};

/// Fixes from the reference walk: four fixes one second apart
pub fn reference_walk() -> Vec<GpsFix> {
    vec![
        GpsFix::new(1000, 10.0, 20.0),
        GpsFix::new(2000, 10.0, 20.001),
        GpsFix::new(3000, 10.001, 20.002),
        GpsFix::new(4000, 10.001, 20.003),
    ]
}

/// One access point seen in a batch
pub fn sample(ts: Timestamp, bssid: &str, rssi: f64) -> RssiSample {
    RssiSample::new(ts, bssid, rssi, rssi, 2.0, 6)
}

/// Engine with default thresholds over an empty in-memory store
pub fn memory_engine() -> TrackingEngine<MemoryStore> {
    TrackingEngine::new(MemoryStore::new(), TrackingConfig::default())
        .expect("default config is valid")
}

/// Straight east-bound path, `steps` fixes `interval_ms` apart, ~22 m per step
pub fn straight_path(start: Timestamp, steps: u64, interval_ms: u64) -> Vec<GpsFix> {
    (0..steps)
        .map(|i| GpsFix::new(start + i * interval_ms, 45.0, 7.0 + i as f64 * 0.0003))
        .collect()
}

/// Scanner batch for a position along [`straight_path`]: three access points
/// whose levels vary linearly with distance travelled
pub fn path_batch(ts: Timestamp, progress: f64) -> Vec<RssiSample> {
    vec![
        sample(ts, "ap:west", -40.0 - progress * 5.0),
        sample(ts, "ap:mid", -70.0 + (progress - 5.0).abs() * -3.0),
        sample(ts, "ap:east", -90.0 + progress * 5.0),
    ]
}

/// Live scan matching [`path_batch`]
pub fn path_scan(progress: f64) -> Scan {
    path_batch(0, progress)
        .into_iter()
        .map(|s| (s.bssid, s.rssi_avg))
        .collect()
}
