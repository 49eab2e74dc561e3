//! In-memory persistence for testing and replay
//!
//! [`MemoryStore`] implements both collaborator traits on plain vectors. It is
//! useful for:
//! - Unit and integration testing (including injected failures)
//! - Replaying recorded sessions without a database
//! - Short-lived engines whose fingerprints do not need to survive a restart

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::errors::{TrackError, TrackResult};
use crate::traits::{EstimateSink, MeasurementStore};
use crate::types::{Estimate, Measurement};

/// Vector-backed measurement and estimate store
///
/// ## Example
///
/// ```rust
/// use trackfuse_core::{Coordinates, Measurement, MeasurementStore, MemoryStore, Method, RssiSample};
///
/// let store = MemoryStore::new();
/// let sample = RssiSample::new(1000, "aa:bb", -60.0, -60.0, 1.0, 6);
/// let placeholder = Measurement::from_sample(&sample, Coordinates::PLACEHOLDER, Method::Static);
///
/// store.write_measurements(&[placeholder])?;
///
/// assert_eq!(store.measurement_history()?.len(), 1);
/// assert!(store.read_measurements()?.is_empty());
/// # Ok::<(), trackfuse_core::TrackError>(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    measurements: RwLock<Vec<Measurement>>,
    estimates: RwLock<Vec<Estimate>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with measurements
    pub fn with_measurements(measurements: Vec<Measurement>) -> Self {
        Self {
            measurements: RwLock::new(measurements),
            ..Self::default()
        }
    }

    /// Make every subsequent write fail (simulated outage)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent read fail (simulated outage)
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of stored measurements
    pub fn len(&self) -> TrackResult<usize> {
        self.measurements
            .read()
            .map(|rows| rows.len())
            .map_err(|_| TrackError::LockPoisoned { resource: "memory measurements" })
    }

    /// Check if no measurement was stored yet
    pub fn is_empty(&self) -> TrackResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of recorded estimates, oldest first
    pub fn estimates(&self) -> TrackResult<Vec<Estimate>> {
        self.estimates
            .read()
            .map(|rows| rows.clone())
            .map_err(|_| TrackError::LockPoisoned { resource: "memory estimates" })
    }

    fn check(&self, flag: &AtomicBool, operation: &'static str) -> TrackResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(TrackError::persistence(operation, "simulated store failure"));
        }
        Ok(())
    }
}

impl MeasurementStore for MemoryStore {
    fn write_measurements(&self, batch: &[Measurement]) -> TrackResult<()> {
        self.check(&self.fail_writes, "write_measurements")?;

        let mut rows = self
            .measurements
            .write()
            .map_err(|_| TrackError::LockPoisoned { resource: "memory measurements" })?;
        rows.extend_from_slice(batch);
        Ok(())
    }

    fn read_measurements(&self) -> TrackResult<Vec<Measurement>> {
        self.check(&self.fail_reads, "read_measurements")?;

        let rows = self
            .measurements
            .read()
            .map_err(|_| TrackError::LockPoisoned { resource: "memory measurements" })?;
        Ok(rows
            .iter()
            .filter(|m| !m.coords().is_placeholder())
            .cloned()
            .collect())
    }

    fn measurement_history(&self) -> TrackResult<Vec<Measurement>> {
        self.check(&self.fail_reads, "measurement_history")?;

        let rows = self
            .measurements
            .read()
            .map_err(|_| TrackError::LockPoisoned { resource: "memory measurements" })?;
        Ok(rows.clone())
    }
}

impl EstimateSink for MemoryStore {
    fn write_estimate(&self, estimate: &Estimate) -> TrackResult<()> {
        self.check(&self.fail_writes, "write_estimate")?;

        let mut rows = self
            .estimates
            .write()
            .map_err(|_| TrackError::LockPoisoned { resource: "memory estimates" })?;
        rows.push(*estimate);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coordinates, Method, RssiSample};

    fn measurement(ts: u64, lat: f64, lon: f64) -> Measurement {
        let sample = RssiSample::new(ts, "aa", -60.0, -60.0, 1.0, 1);
        Measurement::from_sample(&sample, Coordinates::new(lat, lon), Method::Interpolated)
    }

    #[test]
    fn write_then_read() {
        let store = MemoryStore::new();
        assert!(store.is_empty().unwrap());

        store
            .write_measurements(&[measurement(1, 10.0, 20.0), measurement(2, 0.0, 0.0)])
            .unwrap();

        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.read_measurements().unwrap().len(), 1);
        assert_eq!(store.measurement_history().unwrap().len(), 2);
    }

    #[test]
    fn simulated_write_failure_stores_nothing() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);

        let err = store.write_measurements(&[measurement(1, 10.0, 20.0)]).unwrap_err();
        assert!(err.is_persistence());
        assert!(store.is_empty().unwrap());

        store.set_fail_writes(false);
        store.write_measurements(&[measurement(1, 10.0, 20.0)]).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn poisoned_lock_is_reported() {
        let store = MemoryStore::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _rows = store.measurements.write().unwrap();
            panic!("writer died holding the lock");
        }));

        assert!(matches!(store.len(), Err(TrackError::LockPoisoned { .. })));
        assert!(store.is_empty().is_err());
    }

    #[test]
    fn simulated_read_failure() {
        let store = MemoryStore::with_measurements(vec![measurement(1, 10.0, 20.0)]);
        store.set_fail_reads(true);
        assert!(store.read_measurements().is_err());
    }

    #[test]
    fn estimates_are_recorded_in_order() {
        let store = MemoryStore::new();
        for ts in [1000, 2000] {
            store
                .write_estimate(&Estimate { lat: 1.0, lon: 2.0, timestamp_ms: ts, neighbor_count: 3 })
                .unwrap();
        }
        let ts: Vec<u64> = store.estimates().unwrap().iter().map(|e| e.timestamp_ms).collect();
        assert_eq!(ts, vec![1000, 2000]);
    }
}
