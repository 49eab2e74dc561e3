//! Tracking Engine Facade
//!
//! ## Overview
//!
//! [`TrackingEngine`] wires the stages together for one tracked device:
//!
//! ```text
//! ingest_rssi_batch ─┐       ┌──────────── Mutex ─────────────┐
//!                    ├──────→│ append → plan → write → apply  │
//! ingest_gps_fix ────┘       └────────────────────────────────┘
//!
//! locate(scan) ─→ FingerprintIndex::load(store) ─→ Localizer ─→ PositionCache
//!                                                          └──→ EstimateSink (best effort)
//! ```
//!
//! ## Concurrency
//!
//! The buffer mutex is held from the append until the pass is applied, store
//! write included. Two passes never interleave, and an append never lands
//! between a plan and its apply. The localization path takes no buffer lock;
//! it only reads the store and writes the position cache.
//!
//! ## Failure Handling
//!
//! | Failure                        | Effect                                             |
//! |--------------------------------|----------------------------------------------------|
//! | Measurement write fails        | Error returned, buffers keep the input for a retry |
//! | Fingerprint read fails         | Error returned, cache unchanged                    |
//! | Estimate history write fails   | Logged, cache still updated                        |

use std::sync::{Mutex, MutexGuard};

use crate::buffer::IngestBuffers;
use crate::cache::PositionCache;
use crate::config::TrackingConfig;
use crate::errors::{TrackError, TrackResult};
use crate::index::FingerprintIndex;
use crate::localize::Localizer;
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::time::Timestamp;
use crate::traits::{EstimateSink, MeasurementStore};
use crate::types::{Estimate, GpsFix, Measurement, RssiSample, Scan};

/// Number of entries waiting in each ingest buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferLevels {
    /// Unreconciled RSSI samples
    pub rssi: usize,
    /// Retained GPS fixes
    pub gps: usize,
}

/// Ingestion, reconciliation and localization for one device
#[derive(Debug)]
pub struct TrackingEngine<S> {
    store: S,
    buffers: Mutex<IngestBuffers>,
    reconciler: Reconciler,
    localizer: Localizer,
    cache: PositionCache,
    config: TrackingConfig,
}

impl<S> TrackingEngine<S>
where
    S: MeasurementStore + EstimateSink,
{
    /// Create an engine after validating `config`
    pub fn new(store: S, config: TrackingConfig) -> TrackResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            buffers: Mutex::new(IngestBuffers::new()),
            reconciler: Reconciler::new(config.reconciler)?,
            localizer: Localizer::new(config.localizer)?,
            cache: PositionCache::new(),
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Persistence collaborator
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Buffer a scanner batch and run a reconciliation pass
    pub fn ingest_rssi_batch<I>(&self, batch: I) -> TrackResult<ReconcileReport>
    where
        I: IntoIterator<Item = RssiSample>,
    {
        let mut buffers = self.lock_buffers()?;
        buffers.append_rssi_batch(batch);
        self.reconcile_locked(&mut buffers)
    }

    /// Buffer a GPS fix and run a reconciliation pass
    pub fn ingest_gps_fix(&self, fix: GpsFix) -> TrackResult<ReconcileReport> {
        let mut buffers = self.lock_buffers()?;
        buffers.append_gps_fix(fix);
        self.reconcile_locked(&mut buffers)
    }

    /// Run a pass without new input, e.g. to retry after a store outage
    pub fn reconcile(&self) -> TrackResult<ReconcileReport> {
        let mut buffers = self.lock_buffers()?;
        self.reconcile_locked(&mut buffers)
    }

    /// Estimate the position of a live scan and cache it
    ///
    /// `Ok(None)` means no stored fingerprint shares an access point with the
    /// scan; the cached position is left as it was.
    pub fn locate(&self, scan: &Scan, timestamp: Timestamp) -> TrackResult<Option<Estimate>> {
        let index = FingerprintIndex::load(&self.store).map_err(|err| {
            log_warn!("Fingerprint read failed, no estimate this cycle: {}", err);
            err
        })?;

        let localization = match self.localizer.locate(&index, scan) {
            Some(localization) => localization,
            None => return Ok(None),
        };

        let estimate = Estimate {
            lat: localization.coords.lat,
            lon: localization.coords.lon,
            timestamp_ms: timestamp,
            neighbor_count: localization.neighbor_count(),
        };

        if self.config.record_estimates {
            if let Err(err) = self.store.write_estimate(&estimate) {
                log_warn!("Estimate history write failed: {}", err);
            }
        }

        self.cache.set(estimate)?;
        Ok(Some(estimate))
    }

    /// Most recent estimate, if any
    pub fn last_position(&self) -> TrackResult<Option<Estimate>> {
        self.cache.get()
    }

    /// Every stored measurement, placeholder rows included
    pub fn measurement_history(&self) -> TrackResult<Vec<Measurement>> {
        self.store.measurement_history()
    }

    /// Current buffer fill levels
    pub fn buffered(&self) -> TrackResult<BufferLevels> {
        let buffers = self.lock_buffers()?;
        Ok(BufferLevels {
            rssi: buffers.rssi_len(),
            gps: buffers.gps_len(),
        })
    }

    fn lock_buffers(&self) -> TrackResult<MutexGuard<'_, IngestBuffers>> {
        self.buffers
            .lock()
            .map_err(|_| TrackError::LockPoisoned { resource: "ingest buffers" })
    }

    fn reconcile_locked(&self, buffers: &mut IngestBuffers) -> TrackResult<ReconcileReport> {
        let pass = self.reconciler.plan(buffers);
        if pass.is_skipped() {
            return Ok(pass.apply(buffers));
        }

        if !pass.measurements().is_empty() {
            if let Err(err) = self.store.write_measurements(pass.measurements()) {
                log_warn!(
                    "Discarding reconciliation pass of {} measurements: {}",
                    pass.measurements().len(),
                    err
                );
                return Err(err);
            }
        }

        let report = pass.apply(buffers);
        if report.written > 0 || report.dropped() > 0 {
            log_info!(
                "Reconciled: {} written, {} deferred, {} dropped before history, {} dropped sparse",
                report.written,
                report.deferred,
                report.dropped_before_history,
                report.dropped_sparse
            );
        } else {
            log_debug!("Reconciled: {} samples deferred", report.deferred);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocalizerConfig;
    use crate::store::MemoryStore;
    use crate::types::Method;

    fn engine() -> TrackingEngine<MemoryStore> {
        TrackingEngine::new(MemoryStore::new(), TrackingConfig::default()).unwrap()
    }

    fn feed_walk(engine: &TrackingEngine<MemoryStore>) {
        engine.ingest_gps_fix(GpsFix::new(1000, 10.0, 20.0)).unwrap();
        engine.ingest_gps_fix(GpsFix::new(2000, 10.0, 20.001)).unwrap();
        engine.ingest_gps_fix(GpsFix::new(3000, 10.001, 20.002)).unwrap();
    }

    #[test]
    fn rejects_invalid_config() {
        let config = TrackingConfig::default().with_localizer(LocalizerConfig::default().k(0));
        assert!(TrackingEngine::new(MemoryStore::new(), config).is_err());
    }

    #[test]
    fn training_cycle_writes_measurement() {
        let engine = engine();
        feed_walk(&engine);

        let report = engine
            .ingest_rssi_batch(vec![RssiSample::new(2500, "AA:BB", -60.0, -60.0, 1.0, 6)])
            .unwrap();
        assert!(report.skipped);

        let report = engine.ingest_gps_fix(GpsFix::new(4000, 10.001, 20.003)).unwrap();
        assert_eq!(report.written, 1);

        let history = engine.measurement_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].method, Method::Interpolated);
        assert_eq!(engine.buffered().unwrap(), BufferLevels { rssi: 0, gps: 1 });
    }

    #[test]
    fn failed_write_keeps_buffers() {
        let engine = engine();
        feed_walk(&engine);
        engine
            .ingest_rssi_batch(vec![RssiSample::new(2500, "AA:BB", -60.0, -60.0, 1.0, 6)])
            .unwrap();

        engine.store().set_fail_writes(true);
        let err = engine.ingest_gps_fix(GpsFix::new(4000, 10.001, 20.003)).unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(engine.buffered().unwrap(), BufferLevels { rssi: 1, gps: 4 });

        engine.store().set_fail_writes(false);
        let report = engine.reconcile().unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(engine.store().len().unwrap(), 1);
    }

    #[test]
    fn locate_updates_cache() {
        let engine = engine();
        assert!(engine.last_position().unwrap().is_none());

        feed_walk(&engine);
        engine
            .ingest_rssi_batch(vec![RssiSample::new(2500, "AA:BB", -60.0, -60.0, 1.0, 6)])
            .unwrap();
        engine.ingest_gps_fix(GpsFix::new(4000, 10.001, 20.003)).unwrap();

        let scan: Scan = vec![("AA:BB", -61.0)].into_iter().collect();
        let estimate = engine.locate(&scan, 9000).unwrap().unwrap();

        assert_eq!(estimate.neighbor_count, 1);
        assert_eq!(estimate.timestamp_ms, 9000);
        assert_eq!(engine.last_position().unwrap(), Some(estimate));
        assert_eq!(engine.store().estimates().unwrap(), vec![estimate]);
    }

    #[test]
    fn no_match_leaves_cache_alone() {
        let engine = engine();
        let scan: Scan = vec![("CC:DD", -50.0)].into_iter().collect();
        assert_eq!(engine.locate(&scan, 1000).unwrap(), None);
        assert!(engine.last_position().unwrap().is_none());
    }

    #[test]
    fn history_write_failure_still_caches() {
        let store = MemoryStore::with_measurements(vec![Measurement::from_sample(
            &RssiSample::new(1000, "AA:BB", -60.0, -60.0, 1.0, 6),
            crate::types::Coordinates::new(1.0, 2.0),
            Method::Static,
        )]);
        store.set_fail_writes(true);
        let engine = TrackingEngine::new(store, TrackingConfig::default()).unwrap();

        let scan: Scan = vec![("AA:BB", -60.0)].into_iter().collect();
        assert!(engine.locate(&scan, 5000).unwrap().is_some());
        assert!(engine.last_position().unwrap().is_some());
    }

    #[test]
    fn read_failure_is_an_error() {
        let engine = engine();
        engine.store().set_fail_reads(true);
        let scan: Scan = vec![("AA:BB", -60.0)].into_iter().collect();
        assert!(engine.locate(&scan, 1000).is_err());
    }
}
