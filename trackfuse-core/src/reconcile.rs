//! GPS/RSSI Reconciliation
//!
//! ## Overview
//!
//! The reconciler turns buffered RSSI samples into located measurements by
//! pairing each sample with the two GPS fixes that bracket it in time:
//!
//! ```text
//! gps:   g0 ──────── g1 ──────────── g2 ──── g3
//!                         ↑
//!                     sample t        prev = g1, next = g2
//!                                     alpha = (t - g1.t) / (g2.t - g1.t)
//! ```
//!
//! ## Per-sample Rules
//!
//! With both buffers sorted ascending, for each sample at time `t`:
//!
//! 1. `next` = first fix with `timestamp >= t`. None → **deferred**: a later
//!    fix may still arrive, the sample waits for the next pass.
//! 2. `next` is the very first buffered fix → **dropped**: nothing earlier can
//!    ever bracket it.
//! 3. `next.t - prev.t > max_gps_gap_ms` → **dropped**: the fixes are too
//!    sparse for a straight line to describe the path.
//! 4. `distance(prev, next) < static_threshold_m` → `prev` verbatim,
//!    [`Method::Static`]. Otherwise linear interpolation at `alpha`,
//!    [`Method::Interpolated`].
//!
//! A location is never extrapolated outside the two fixes it came from.
//!
//! ## Plan, Write, Apply
//!
//! A pass is split in two so that a failed write loses nothing:
//!
//! ```text
//! plan(&mut buffers)  ─→ ReconcilePass { measurements, deferred, evictions }
//!        │                      │
//!        │               store.write_measurements()
//!        │                      │ ok                    │ err
//!        ↓                      ↓                       ↓
//!   (buffers sorted)     pass.apply(&mut buffers)   buffers untouched
//! ```
//!
//! `plan` only sorts the buffers; `apply` replaces the RSSI buffer with the
//! deferred samples and evicts GPS fixes that can no longer bracket anything.
//! Both must run under the same lock with no append in between.
//!
//! ## Eviction
//!
//! - Samples deferred: fixes older than the earliest deferred sample are
//!   dropped, except the one immediately preceding it, which is kept so the
//!   sample can still be bracketed once a later fix arrives.
//! - Nothing deferred: only the most recent fix is kept.

use crate::buffer::IngestBuffers;
use crate::config::ReconcilerConfig;
use crate::errors::TrackResult;
use crate::geo;
use crate::time::Timestamp;
use crate::types::{Coordinates, GpsFix, Measurement, Method, RssiSample};

/// Why a sample was discarded for good
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The sample is older than every buffered GPS fix
    PrecedesHistory,
    /// The bracketing fixes are further apart than the configured window
    SparseFixes {
        /// Gap between the bracketing fixes in milliseconds
        gap_ms: u64,
    },
}

/// Outcome of locating one sample against the GPS buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// A location was derived
    Located {
        /// Derived position
        location: Coordinates,
        /// Static copy or interpolation
        method: Method,
    },
    /// No later fix yet; retry on the next pass
    Deferred,
    /// Permanently discarded
    Dropped(DropReason),
}

/// Summary of one reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    /// Measurements handed to the store
    pub written: usize,
    /// Samples kept for a later pass
    pub deferred: usize,
    /// Samples older than all GPS history
    pub dropped_before_history: usize,
    /// Samples bracketed by fixes too far apart
    pub dropped_sparse: usize,
    /// GPS fixes evicted after the pass
    pub gps_evicted: usize,
    /// Pass skipped because too few GPS fixes were buffered
    pub skipped: bool,
}

impl ReconcileReport {
    /// Total samples discarded for good
    pub fn dropped(&self) -> usize {
        self.dropped_before_history + self.dropped_sparse
    }
}

/// A computed but not yet committed reconciliation pass
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilePass {
    measurements: Vec<Measurement>,
    deferred: Vec<RssiSample>,
    gps_evict: usize,
    report: ReconcileReport,
}

impl ReconcilePass {
    fn skipped() -> Self {
        Self {
            measurements: Vec::new(),
            deferred: Vec::new(),
            gps_evict: 0,
            report: ReconcileReport {
                skipped: true,
                ..ReconcileReport::default()
            },
        }
    }

    /// Measurements to persist, in timestamp order
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// True when the pass did not run (insufficient GPS context)
    pub fn is_skipped(&self) -> bool {
        self.report.skipped
    }

    /// Report the pass will produce once applied
    pub fn report(&self) -> ReconcileReport {
        self.report
    }

    /// Commit the pass to the buffers it was planned from
    pub fn apply(self, buffers: &mut IngestBuffers) -> ReconcileReport {
        if self.report.skipped {
            return self.report;
        }
        buffers.replace_rssi(self.deferred);
        buffers.evict_gps_front(self.gps_evict);
        self.report
    }
}

/// Pairs RSSI samples with bracketing GPS fixes
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a reconciler after validating its thresholds
    pub fn new(config: ReconcilerConfig) -> TrackResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active thresholds
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Locate a sample timestamp against a GPS buffer sorted ascending
    pub fn resolve(&self, timestamp: Timestamp, gps: &[GpsFix]) -> Resolution {
        let next_idx = gps.partition_point(|fix| fix.timestamp_ms < timestamp);

        if next_idx == gps.len() {
            return Resolution::Deferred;
        }
        if next_idx == 0 {
            return Resolution::Dropped(DropReason::PrecedesHistory);
        }

        let prev = gps[next_idx - 1];
        let next = gps[next_idx];
        // prev.t < timestamp <= next.t, so the gap is at least 1 ms
        let gap_ms = next.timestamp_ms - prev.timestamp_ms;
        if gap_ms > self.config.max_gps_gap_ms {
            return Resolution::Dropped(DropReason::SparseFixes { gap_ms });
        }

        if geo::distance(prev.coords(), next.coords()) < self.config.static_threshold_m {
            return Resolution::Located {
                location: prev.coords(),
                method: Method::Static,
            };
        }

        let alpha = (timestamp - prev.timestamp_ms) as f64 / gap_ms as f64;
        Resolution::Located {
            location: geo::interpolate_coords(prev.coords(), next.coords(), alpha),
            method: Method::Interpolated,
        }
    }

    /// Sort the buffers and compute a pass without committing it
    pub fn plan(&self, buffers: &mut IngestBuffers) -> ReconcilePass {
        if buffers.gps_len() < self.config.min_gps_fixes {
            log_debug!(
                "Reconciliation skipped: {} GPS fixes buffered, {} required",
                buffers.gps_len(),
                self.config.min_gps_fixes
            );
            return ReconcilePass::skipped();
        }

        buffers.sort_by_timestamp();

        let gps = buffers.gps();
        let mut measurements = Vec::new();
        let mut deferred = Vec::new();
        let mut report = ReconcileReport::default();

        for sample in buffers.rssi() {
            match self.resolve(sample.timestamp_ms, gps) {
                Resolution::Located { location, method } => {
                    measurements.push(Measurement::from_sample(sample, location, method));
                }
                Resolution::Deferred => deferred.push(sample.clone()),
                Resolution::Dropped(reason) => {
                    log_debug!(
                        "Dropping RSSI sample {} at t={}: {:?}",
                        sample.bssid,
                        sample.timestamp_ms,
                        reason
                    );
                    match reason {
                        DropReason::PrecedesHistory => report.dropped_before_history += 1,
                        DropReason::SparseFixes { .. } => report.dropped_sparse += 1,
                    }
                }
            }
        }

        let gps_evict = match deferred.first() {
            Some(oldest) => gps
                .partition_point(|fix| fix.timestamp_ms < oldest.timestamp_ms)
                .saturating_sub(1),
            None => gps.len().saturating_sub(1),
        };

        report.written = measurements.len();
        report.deferred = deferred.len();
        report.gps_evicted = gps_evict;

        ReconcilePass {
            measurements,
            deferred,
            gps_evict,
            report,
        }
    }
}
