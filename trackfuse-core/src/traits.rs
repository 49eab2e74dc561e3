//! Persistence collaborator traits
//!
//! The engine does not own a storage engine. It writes measurement batches to,
//! and reads fingerprints back from, whatever implements these traits: the
//! SQLite store in `trackfuse-store`, or [`crate::MemoryStore`] in tests.
//!
//! Methods take `&self`: stores are shared between the ingestion path (writer)
//! and the localization path (reader), and reader/writer isolation is the
//! store's job, not the engine's.

use std::sync::Arc;

use crate::errors::TrackResult;
use crate::types::{Estimate, Measurement};

/// Append-only measurement storage
pub trait MeasurementStore {
    /// Insert a batch atomically: either every row is stored or none is
    fn write_measurements(&self, batch: &[Measurement]) -> TrackResult<()>;

    /// Every stored measurement whose coordinates are not the `(0, 0)` placeholder
    fn read_measurements(&self) -> TrackResult<Vec<Measurement>>;

    /// Every stored measurement, placeholder rows included (map rendering)
    fn measurement_history(&self) -> TrackResult<Vec<Measurement>>;
}

/// Optional history of produced estimates
pub trait EstimateSink {
    /// Record one estimate; callers treat failures as best-effort
    fn write_estimate(&self, estimate: &Estimate) -> TrackResult<()>;
}

impl<T: MeasurementStore + ?Sized> MeasurementStore for Arc<T> {
    fn write_measurements(&self, batch: &[Measurement]) -> TrackResult<()> {
        (**self).write_measurements(batch)
    }

    fn read_measurements(&self) -> TrackResult<Vec<Measurement>> {
        (**self).read_measurements()
    }

    fn measurement_history(&self) -> TrackResult<Vec<Measurement>> {
        (**self).measurement_history()
    }
}

impl<T: EstimateSink + ?Sized> EstimateSink for Arc<T> {
    fn write_estimate(&self, estimate: &Estimate) -> TrackResult<()> {
        (**self).write_estimate(estimate)
    }
}
