//! SQLite Persistence for Trackfuse
//!
//! ## Overview
//!
//! [`SqliteStore`] is the production persistence collaborator: it implements
//! [`trackfuse_core::MeasurementStore`] and [`trackfuse_core::EstimateSink`] on
//! a single SQLite file with two tables.
//!
//! ```text
//! measurements (id, timestamp, bssid, rssi_avg, rssi_med, rssi_std,
//!               channel, lat, lon, method, processed_at)
//! estimations  (id, timestamp, lat, lon, nb_neighbors, processed_at)
//! ```
//!
//! ## Concurrency
//!
//! The database runs in WAL mode so the fingerprint rebuild and dashboard
//! readers do not block the reconciliation writer. Within one process the
//! connection sits behind a mutex; open a second store on the same file for
//! a separate reader.
//!
//! ## Atomicity
//!
//! A measurement batch is inserted inside one transaction: after a failure no
//! row of the batch is visible, which is what lets the engine keep its buffers
//! and retry the whole pass.
//!
//! ## Usage Example
//!
//! ```rust
//! use trackfuse_core::{TrackingConfig, TrackingEngine};
//! use trackfuse_store::SqliteStore;
//!
//! let store = SqliteStore::in_memory()?;
//! let engine = TrackingEngine::new(store, TrackingConfig::default())?;
//! assert!(engine.measurement_history()?.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use thiserror::Error;
use trackfuse_core::TrackError;

mod sqlite;

pub use sqlite::{SqliteStore, StoredEstimate};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// The SQLite engine reported an error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A value does not fit its column type
    #[error("Value {value} out of range for column {column}")]
    OutOfRange {
        /// Column name
        column: &'static str,
        /// Offending value
        value: u64,
    },

    /// A stored row cannot be mapped back to the data model
    #[error("Corrupt row {id}: {reason}")]
    CorruptRow {
        /// Row id
        id: i64,
        /// What was wrong
        reason: String,
    },

    /// A thread panicked while holding the connection
    #[error("Connection lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Wrap as an engine persistence error for `operation`
    pub fn into_track_error(self, operation: &'static str) -> TrackError {
        TrackError::persistence(operation, self)
    }
}

impl From<StoreError> for TrackError {
    fn from(err: StoreError) -> Self {
        err.into_track_error("sqlite")
    }
}
