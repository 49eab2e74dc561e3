//! Error Types for the Fusion Engine
//!
//! ## Design Philosophy
//!
//! Most of what can go wrong while fusing GPS and RSSI data is not an error at
//! all. It is an absence of data that resolves itself as more input arrives:
//!
//! | Situation              | Surfaced as                                   |
//! |------------------------|-----------------------------------------------|
//! | Fewer than 4 GPS fixes | `ReconcileReport::skipped`                    |
//! | GPS pair too far apart | `ReconcileReport::dropped_sparse`             |
//! | Sample before all GPS  | `ReconcileReport::dropped_before_history`     |
//! | No later GPS fix yet   | `ReconcileReport::deferred` (requeued)        |
//! | Scan matches nothing   | `Localizer::locate` returns `None`            |
//!
//! Only failures that leave the caller unable to trust the cycle become a
//! [`TrackError`]. Every variant is recoverable: no error ever means the
//! engine state is corrupt.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use trackfuse_core::{GpsFix, MemoryStore, TrackError, TrackingConfig, TrackingEngine};
//!
//! let engine = TrackingEngine::new(MemoryStore::new(), TrackingConfig::default())?;
//!
//! match engine.ingest_gps_fix(GpsFix::new(1_000, 10.0, 20.0)) {
//!     Ok(_report) => {
//!         // report.written measurements are durable
//!     }
//!     Err(TrackError::Persistence { .. }) => {
//!         // Buffers were left untouched; the next ingestion retries the pass
//!     }
//!     Err(_) => {
//!         // Configuration or lock problem - investigate
//!     }
//! }
//! # Ok::<(), TrackError>(())
//! ```

use thiserror_no_std::Error;

/// Result type for engine operations
pub type TrackResult<T> = Result<T, TrackError>;

/// Failures surfaced by the fusion engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    /// The persistence collaborator failed to read or write
    #[error("Persistence failure during {operation}: {reason}")]
    Persistence {
        /// Store operation that failed (e.g. "write_measurements")
        operation: &'static str,
        /// Backend error message
        reason: String,
    },

    /// A configuration value is outside its usable range
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Which constraint was violated
        reason: &'static str,
    },

    /// A thread panicked while holding one of the engine locks
    #[error("Lock poisoned: {resource}")]
    LockPoisoned {
        /// Name of the guarded resource
        resource: &'static str,
    },
}

impl TrackError {
    /// Build a persistence error from any displayable backend failure
    pub fn persistence(operation: &'static str, reason: impl core::fmt::Display) -> Self {
        Self::Persistence {
            operation,
            reason: reason.to_string(),
        }
    }

    /// True when the failure came from the storage collaborator
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}
