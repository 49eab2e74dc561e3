//! Boundary Shapes and Avro Schemas for Trackfuse
//!
//! ## Overview
//!
//! Everything that crosses the edge of the fusion engine is defined here:
//!
//! - [`payload`]: the JSON bodies exchanged with the scanner, the phone and
//!   the dashboard, and their conversion into core types
//! - [`schemas`]: Avro record schemas for the measurement and estimate history
//!   and for archived scanner uploads
//! - [`registry`]: versioned schema lookup, with a process-wide default
//! - [`avro`]: export and import of history as Avro object container files
//!
//! ## Units at the Boundary
//!
//! The scanner stamps batches in **seconds**; the core works in
//! **milliseconds**. [`payload::ScanBatchPayload`] performs the `× 1000`
//! conversion with overflow checking. GPS payloads already carry milliseconds
//! and may omit the timestamp entirely, in which case the caller's
//! [`trackfuse_core::time::TimeSource`] supplies it.
//!
//! ## Schema Evolution Strategy
//!
//! 1. **Always Append**: new fields are added, never removed
//! 2. **Default Values**: old consumers ignore new fields
//! 3. **Version in Name**: `measurement_v1`, `measurement_v2`
//!
//! ## Usage Example
//!
//! ```rust
//! use trackfuse_schemas::payload::ScanBatchPayload;
//!
//! let payload: ScanBatchPayload = serde_json::from_str(r#"{
//!     "timestamp": 1700000000,
//!     "networks": [
//!         { "bssid": "aa:bb:cc:dd:ee:ff", "ssid": "lab",
//!           "rssi_avg": -61.5, "rssi_med": -61.0, "rssi_std": 1.2, "channel": 6 }
//!     ]
//! }"#)?;
//!
//! let samples = payload.into_samples()?;
//! assert_eq!(samples[0].timestamp_ms, 1_700_000_000_000);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod avro;
pub mod payload;
pub mod registry;
pub mod schemas;

pub use registry::{SchemaMetadata, SchemaRegistry, GLOBAL_REGISTRY};

/// Schema-related errors
#[derive(Debug, thiserror_no_std::Error)]
pub enum SchemaError {
    /// An Avro schema definition could not be parsed
    #[error("Failed to parse schema: {0}")]
    ParseError(String),

    /// No schema registered under the requested name
    #[error("Schema not found: {0}")]
    NotFound(String),

    /// A schema was rejected at registration
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Writing an Avro container failed
    #[error("Avro encoding failed: {0}")]
    Encode(String),

    /// Reading an Avro container failed, or a record did not fit the model
    #[error("Avro decoding failed: {0}")]
    Decode(String),

    /// A timestamp does not fit the target representation
    #[error("Timestamp {0} out of range")]
    TimestampOverflow(u64),
}
