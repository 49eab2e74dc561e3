//! Trackfuse Avro schemas
//!
//! Field names follow the SQLite columns so that exported history lines up
//! with the database it came from.

use apache_avro::Schema;
use serde_json::json;

use crate::SchemaError;

/// Located RSSI measurement schema v1
pub fn measurement_v1() -> Result<Schema, SchemaError> {
    let schema_json = json!({
        "namespace": "io.trackfuse.fingerprints.v1",
        "type": "record",
        "name": "Measurement",
        "doc": "One access point heard at a reconciled location",
        "fields": [
            {
                "name": "timestamp",
                "type": "long",
                "logicalType": "timestamp-millis",
                "doc": "Scanner batch time in milliseconds since epoch"
            },
            { "name": "bssid", "type": "string" },
            { "name": "rssi_avg", "type": "double", "doc": "dBm" },
            { "name": "rssi_med", "type": "double", "doc": "dBm" },
            { "name": "rssi_std", "type": "double", "doc": "dB" },
            { "name": "channel", "type": "int" },
            { "name": "lat", "type": "double" },
            { "name": "lon", "type": "double" },
            {
                "name": "method",
                "type": "string",
                "doc": "static or interpolated"
            }
        ]
    });

    Schema::parse(&schema_json).map_err(|e| SchemaError::ParseError(e.to_string()))
}

/// Position estimate schema v1
pub fn estimate_v1() -> Result<Schema, SchemaError> {
    let schema_json = json!({
        "namespace": "io.trackfuse.estimates.v1",
        "type": "record",
        "name": "Estimate",
        "doc": "k-NN position estimate for a live scan",
        "fields": [
            {
                "name": "timestamp",
                "type": "long",
                "logicalType": "timestamp-millis"
            },
            { "name": "lat", "type": "double" },
            { "name": "lon", "type": "double" },
            {
                "name": "nb_neighbors",
                "type": "long",
                "doc": "Fingerprints averaged into the estimate"
            }
        ]
    });

    Schema::parse(&schema_json).map_err(|e| SchemaError::ParseError(e.to_string()))
}

/// Raw scanner batch schema v1, for archiving uploads as received
pub fn scan_batch_v1() -> Result<Schema, SchemaError> {
    let schema_json = json!({
        "namespace": "io.trackfuse.scanner.v1",
        "type": "record",
        "name": "ScanBatch",
        "fields": [
            {
                "name": "timestamp",
                "type": "long",
                "doc": "Batch time in seconds since epoch"
            },
            {
                "name": "networks",
                "type": {
                    "type": "array",
                    "items": {
                        "type": "record",
                        "name": "NetworkItem",
                        "fields": [
                            { "name": "bssid", "type": "string" },
                            { "name": "ssid", "type": "string", "default": "" },
                            { "name": "rssi_avg", "type": "double" },
                            { "name": "rssi_med", "type": "double" },
                            { "name": "rssi_std", "type": "double" },
                            { "name": "channel", "type": "int" }
                        ]
                    }
                }
            }
        ]
    });

    Schema::parse(&schema_json).map_err(|e| SchemaError::ParseError(e.to_string()))
}
