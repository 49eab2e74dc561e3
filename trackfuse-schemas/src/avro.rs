//! Avro history export
//!
//! Measurement and estimate history is written as Avro object container
//! files: the schema travels in the header, so an export stays readable after
//! the database it came from is gone. Scanner uploads can be archived the same
//! way, exactly as received, and replayed later through the engine.
//!
//! Every container is written with the latest registered version of its
//! schema.
//!
//! ```rust
//! use trackfuse_core::{Coordinates, Measurement, Method, RssiSample};
//! use trackfuse_schemas::avro::{decode_measurements, encode_measurements};
//!
//! let sample = RssiSample::new(2_500, "AA:BB", -60.0, -60.0, 1.0, 6);
//! let rows = vec![Measurement::from_sample(&sample, Coordinates::new(10.0, 20.0), Method::Static)];
//!
//! let bytes = encode_measurements(&rows)?;
//! assert_eq!(decode_measurements(&bytes)?, rows);
//! # Ok::<(), trackfuse_schemas::SchemaError>(())
//! ```

use apache_avro::{from_value, Reader, Writer};
use serde::{Deserialize, Serialize};

use trackfuse_core::{Estimate, Measurement, Method};

use crate::payload::{NetworkItem, ScanBatchPayload};
use crate::{SchemaError, GLOBAL_REGISTRY};

/// Wire shape of `measurement_v1`
#[derive(Debug, Serialize, Deserialize)]
struct MeasurementRecord {
    timestamp: i64,
    bssid: String,
    rssi_avg: f64,
    rssi_med: f64,
    rssi_std: f64,
    channel: i32,
    lat: f64,
    lon: f64,
    method: String,
}

impl MeasurementRecord {
    fn from_measurement(m: &Measurement) -> Result<Self, SchemaError> {
        Ok(Self {
            timestamp: to_long(m.timestamp_ms)?,
            bssid: m.bssid.clone(),
            rssi_avg: m.rssi_avg,
            rssi_med: m.rssi_med,
            rssi_std: m.rssi_std,
            channel: m.channel,
            lat: m.lat,
            lon: m.lon,
            method: m.method.as_str().to_string(),
        })
    }

    fn into_measurement(self) -> Result<Measurement, SchemaError> {
        let timestamp_ms = u64::try_from(self.timestamp)
            .map_err(|_| SchemaError::Decode(format!("negative timestamp {}", self.timestamp)))?;
        let method: Method = self
            .method
            .parse()
            .map_err(|e: trackfuse_core::types::UnknownMethod| SchemaError::Decode(e.to_string()))?;

        Ok(Measurement {
            timestamp_ms,
            bssid: self.bssid,
            rssi_avg: self.rssi_avg,
            rssi_med: self.rssi_med,
            rssi_std: self.rssi_std,
            channel: self.channel,
            lat: self.lat,
            lon: self.lon,
            method,
        })
    }
}

/// Wire shape of `estimate_v1`
#[derive(Debug, Serialize, Deserialize)]
struct EstimateRecord {
    timestamp: i64,
    lat: f64,
    lon: f64,
    nb_neighbors: i64,
}

/// Wire shape of one `scan_batch_v1` network; a missing SSID is `""`
#[derive(Debug, Serialize, Deserialize)]
struct NetworkRecord {
    bssid: String,
    ssid: String,
    rssi_avg: f64,
    rssi_med: f64,
    rssi_std: f64,
    channel: i32,
}

/// Wire shape of `scan_batch_v1`
#[derive(Debug, Serialize, Deserialize)]
struct ScanBatchRecord {
    timestamp: i64,
    networks: Vec<NetworkRecord>,
}

impl ScanBatchRecord {
    fn from_payload(batch: &ScanBatchPayload) -> Result<Self, SchemaError> {
        Ok(Self {
            timestamp: to_long(batch.timestamp)?,
            networks: batch
                .networks
                .iter()
                .map(|net| NetworkRecord {
                    bssid: net.bssid.clone(),
                    ssid: net.ssid.clone().unwrap_or_default(),
                    rssi_avg: net.rssi_avg,
                    rssi_med: net.rssi_med,
                    rssi_std: net.rssi_std,
                    channel: net.channel,
                })
                .collect(),
        })
    }

    fn into_payload(self) -> Result<ScanBatchPayload, SchemaError> {
        let timestamp = u64::try_from(self.timestamp)
            .map_err(|_| SchemaError::Decode(format!("negative timestamp {}", self.timestamp)))?;
        Ok(ScanBatchPayload {
            timestamp,
            networks: self
                .networks
                .into_iter()
                .map(|net| NetworkItem {
                    bssid: net.bssid,
                    ssid: Some(net.ssid).filter(|ssid| !ssid.is_empty()),
                    rssi_avg: net.rssi_avg,
                    rssi_med: net.rssi_med,
                    rssi_std: net.rssi_std,
                    channel: net.channel,
                })
                .collect(),
        })
    }
}

fn to_long(value: u64) -> Result<i64, SchemaError> {
    i64::try_from(value).map_err(|_| SchemaError::TimestampOverflow(value))
}

fn write_container<T: Serialize>(base_name: &str, records: &[T]) -> Result<Vec<u8>, SchemaError> {
    let schema = GLOBAL_REGISTRY.get_latest(base_name)?;
    let mut writer = Writer::new(&schema, Vec::new());
    for record in records {
        writer
            .append_ser(record)
            .map_err(|e| SchemaError::Encode(e.to_string()))?;
    }
    writer.into_inner().map_err(|e| SchemaError::Encode(e.to_string()))
}

/// Encode measurements as an Avro container using `measurement_v1`
pub fn encode_measurements(measurements: &[Measurement]) -> Result<Vec<u8>, SchemaError> {
    let records = measurements
        .iter()
        .map(MeasurementRecord::from_measurement)
        .collect::<Result<Vec<_>, _>>()?;
    write_container("measurement", &records)
}

/// Decode a container written by [`encode_measurements`]
pub fn decode_measurements(bytes: &[u8]) -> Result<Vec<Measurement>, SchemaError> {
    read_container::<MeasurementRecord>("measurement", bytes)?
        .into_iter()
        .map(MeasurementRecord::into_measurement)
        .collect()
}

fn read_container<T>(base_name: &str, bytes: &[u8]) -> Result<Vec<T>, SchemaError>
where
    T: for<'de> Deserialize<'de>,
{
    let schema = GLOBAL_REGISTRY.get_latest(base_name)?;
    let reader = Reader::with_schema(&schema, bytes).map_err(|e| SchemaError::Decode(e.to_string()))?;

    reader
        .map(|value| {
            let value = value.map_err(|e| SchemaError::Decode(e.to_string()))?;
            from_value(&value).map_err(|e| SchemaError::Decode(e.to_string()))
        })
        .collect()
}

/// Encode estimates as an Avro container using `estimate_v1`
pub fn encode_estimates(estimates: &[Estimate]) -> Result<Vec<u8>, SchemaError> {
    let records = estimates
        .iter()
        .map(|e| {
            Ok(EstimateRecord {
                timestamp: to_long(e.timestamp_ms)?,
                lat: e.lat,
                lon: e.lon,
                nb_neighbors: to_long(e.neighbor_count as u64)?,
            })
        })
        .collect::<Result<Vec<_>, SchemaError>>()?;
    write_container("estimate", &records)
}

/// Archive scanner uploads as received, timestamps still in seconds
pub fn encode_scan_batches(batches: &[ScanBatchPayload]) -> Result<Vec<u8>, SchemaError> {
    let records = batches
        .iter()
        .map(ScanBatchRecord::from_payload)
        .collect::<Result<Vec<_>, _>>()?;
    write_container("scan_batch", &records)
}

/// Decode an archive written by [`encode_scan_batches`]
pub fn decode_scan_batches(bytes: &[u8]) -> Result<Vec<ScanBatchPayload>, SchemaError> {
    read_container::<ScanBatchRecord>("scan_batch", bytes)?
        .into_iter()
        .map(ScanBatchRecord::into_payload)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro::types::Value;
    use trackfuse_core::{Coordinates, RssiSample};

    fn measurement(ts: u64, method: Method) -> Measurement {
        let sample = RssiSample::new(ts, "AA:BB", -60.0, -59.5, 1.25, 6);
        Measurement::from_sample(&sample, Coordinates::new(10.0005, 20.0015), method)
    }

    #[test]
    fn measurements_survive_export() {
        let rows = vec![measurement(2500, Method::Interpolated), measurement(3500, Method::Static)];
        let bytes = encode_measurements(&rows).unwrap();
        assert_eq!(decode_measurements(&bytes).unwrap(), rows);
    }

    #[test]
    fn empty_history_is_a_valid_container() {
        let bytes = encode_measurements(&[]).unwrap();
        assert!(decode_measurements(&bytes).unwrap().is_empty());
    }

    #[test]
    fn out_of_range_timestamp_is_rejected() {
        let rows = vec![measurement(u64::MAX, Method::Static)];
        assert!(matches!(
            encode_measurements(&rows),
            Err(SchemaError::TimestampOverflow(_))
        ));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            decode_measurements(b"not avro"),
            Err(SchemaError::Decode(_))
        ));
    }

    #[test]
    fn scan_batches_are_archived_as_received() {
        let json = r#"{
            "timestamp": 1700000000,
            "networks": [
                { "bssid": "aa", "ssid": "lab", "rssi_avg": -61.5, "rssi_med": -61.0, "rssi_std": 1.2, "channel": 6 },
                { "bssid": "bb", "rssi_avg": -80.0, "rssi_med": -80.0, "rssi_std": 0.0, "channel": 11 }
            ]
        }"#;
        let batch: ScanBatchPayload = serde_json::from_str(json).unwrap();

        let bytes = encode_scan_batches(std::slice::from_ref(&batch)).unwrap();
        let restored = decode_scan_batches(&bytes).unwrap();

        assert_eq!(restored, vec![batch]);
        assert_eq!(restored[0].networks[1].ssid, None);
    }

    #[test]
    fn estimates_carry_neighbour_count() {
        let estimates = vec![Estimate { lat: 1.0, lon: 2.0, timestamp_ms: 9000, neighbor_count: 3 }];
        let bytes = encode_estimates(&estimates).unwrap();

        let values: Vec<Value> = Reader::new(&bytes[..])
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(values.len(), 1);
        match &values[0] {
            Value::Record(fields) => {
                assert!(fields.contains(&("nb_neighbors".to_string(), Value::Long(3))));
                assert!(fields.contains(&("timestamp".to_string(), Value::Long(9000))));
            }
            other => panic!("expected a record, got {other:?}"),
        }
    }
}
