//! JSON payloads exchanged with the scanner, the phone and the dashboard
//!
//! ```text
//! scanner ── ScanBatchPayload ──→ into_samples() ──→ Vec<RssiSample>   (training)
//!                             └─→ to_scan()      ──→ Scan              (query)
//! phone   ── GpsPayload ────────→ into_fix(clock) ─→ GpsFix
//!
//! engine  ── Estimate ──────────→ LastPosition / PositionResponse
//!         ── Measurement ───────→ MapPoint
//! ```

use serde::{Deserialize, Serialize};

use trackfuse_core::time::{seconds_to_ms, TimeSource};
use trackfuse_core::{Estimate, GpsFix, Measurement, RssiSample, Scan, Timestamp};

use crate::SchemaError;

/// One access point in a scanner report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkItem {
    /// Access point MAC address
    pub bssid: String,
    /// Network name; informational only, never stored
    #[serde(default)]
    pub ssid: Option<String>,
    /// Mean RSSI over the scan window (dBm)
    pub rssi_avg: f64,
    /// Median RSSI (dBm)
    pub rssi_med: f64,
    /// RSSI standard deviation (dB)
    pub rssi_std: f64,
    /// WiFi channel
    pub channel: i32,
}

/// A scanner report: one timestamp for every network heard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanBatchPayload {
    /// Batch time in **seconds** since epoch
    pub timestamp: u64,
    /// Networks heard during the window
    pub networks: Vec<NetworkItem>,
}

impl ScanBatchPayload {
    /// Batch time converted to milliseconds
    pub fn timestamp_ms(&self) -> Result<Timestamp, SchemaError> {
        seconds_to_ms(self.timestamp).ok_or(SchemaError::TimestampOverflow(self.timestamp))
    }

    /// Training samples, all stamped with the batch time
    pub fn into_samples(self) -> Result<Vec<RssiSample>, SchemaError> {
        let timestamp_ms = self.timestamp_ms()?;
        Ok(self
            .networks
            .into_iter()
            .map(|net| {
                RssiSample::new(
                    timestamp_ms,
                    net.bssid,
                    net.rssi_avg,
                    net.rssi_med,
                    net.rssi_std,
                    net.channel,
                )
            })
            .collect())
    }

    /// Live scan for localization: `bssid → rssi_avg`
    pub fn to_scan(&self) -> Scan {
        self.networks
            .iter()
            .map(|net| (net.bssid.as_str(), net.rssi_avg))
            .collect()
    }
}

/// A position report from the phone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPayload {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Fix time in **milliseconds**; absent means "now"
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

impl GpsPayload {
    /// Convert to a fix, stamping it from `clock` when no timestamp was sent
    pub fn into_fix(self, clock: &dyn TimeSource) -> GpsFix {
        let timestamp_ms = self.timestamp.unwrap_or_else(|| clock.now());
        GpsFix::new(timestamp_ms, self.lat, self.lon)
    }
}

/// Acknowledgement returned for ingestion calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestAck {
    /// Always `"OK"` when the request was accepted
    pub status: String,
    /// Number of networks accepted, for scanner batches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed: Option<usize>,
}

impl IngestAck {
    /// Acknowledge a scanner batch of `processed` networks
    pub fn batch(processed: usize) -> Self {
        Self {
            status: "OK".to_string(),
            processed: Some(processed),
        }
    }

    /// Acknowledge a GPS fix
    pub fn fix() -> Self {
        Self {
            status: "OK".to_string(),
            processed: None,
        }
    }
}

/// Bare coordinates of a query result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

/// Reply to a query scan; `position` is `null` when nothing matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionResponse {
    /// Always `"OK"`: no match is a valid outcome
    pub status: String,
    /// Estimated position, if any
    pub position: Option<Position>,
}

impl PositionResponse {
    /// Build the reply for an optional estimate
    pub fn from_estimate(estimate: Option<&Estimate>) -> Self {
        Self {
            status: "OK".to_string(),
            position: estimate.map(|e| Position { lat: e.lat, lon: e.lon }),
        }
    }
}

/// Most recent estimate as shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnownPosition {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Scan time in milliseconds
    pub timestamp: Timestamp,
    /// Fingerprints averaged into the estimate
    pub neighbors_count: usize,
}

/// Dashboard view of the position cache: the estimate, or `{}` before the first one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LastPosition {
    /// An estimate exists
    Known(KnownPosition),
    /// Nothing estimated yet; serializes as an empty object
    Unknown {},
}

impl From<Option<Estimate>> for LastPosition {
    fn from(estimate: Option<Estimate>) -> Self {
        match estimate {
            Some(e) => Self::Known(KnownPosition {
                lat: e.lat,
                lon: e.lon,
                timestamp: e.timestamp_ms,
                neighbors_count: e.neighbor_count,
            }),
            None => Self::Unknown {},
        }
    }
}

/// A stored measurement as drawn on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Batch time in milliseconds
    pub timestamp: Timestamp,
    /// Mean RSSI (dBm)
    pub rssi_avg: f64,
    /// `"static"` or `"interpolated"`
    pub method: String,
}

impl From<&Measurement> for MapPoint {
    fn from(m: &Measurement) -> Self {
        Self {
            lat: m.lat,
            lon: m.lon,
            timestamp: m.timestamp_ms,
            rssi_avg: m.rssi_avg,
            method: m.method.as_str().to_string(),
        }
    }
}
