//! Data model shared by every stage of the engine
//!
//! ```text
//! RssiSample ─┐
//!             ├─→ Measurement (persisted) ─→ Fingerprint (derived) ─→ Estimate
//! GpsFix ─────┘                                   ↑
//!                                           Scan (live)
//! ```
//!
//! Samples and fixes are transient and live in the ingest buffers until the
//! reconciler consumes them. Measurements are immutable once written.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinates {
    /// Latitude in degrees, positive north
    pub lat: f64,
    /// Longitude in degrees, positive east
    pub lon: f64,
}

impl Coordinates {
    /// The `(0, 0)` sentinel meaning "no fix yet".
    ///
    /// This conflates "unset" with the real point where the equator crosses
    /// the prime meridian. Stored rows at exactly that spot are ignored by
    /// the fingerprint index.
    pub const PLACEHOLDER: Coordinates = Coordinates { lat: 0.0, lon: 0.0 };

    /// Create a coordinate pair
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True for the `(0, 0)` "unset" sentinel
    pub fn is_placeholder(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }
}

/// One access point as seen in one scanner batch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RssiSample {
    /// Batch timestamp in milliseconds
    pub timestamp_ms: Timestamp,
    /// Access point identifier
    pub bssid: String,
    /// Mean RSSI over the scanner's sampling window, in dBm
    pub rssi_avg: f64,
    /// Median RSSI, in dBm
    pub rssi_med: f64,
    /// RSSI standard deviation, in dB
    pub rssi_std: f64,
    /// WiFi channel number
    pub channel: i32,
}

impl RssiSample {
    /// Create a sample
    pub fn new(
        timestamp_ms: Timestamp,
        bssid: impl Into<String>,
        rssi_avg: f64,
        rssi_med: f64,
        rssi_std: f64,
        channel: i32,
    ) -> Self {
        Self {
            timestamp_ms,
            bssid: bssid.into(),
            rssi_avg,
            rssi_med,
            rssi_std,
            channel,
        }
    }
}

/// A position report from the smartphone
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpsFix {
    /// Fix timestamp in milliseconds
    pub timestamp_ms: Timestamp,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

impl GpsFix {
    /// Create a fix
    pub const fn new(timestamp_ms: Timestamp, lat: f64, lon: f64) -> Self {
        Self { timestamp_ms, lat, lon }
    }

    /// Position of this fix
    pub fn coords(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// How a measurement's location was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Method {
    /// Copied from the earlier fix; the device did not move
    Static,
    /// Linearly blended between the two bracketing fixes
    Interpolated,
}

impl Method {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Interpolated => "interpolated",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(Self::Static),
            "interpolated" => Ok(Self::Interpolated),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

/// A stored method string that is neither `static` nor `interpolated`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown location method '{}'", self.0)
    }
}

impl std::error::Error for UnknownMethod {}

/// An RSSI sample fused with a location; the unit of the fingerprint database
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurement {
    /// Batch timestamp in milliseconds
    pub timestamp_ms: Timestamp,
    /// Access point identifier
    pub bssid: String,
    /// Mean RSSI, in dBm
    pub rssi_avg: f64,
    /// Median RSSI, in dBm
    pub rssi_med: f64,
    /// RSSI standard deviation, in dB
    pub rssi_std: f64,
    /// WiFi channel number
    pub channel: i32,
    /// Derived latitude
    pub lat: f64,
    /// Derived longitude
    pub lon: f64,
    /// How the location was derived
    pub method: Method,
}

impl Measurement {
    /// Combine a sample's signal fields with a derived location
    pub fn from_sample(sample: &RssiSample, location: Coordinates, method: Method) -> Self {
        Self {
            timestamp_ms: sample.timestamp_ms,
            bssid: sample.bssid.clone(),
            rssi_avg: sample.rssi_avg,
            rssi_med: sample.rssi_med,
            rssi_std: sample.rssi_std,
            channel: sample.channel,
            lat: location.lat,
            lon: location.lon,
            method,
        }
    }

    /// Location of this measurement
    pub fn coords(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// Output of a successful localization
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Estimate {
    /// Estimated latitude
    pub lat: f64,
    /// Estimated longitude
    pub lon: f64,
    /// Timestamp of the scan that produced it, in milliseconds
    pub timestamp_ms: Timestamp,
    /// Number of fingerprints averaged (at most k)
    pub neighbor_count: usize,
}

impl Estimate {
    /// Estimated position
    pub fn coords(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// A live scan: the strongest view of each access point
///
/// Keyed in a `BTreeMap` so that iteration order, and therefore the order of
/// floating-point accumulation in the distance metrics, is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Scan {
    signals: BTreeMap<String, f64>,
}

impl Scan {
    /// Create an empty scan
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an access point; a repeated BSSID overwrites the earlier value
    pub fn insert(&mut self, bssid: impl Into<String>, rssi: f64) {
        self.signals.insert(bssid.into(), rssi);
    }

    /// RSSI for `bssid`, if heard
    pub fn get(&self, bssid: &str) -> Option<f64> {
        self.signals.get(bssid).copied()
    }

    /// Whether `bssid` was heard
    pub fn contains(&self, bssid: &str) -> bool {
        self.signals.contains_key(bssid)
    }

    /// Number of distinct access points
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// True when nothing was heard
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Access points in BSSID order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.signals.iter().map(|(bssid, rssi)| (bssid.as_str(), *rssi))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Scan {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut scan = Scan::new();
        for (bssid, rssi) in iter {
            scan.insert(bssid, rssi);
        }
        scan
    }
}
