//! Fingerprint index rebuilt from stored measurements
//!
//! Measurements sharing a timestamp were produced from one scanner batch at one
//! location, so they are grouped into a single [`Fingerprint`] carrying every
//! access point heard in that batch.
//!
//! The index is rebuilt on every localization call. There is no incremental
//! maintenance: a rebuild is a linear pass over the stored rows and runs far
//! less often than ingestion.

use std::collections::BTreeMap;

use crate::errors::TrackResult;
use crate::time::Timestamp;
use crate::traits::MeasurementStore;
use crate::types::{Coordinates, Measurement};

/// Stored RSSI statistics for one access point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalStats {
    /// Mean RSSI in dBm
    pub avg: f64,
    /// RSSI standard deviation in dB
    pub std: f64,
}

/// Location plus the signals recorded there
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    /// Where the batch was recorded
    pub coords: Coordinates,
    /// Access point statistics, keyed by BSSID
    pub signals: BTreeMap<String, SignalStats>,
}

impl Fingerprint {
    /// Number of BSSIDs also present in `bssids`
    pub fn shared_with<'a, I>(&self, bssids: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        bssids
            .into_iter()
            .filter(|bssid| self.signals.contains_key(*bssid))
            .count()
    }
}

/// Timestamp-ordered fingerprint collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FingerprintIndex {
    fingerprints: BTreeMap<Timestamp, Fingerprint>,
}

impl FingerprintIndex {
    /// Group measurements by timestamp, skipping `(0, 0)` placeholder rows
    ///
    /// Within a group the last row's coordinates win, and a BSSID repeated in
    /// the same group keeps its last statistics.
    pub fn build<'a, I>(measurements: I) -> Self
    where
        I: IntoIterator<Item = &'a Measurement>,
    {
        let mut fingerprints: BTreeMap<Timestamp, Fingerprint> = BTreeMap::new();

        for m in measurements {
            let coords = m.coords();
            if coords.is_placeholder() {
                continue;
            }

            let entry = fingerprints.entry(m.timestamp_ms).or_insert_with(|| Fingerprint {
                coords,
                signals: BTreeMap::new(),
            });
            entry.coords = coords;
            entry.signals.insert(
                m.bssid.clone(),
                SignalStats {
                    avg: m.rssi_avg,
                    std: m.rssi_std,
                },
            );
        }

        Self { fingerprints }
    }

    /// Read every valid measurement from `store` and build the index
    pub fn load<S: MeasurementStore + ?Sized>(store: &S) -> TrackResult<Self> {
        let rows = store.read_measurements()?;
        let index = Self::build(&rows);
        log_debug!(
            "Fingerprint index rebuilt: {} rows, {} fingerprints",
            rows.len(),
            index.len()
        );
        Ok(index)
    }

    /// Fingerprint recorded at `timestamp`
    pub fn get(&self, timestamp: Timestamp) -> Option<&Fingerprint> {
        self.fingerprints.get(&timestamp)
    }

    /// Number of fingerprints
    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    /// True when no usable measurement was stored
    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    /// Fingerprints in ascending timestamp order
    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, &Fingerprint)> + '_ {
        self.fingerprints.iter().map(|(ts, fp)| (*ts, fp))
    }
}
