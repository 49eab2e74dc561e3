//! k-Nearest-Neighbor Localization in Signal Space
//!
//! ## Overview
//!
//! A live scan is compared with every stored fingerprint; the `k` closest ones
//! are averaged into a position.
//!
//! ```text
//! for each fingerprint f:
//!     shared(scan, f) == 0          → skip
//!     for bssid in scan ∪ f:
//!         live   = scan[bssid]       or penalty (-100 dBm)
//!         stored = f.signals[bssid]  or (penalty, default_std)
//!         sum   += metric.term(live, stored)
//!     d(f) = metric.finish(sum)
//!
//! sort by d ascending, take k, average the coordinates
//! ```
//!
//! ## Design Rationale
//!
//! 1. **Shared-BSSID pre-filter**: a fingerprint with nothing in common with
//!    the scan would be scored purely on penalty terms. Skipping it keeps such
//!    noise out of the neighbour set, and means a scan that matches nothing
//!    yields `None` instead of a centroid of unrelated places.
//!
//! 2. **Unweighted centroid**: the result is the plain mean of the neighbour
//!    coordinates, not an inverse-distance weighted average. This is the
//!    intended behavior.
//!
//! 3. **Determinism**: scans and fingerprints are ordered maps, and ties in
//!    distance are broken by fingerprint timestamp, so the same inputs always
//!    give a bit-identical result.

use crate::config::LocalizerConfig;
use crate::errors::TrackResult;
use crate::index::{Fingerprint, FingerprintIndex, SignalStats};
use crate::metrics::SignalMetric;
use crate::time::Timestamp;
use crate::types::{Coordinates, Scan};

/// A fingerprint selected as one of the k nearest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Timestamp identifying the fingerprint
    pub timestamp_ms: Timestamp,
    /// Where it was recorded
    pub coords: Coordinates,
    /// Signal-space distance to the scan
    pub distance: f64,
}

/// Result of a successful localization
#[derive(Debug, Clone, PartialEq)]
pub struct Localization {
    /// Unweighted centroid of the neighbours
    pub coords: Coordinates,
    /// Selected fingerprints, closest first
    pub neighbors: Vec<Neighbor>,
}

impl Localization {
    /// Number of fingerprints averaged
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }
}

/// Signal-space k-NN localizer
pub struct Localizer {
    config: LocalizerConfig,
    metric: Box<dyn SignalMetric>,
}

impl std::fmt::Debug for Localizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Localizer")
            .field("config", &self.config)
            .field("metric", &self.metric.name())
            .finish()
    }
}

impl Localizer {
    /// Create a localizer using the metric selected in `config`
    pub fn new(config: LocalizerConfig) -> TrackResult<Self> {
        config.validate()?;
        let metric = config.metric.build(&config);
        Ok(Self { config, metric })
    }

    /// Create a localizer with a caller-supplied metric
    pub fn with_metric(config: LocalizerConfig, metric: Box<dyn SignalMetric>) -> TrackResult<Self> {
        config.validate()?;
        Ok(Self { config, metric })
    }

    /// Active parameters
    pub fn config(&self) -> &LocalizerConfig {
        &self.config
    }

    /// Signal-space distance between `scan` and one fingerprint
    ///
    /// Returns `None` when they share no BSSID.
    pub fn distance(&self, scan: &Scan, fingerprint: &Fingerprint) -> Option<f64> {
        if fingerprint.shared_with(scan.iter().map(|(bssid, _)| bssid)) == 0 {
            return None;
        }
        let signals = &fingerprint.signals;

        let missing = SignalStats {
            avg: self.config.penalty_rssi,
            std: self.config.default_std,
        };

        let mut sum = 0.0;
        // Every BSSID in the scan, then those only the fingerprint has
        for (bssid, live) in scan.iter() {
            let stored = signals.get(bssid).copied().unwrap_or(missing);
            sum += self.metric.term(live, stored);
        }
        for (bssid, stored) in signals {
            if !scan.contains(bssid) {
                sum += self.metric.term(self.config.penalty_rssi, *stored);
            }
        }

        Some(self.metric.finish(sum))
    }

    /// Estimate the position of `scan`, or `None` when no fingerprint matches
    pub fn locate(&self, index: &FingerprintIndex, scan: &Scan) -> Option<Localization> {
        let mut candidates: Vec<Neighbor> = index
            .iter()
            .filter_map(|(timestamp_ms, fp)| {
                self.distance(scan, fp).map(|distance| Neighbor {
                    timestamp_ms,
                    coords: fp.coords,
                    distance,
                })
            })
            .collect();

        if candidates.is_empty() {
            log_info!(
                "No fingerprint shares an access point with the scan ({} BSSIDs, {} fingerprints)",
                scan.len(),
                index.len()
            );
            return None;
        }

        // Stable sort over timestamp-ordered input: ties keep the older fingerprint first
        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        candidates.truncate(self.config.k);

        let n = candidates.len() as f64;
        let (lat_sum, lon_sum) = candidates
            .iter()
            .fold((0.0, 0.0), |(lat, lon), c| (lat + c.coords.lat, lon + c.coords.lon));
        let coords = Coordinates::new(lat_sum / n, lon_sum / n);

        log_info!(
            "Localized with {} neighbours ({}): ({:.6}, {:.6})",
            candidates.len(),
            self.metric.name(),
            coords.lat,
            coords.lon
        );

        Some(Localization {
            coords,
            neighbors: candidates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricKind;
    use crate::types::{Measurement, Method, RssiSample};

    fn row(ts: Timestamp, bssid: &str, avg: f64, std: f64, lat: f64, lon: f64) -> Measurement {
        let sample = RssiSample::new(ts, bssid, avg, avg, std, 6);
        Measurement::from_sample(&sample, Coordinates::new(lat, lon), Method::Interpolated)
    }

    fn fingerprint(signals: &[(&str, f64, f64)]) -> Fingerprint {
        Fingerprint {
            coords: Coordinates::new(1.0, 1.0),
            signals: signals
                .iter()
                .map(|(bssid, avg, std)| (bssid.to_string(), SignalStats { avg: *avg, std: *std }))
                .collect(),
        }
    }

    fn sample_index() -> FingerprintIndex {
        let rows = vec![
            row(1000, "a", -50.0, 2.0, 10.0, 20.0),
            row(1000, "b", -70.0, 2.0, 10.0, 20.0),
            row(2000, "a", -60.0, 2.0, 10.1, 20.1),
            row(2000, "b", -60.0, 2.0, 10.1, 20.1),
            row(3000, "a", -80.0, 2.0, 10.2, 20.2),
            row(3000, "c", -50.0, 2.0, 10.2, 20.2),
            row(4000, "z", -40.0, 2.0, 50.0, 50.0),
        ];
        FingerprintIndex::build(&rows)
    }

    fn localizer(k: usize) -> Localizer {
        Localizer::new(LocalizerConfig::default().k(k)).unwrap()
    }

    #[test]
    fn closest_fingerprint_wins_with_k_one() {
        let scan: Scan = vec![("a", -51.0), ("b", -69.0)].into_iter().collect();
        let result = localizer(1).locate(&sample_index(), &scan).unwrap();

        assert_eq!(result.neighbor_count(), 1);
        assert_eq!(result.neighbors[0].timestamp_ms, 1000);
        assert_eq!(result.coords, Coordinates::new(10.0, 20.0));
    }

    #[test]
    fn unrelated_fingerprints_are_skipped() {
        let scan: Scan = vec![("a", -51.0), ("b", -69.0)].into_iter().collect();
        let result = localizer(10).locate(&sample_index(), &scan).unwrap();

        // Fingerprint 4000 only has "z"
        assert_eq!(result.neighbor_count(), 3);
        assert!(result.neighbors.iter().all(|n| n.timestamp_ms != 4000));
    }

    #[test]
    fn centroid_is_unweighted() {
        let scan: Scan = vec![("a", -51.0), ("b", -69.0)].into_iter().collect();
        let result = localizer(3).locate(&sample_index(), &scan).unwrap();

        assert!((result.coords.lat - 10.1).abs() < 1e-9);
        assert!((result.coords.lon - 20.1).abs() < 1e-9);
        assert!(result.neighbors.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn no_shared_bssid_is_no_estimate() {
        let scan: Scan = vec![("unknown", -40.0)].into_iter().collect();
        assert!(localizer(3).locate(&sample_index(), &scan).is_none());
        assert!(localizer(3).locate(&FingerprintIndex::default(), &scan).is_none());
    }

    #[test]
    fn missing_signals_use_penalty() {
        let loc = localizer(3);
        let fp = fingerprint(&[("a", -60.0, 1.0), ("b", -90.0, 1.0)]);

        // "a" exact; "b" missing from scan -> (-100 - -90)^2 / 1; "c" missing from fingerprint -> (-80 - -100)^2 / 25
        let scan: Scan = vec![("a", -60.0), ("c", -80.0)].into_iter().collect();
        let d = loc.distance(&scan, &fp).unwrap();
        assert!((d - libm::sqrt(100.0 + 16.0)).abs() < 1e-12);
    }

    #[test]
    fn euclidean_metric_is_selectable() {
        let loc = Localizer::new(LocalizerConfig::default().metric(MetricKind::Euclidean)).unwrap();
        let fp = fingerprint(&[("a", -60.0, 0.1)]);

        let scan: Scan = vec![("a", -57.0)].into_iter().collect();
        assert_eq!(loc.distance(&scan, &fp), Some(3.0));
    }

    #[test]
    fn disjoint_fingerprint_has_no_distance() {
        let fp = fingerprint(&[("a", -60.0, 1.0)]);
        let scan: Scan = vec![("b", -60.0)].into_iter().collect();
        assert_eq!(localizer(3).distance(&scan, &fp), None);
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let index = sample_index();
        let scan: Scan = vec![("a", -58.0), ("b", -64.0), ("c", -75.0)].into_iter().collect();
        let loc = localizer(3);

        let first = loc.locate(&index, &scan).unwrap();
        let second = loc.locate(&index, &scan).unwrap();
        assert_eq!(first.coords.lat.to_bits(), second.coords.lat.to_bits());
        assert_eq!(first.coords.lon.to_bits(), second.coords.lon.to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn distance_ties_prefer_older_fingerprint() {
        let rows = vec![
            row(2000, "a", -60.0, 2.0, 2.0, 2.0),
            row(1000, "a", -60.0, 2.0, 1.0, 1.0),
        ];
        let index = FingerprintIndex::build(&rows);
        let scan: Scan = vec![("a", -60.0)].into_iter().collect();

        let result = localizer(1).locate(&index, &scan).unwrap();
        assert_eq!(result.neighbors[0].timestamp_ms, 1000);
    }
}
