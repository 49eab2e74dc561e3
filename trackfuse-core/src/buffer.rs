//! Ingest Buffers for Unreconciled Sensor Input
//!
//! ## Overview
//!
//! Two append-only collections accumulate input from two independent senders:
//! the WiFi scanner (RSSI batches) and the smartphone (GPS fixes). Neither
//! sender knows about the other, so their data arrives interleaved and, across
//! network retries, out of order.
//!
//! ```text
//! scanner ──→ rssi: [s(2500) s(2500) s(1200) ...]
//! phone   ──→ gps:  [g(1000) g(3000) g(2000) ...]
//! ```
//!
//! ## Ordering
//!
//! Appends never sort. The reconciler calls [`IngestBuffers::sort_by_timestamp`]
//! at the start of each pass, so the result of a pass depends only on the
//! buffer *contents*, never on the order the calls arrived in. Entries sharing
//! a timestamp are ordered by their remaining fields, so two fixes stamped with
//! the same millisecond always end up in the same relative position.
//!
//! ## Bounds
//!
//! There is no capacity limit. Every ingestion call triggers a reconciliation
//! pass, which consumes resolvable samples and evicts GPS fixes that can no
//! longer bracket anything, so the buffers stay small as long as both senders
//! keep sending.
//!
//! ## Thread Safety
//!
//! This type is not thread-safe. The reconciler both reads and destructively
//! rewrites these buffers, so appends and passes must be serialized through a
//! single lock; [`crate::TrackingEngine`] holds it in a `Mutex`.

use std::cmp::Ordering;

use crate::time::Timestamp;
use crate::types::{GpsFix, RssiSample};

fn cmp_fix(a: &GpsFix, b: &GpsFix) -> Ordering {
    a.timestamp_ms
        .cmp(&b.timestamp_ms)
        .then_with(|| a.lat.total_cmp(&b.lat))
        .then_with(|| a.lon.total_cmp(&b.lon))
}

fn cmp_sample(a: &RssiSample, b: &RssiSample) -> Ordering {
    a.timestamp_ms
        .cmp(&b.timestamp_ms)
        .then_with(|| a.bssid.cmp(&b.bssid))
        .then_with(|| a.rssi_avg.total_cmp(&b.rssi_avg))
        .then_with(|| a.rssi_med.total_cmp(&b.rssi_med))
        .then_with(|| a.rssi_std.total_cmp(&b.rssi_std))
        .then_with(|| a.channel.cmp(&b.channel))
}

/// RSSI and GPS input waiting to be reconciled
#[derive(Debug, Clone, Default)]
pub struct IngestBuffers {
    /// Samples not yet converted to measurements
    rssi: Vec<RssiSample>,

    /// Fixes still needed to bracket current or future samples
    gps: Vec<GpsFix>,
}

impl IngestBuffers {
    /// Creates empty buffers
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a scanner batch as-is: no validation, no deduplication
    pub fn append_rssi_batch<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = RssiSample>,
    {
        self.rssi.extend(batch);
    }

    /// Appends one GPS fix
    pub fn append_gps_fix(&mut self, fix: GpsFix) {
        self.gps.push(fix);
    }

    /// Buffered RSSI samples
    pub fn rssi(&self) -> &[RssiSample] {
        &self.rssi
    }

    /// Buffered GPS fixes
    pub fn gps(&self) -> &[GpsFix] {
        &self.gps
    }

    /// Number of buffered RSSI samples
    pub fn rssi_len(&self) -> usize {
        self.rssi.len()
    }

    /// Number of buffered GPS fixes
    pub fn gps_len(&self) -> usize {
        self.gps.len()
    }

    /// Check if both buffers are empty
    pub fn is_empty(&self) -> bool {
        self.rssi.is_empty() && self.gps.is_empty()
    }

    /// Sorts both buffers ascending by timestamp, ties broken on every other field
    pub fn sort_by_timestamp(&mut self) {
        self.gps.sort_by(cmp_fix);
        self.rssi.sort_by(cmp_sample);
    }

    /// Timestamp of the oldest buffered sample, if the buffer is sorted
    pub fn oldest_rssi_timestamp(&self) -> Option<Timestamp> {
        self.rssi.first().map(|sample| sample.timestamp_ms)
    }

    /// Replaces the RSSI buffer with the samples a pass could not resolve yet
    pub(crate) fn replace_rssi(&mut self, deferred: Vec<RssiSample>) {
        self.rssi = deferred;
    }

    /// Drops the first `count` GPS fixes (the oldest once sorted)
    pub(crate) fn evict_gps_front(&mut self, count: usize) {
        let count = count.min(self.gps.len());
        self.gps.drain(..count);
    }

    /// Clear all buffered input
    pub fn clear(&mut self) {
        self.rssi.clear();
        self.gps.clear();
    }
}
