//! Training and Query Example
//!
//! Walks a device along a short east-bound path while the scanner reports two
//! access points, then localizes a live scan against the recorded fingerprints.
//!
//! ## What You'll Learn
//!
//! - Feeding GPS fixes and RSSI batches into a `TrackingEngine`
//! - Reading the `ReconcileReport` returned by every ingestion call
//! - Localizing a scan and reading the cached position
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_training_and_query
//! ```

use trackfuse_core::{
    GpsFix, MemoryStore, RssiSample, Scan, TrackError, TrackingConfig, TrackingEngine,
};

fn main() -> Result<(), TrackError> {
    let engine = TrackingEngine::new(MemoryStore::new(), TrackingConfig::default())?;

    println!("=== Training ===");
    for step in 0..10u64 {
        let t = 1_000 + step * 2_000;
        let lon = 2.3500 + step as f64 * 0.0002;

        let report = engine.ingest_gps_fix(GpsFix::new(t, 48.8566, lon))?;
        if report.written > 0 {
            println!("  t={t}: {} measurements written", report.written);
        }

        // The scanner reports one second after each fix; "west" fades as "east" grows
        let scan_t = t + 1_000;
        let west = -45.0 - step as f64 * 4.0;
        let east = -85.0 + step as f64 * 4.0;
        engine.ingest_rssi_batch(vec![
            RssiSample::new(scan_t, "aa:aa:aa:aa:aa:01", west, west, 1.5, 1),
            RssiSample::new(scan_t, "aa:aa:aa:aa:aa:02", east, east, 1.5, 11),
        ])?;
    }

    let levels = engine.buffered()?;
    println!(
        "  {} measurements stored, {} samples / {} fixes buffered",
        engine.measurement_history()?.len(),
        levels.rssi,
        levels.gps
    );

    println!("\n=== Query ===");
    let scan: Scan = vec![("aa:aa:aa:aa:aa:01", -62.0), ("aa:aa:aa:aa:aa:02", -68.0)]
        .into_iter()
        .collect();

    match engine.locate(&scan, 30_000)? {
        Some(estimate) => println!(
            "  Estimated ({:.6}, {:.6}) from {} neighbours",
            estimate.lat, estimate.lon, estimate.neighbor_count
        ),
        None => println!("  No fingerprint matches this scan"),
    }

    if let Some(last) = engine.last_position()? {
        println!("  Cached position at t={}", last.timestamp_ms);
    }

    Ok(())
}
