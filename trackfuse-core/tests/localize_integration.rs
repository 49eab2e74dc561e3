//! Integration tests for training followed by localization
//!
//! A device walks east while three access points change level with its
//! progress. Scans taken midway between fixes become fingerprints; live scans
//! are then matched against them.

mod common;

use trackfuse_core::{
    LocalizerConfig, MemoryStore, MetricKind, Scan, TrackingConfig, TrackingEngine,
};

use common::{path_batch, path_scan, straight_path};

const STEP_DEG: f64 = 0.0003;

/// Alternate fixes and scanner batches; batches land halfway between fixes
fn train(engine: &TrackingEngine<MemoryStore>) {
    let path = straight_path(0, 12, 2_000);
    for (i, fix) in path.iter().enumerate() {
        engine.ingest_gps_fix(*fix).unwrap();
        engine
            .ingest_rssi_batch(path_batch(fix.timestamp_ms + 1_000, i as f64 + 0.5))
            .unwrap();
    }
}

fn engine_with(localizer: LocalizerConfig) -> TrackingEngine<MemoryStore> {
    let config = TrackingConfig::default().with_localizer(localizer);
    let engine = TrackingEngine::new(MemoryStore::new(), config).unwrap();
    train(&engine);
    engine
}

#[test]
fn training_resolves_batches_bracketed_by_enough_fixes() {
    let engine = engine_with(LocalizerConfig::default());

    // Batches 0..=8 were resolved; the last three still wait for the fix floor
    assert_eq!(engine.measurement_history().unwrap().len(), 9 * 3);
    assert_eq!(engine.buffered().unwrap().rssi, 3 * 3);
}

#[test]
fn exact_scan_with_k_one_returns_its_fingerprint() {
    let engine = engine_with(LocalizerConfig::default().k(1));

    let estimate = engine.locate(&path_scan(4.5), 50_000).unwrap().unwrap();
    assert_eq!(estimate.neighbor_count, 1);
    assert!((estimate.lat - 45.0).abs() < 1e-9);
    assert!((estimate.lon - (7.0 + 4.5 * STEP_DEG)).abs() < 1e-9);
}

#[test]
fn three_neighbours_average_around_the_match() {
    let engine = engine_with(LocalizerConfig::default());

    let estimate = engine.locate(&path_scan(4.5), 50_000).unwrap().unwrap();
    assert_eq!(estimate.neighbor_count, 3);
    // Neighbours at 3.5, 4.5 and 5.5 steps
    assert!((estimate.lon - (7.0 + 4.5 * STEP_DEG)).abs() < 1e-9);
    assert_eq!(engine.last_position().unwrap(), Some(estimate));
}

#[test]
fn euclidean_metric_finds_the_same_match() {
    let engine = engine_with(LocalizerConfig::default().k(1).metric(MetricKind::Euclidean));

    let estimate = engine.locate(&path_scan(2.5), 50_000).unwrap().unwrap();
    assert!((estimate.lon - (7.0 + 2.5 * STEP_DEG)).abs() < 1e-9);
}

#[test]
fn unknown_access_points_give_no_estimate() {
    let engine = engine_with(LocalizerConfig::default());

    let scan: Scan = vec![("ff:ff:ff:ff:ff:ff", -50.0)].into_iter().collect();
    assert!(engine.locate(&scan, 50_000).unwrap().is_none());
    assert!(engine.last_position().unwrap().is_none());
}

#[test]
fn estimates_are_recorded_unless_disabled() {
    let engine = engine_with(LocalizerConfig::default());
    engine.locate(&path_scan(1.5), 50_000).unwrap();
    engine.locate(&path_scan(6.5), 52_000).unwrap();
    assert_eq!(engine.store().estimates().unwrap().len(), 2);

    let quiet = TrackingEngine::new(MemoryStore::new(), TrackingConfig::default().record_estimates(false))
        .unwrap();
    train(&quiet);
    quiet.locate(&path_scan(1.5), 50_000).unwrap();
    assert!(quiet.store().estimates().unwrap().is_empty());
    assert!(quiet.last_position().unwrap().is_some());
}
