//! Integration tests for the SQLite store on disk
//!
//! - Fingerprints survive an engine restart
//! - A second connection reads while the engine writes (WAL)
//! - Estimate history is recorded alongside measurements

use std::sync::Arc;

use trackfuse_core::{GpsFix, RssiSample, Scan, TrackingConfig, TrackingEngine};
use trackfuse_store::SqliteStore;

fn train(engine: &TrackingEngine<Arc<SqliteStore>>) {
    let fixes = [
        GpsFix::new(1000, 48.0, 2.0),
        GpsFix::new(2000, 48.0, 2.0003),
        GpsFix::new(3000, 48.0, 2.0006),
    ];
    for fix in fixes {
        engine.ingest_gps_fix(fix).unwrap();
    }
    engine
        .ingest_rssi_batch(vec![
            RssiSample::new(1500, "ap:1", -50.0, -50.0, 1.0, 1),
            RssiSample::new(1500, "ap:2", -80.0, -80.0, 1.0, 6),
            RssiSample::new(2500, "ap:1", -65.0, -65.0, 1.0, 1),
            RssiSample::new(2500, "ap:2", -65.0, -65.0, 1.0, 6),
        ])
        .unwrap();
    let report = engine.ingest_gps_fix(GpsFix::new(4000, 48.0, 2.0009)).unwrap();
    assert_eq!(report.written, 4);
}

#[test]
fn fingerprints_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracking.db");

    {
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let engine = TrackingEngine::new(store, TrackingConfig::default()).unwrap();
        train(&engine);
    }

    let store = Arc::new(SqliteStore::open(&path).unwrap());
    let engine = TrackingEngine::new(Arc::clone(&store), TrackingConfig::default()).unwrap();
    assert_eq!(engine.measurement_history().unwrap().len(), 4);

    let scan: Scan = vec![("ap:1", -51.0), ("ap:2", -79.0)].into_iter().collect();
    let estimate = engine.locate(&scan, 10_000).unwrap().unwrap();
    assert_eq!(estimate.neighbor_count, 2);

    let history = store.estimate_history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].estimate, estimate);
}

#[test]
fn reader_sees_committed_batches() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracking.db");

    let writer = Arc::new(SqliteStore::open(&path).unwrap());
    let reader = SqliteStore::open(&path).unwrap();
    assert_eq!(reader.measurement_count().unwrap(), 0);

    let engine = TrackingEngine::new(Arc::clone(&writer), TrackingConfig::default()).unwrap();
    train(&engine);

    assert_eq!(reader.measurement_count().unwrap(), 4);
    assert_eq!(reader.measurements(true).unwrap(), writer.measurements(true).unwrap());
}
