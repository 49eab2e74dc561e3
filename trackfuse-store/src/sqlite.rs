use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use trackfuse_core::{
    Estimate, EstimateSink, Measurement, MeasurementStore, Method, TrackResult,
};

use crate::{StoreError, StoreResult};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS measurements (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp    INTEGER NOT NULL,
        bssid        TEXT    NOT NULL,
        rssi_avg     REAL    NOT NULL,
        rssi_med     REAL    NOT NULL,
        rssi_std     REAL    NOT NULL,
        channel      INTEGER NOT NULL,
        lat          REAL    NOT NULL,
        lon          REAL    NOT NULL,
        method       TEXT    NOT NULL,
        processed_at TEXT    NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_measurements_timestamp ON measurements (timestamp);

    CREATE TABLE IF NOT EXISTS estimations (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp    INTEGER NOT NULL,
        lat          REAL    NOT NULL,
        lon          REAL    NOT NULL,
        nb_neighbors INTEGER NOT NULL,
        processed_at TEXT    NOT NULL
    );
";

const SELECT_MEASUREMENTS: &str = "
    SELECT id, timestamp, bssid, rssi_avg, rssi_med, rssi_std, channel, lat, lon, method
    FROM measurements";

/// A recorded estimate with its insertion time
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEstimate {
    /// Row id
    pub id: i64,
    /// The estimate as produced by the localizer
    pub estimate: Estimate,
    /// When the row was written
    pub processed_at: DateTime<Utc>,
}

/// SQLite-backed measurement and estimate store
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file and make sure both tables exist
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self::with_connection(conn)?;
        log::info!("Opened fingerprint database at {}", path.display());
        Ok(store)
    }

    /// Private in-memory database, mostly for tests
    pub fn in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Insert a batch in one transaction; returns the number of rows written
    pub fn insert_measurements(&self, batch: &[Measurement]) -> StoreResult<usize> {
        let processed_at = Utc::now().to_rfc3339();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO measurements
                    (timestamp, bssid, rssi_avg, rssi_med, rssi_std, channel, lat, lon, method, processed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for m in batch {
                stmt.execute(params![
                    to_sql_int("timestamp", m.timestamp_ms)?,
                    m.bssid,
                    m.rssi_avg,
                    m.rssi_med,
                    m.rssi_std,
                    m.channel,
                    m.lat,
                    m.lon,
                    m.method.as_str(),
                    processed_at,
                ])?;
            }
        }
        tx.commit()?;
        log::debug!("Inserted {} measurements", batch.len());
        Ok(batch.len())
    }

    /// Measurements in insertion order; `located_only` skips `(0, 0)` placeholder rows
    pub fn measurements(&self, located_only: bool) -> StoreResult<Vec<Measurement>> {
        let conn = self.lock()?;
        let sql = if located_only {
            format!("{SELECT_MEASUREMENTS} WHERE NOT (lat = 0 AND lon = 0) ORDER BY id")
        } else {
            format!("{SELECT_MEASUREMENTS} ORDER BY id")
        };

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], raw_measurement)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_measurement()?);
        }
        Ok(out)
    }

    /// Number of stored measurements, placeholder rows included
    pub fn measurement_count(&self) -> StoreResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Record one estimate
    pub fn insert_estimate(&self, estimate: &Estimate) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO estimations (timestamp, lat, lon, nb_neighbors, processed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                to_sql_int("timestamp", estimate.timestamp_ms)?,
                estimate.lat,
                estimate.lon,
                to_sql_int("nb_neighbors", estimate.neighbor_count as u64)?,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Recorded estimates, oldest first
    pub fn estimate_history(&self) -> StoreResult<Vec<StoredEstimate>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, lat, lon, nb_neighbors, processed_at FROM estimations ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, timestamp, lat, lon, nb_neighbors, processed_at) = row?;
            let processed_at = DateTime::parse_from_rfc3339(&processed_at)
                .map_err(|e| StoreError::CorruptRow {
                    id,
                    reason: format!("processed_at: {e}"),
                })?
                .with_timezone(&Utc);
            out.push(StoredEstimate {
                id,
                estimate: Estimate {
                    lat,
                    lon,
                    timestamp_ms: from_sql_int(id, "timestamp", timestamp)?,
                    neighbor_count: from_sql_int(id, "nb_neighbors", nb_neighbors)? as usize,
                },
                processed_at,
            });
        }
        Ok(out)
    }
}

/// Row as read, before the method string and integers are checked
struct RawMeasurement {
    id: i64,
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

fn raw_measurement(row: &Row<'_>) -> rusqlite::Result<RawMeasurement> {
    Ok(RawMeasurement {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        bssid: row.get(2)?,
        rssi_avg: row.get(3)?,
        rssi_med: row.get(4)?,
        rssi_std: row.get(5)?,
        channel: row.get(6)?,
        lat: row.get(7)?,
        lon: row.get(8)?,
        method: row.get(9)?,
    })
}

impl RawMeasurement {
    fn into_measurement(self) -> StoreResult<Measurement> {
        let method: Method = self.method.parse().map_err(|e| StoreError::CorruptRow {
            id: self.id,
            reason: format!("{e}"),
        })?;
        Ok(Measurement {
            timestamp_ms: from_sql_int(self.id, "timestamp", self.timestamp)?,
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

fn to_sql_int(column: &'static str, value: u64) -> StoreResult<i64> {
    i64::try_from(value).map_err(|_| StoreError::OutOfRange { column, value })
}

fn from_sql_int(id: i64, column: &str, value: i64) -> StoreResult<u64> {
    u64::try_from(value).map_err(|_| StoreError::CorruptRow {
        id,
        reason: format!("negative {column} {value}"),
    })
}

impl MeasurementStore for SqliteStore {
    fn write_measurements(&self, batch: &[Measurement]) -> TrackResult<()> {
        self.insert_measurements(batch)
            .map(|_| ())
            .map_err(|e| e.into_track_error("write_measurements"))
    }

    fn read_measurements(&self) -> TrackResult<Vec<Measurement>> {
        self.measurements(true)
            .map_err(|e| e.into_track_error("read_measurements"))
    }

    fn measurement_history(&self) -> TrackResult<Vec<Measurement>> {
        self.measurements(false)
            .map_err(|e| e.into_track_error("measurement_history"))
    }
}

impl EstimateSink for SqliteStore {
    fn write_estimate(&self, estimate: &Estimate) -> TrackResult<()> {
        self.insert_estimate(estimate)
            .map_err(|e| e.into_track_error("write_estimate"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackfuse_core::{Coordinates, RssiSample};

    fn row(ts: u64, bssid: &str, lat: f64, lon: f64) -> Measurement {
        let sample = RssiSample::new(ts, bssid, -60.0, -61.0, 1.5, 6);
        Measurement::from_sample(&sample, Coordinates::new(lat, lon), Method::Interpolated)
    }

    #[test]
    fn batch_is_written_and_read_back() {
        let store = SqliteStore::in_memory().unwrap();
        let batch = vec![row(1000, "a", 10.0, 20.0), row(1000, "b", 10.0, 20.0)];

        assert_eq!(store.insert_measurements(&batch).unwrap(), 2);
        assert_eq!(store.measurements(true).unwrap(), batch);
        assert_eq!(store.measurement_count().unwrap(), 2);
    }

    #[test]
    fn placeholder_needs_both_zero() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert_measurements(&[
                row(1, "a", 0.0, 0.0),
                row(2, "a", 0.0, 20.0),
                row(3, "a", 10.0, 0.0),
            ])
            .unwrap();

        let located: Vec<u64> = store
            .read_measurements()
            .unwrap()
            .iter()
            .map(|m| m.timestamp_ms)
            .collect();
        assert_eq!(located, vec![2, 3]);
        assert_eq!(store.measurement_history().unwrap().len(), 3);
    }

    #[test]
    fn oversized_timestamp_rolls_back_whole_batch() {
        let store = SqliteStore::in_memory().unwrap();
        let batch = vec![row(1000, "a", 10.0, 20.0), row(u64::MAX, "b", 10.0, 20.0)];

        let err = store.write_measurements(&batch).unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(store.measurement_count().unwrap(), 0);
    }

    #[test]
    fn unknown_method_is_reported_as_corrupt() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert_measurements(&[row(1000, "a", 10.0, 20.0)]).unwrap();
        store
            .lock()
            .unwrap()
            .execute("UPDATE measurements SET method = 'teleported'", [])
            .unwrap();

        assert!(matches!(
            store.measurements(true),
            Err(StoreError::CorruptRow { .. })
        ));
    }

    #[test]
    fn estimates_keep_processing_time() {
        let store = SqliteStore::in_memory().unwrap();
        let before = Utc::now();
        let estimate = Estimate { lat: 1.0, lon: 2.0, timestamp_ms: 5000, neighbor_count: 3 };
        store.write_estimate(&estimate).unwrap();

        let history = store.estimate_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].estimate, estimate);
        assert!(history[0].processed_at >= before - chrono::Duration::seconds(1));
    }
}
