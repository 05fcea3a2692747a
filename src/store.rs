use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;

use crate::config::BoundingBox;
use crate::flow::{error::Error, structs::FlowResult};

const CREATE_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS traffic_flow (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp    TEXT NOT NULL,
        location     TEXT NOT NULL,
        speed        REAL NOT NULL,
        jam_factor   REAL NOT NULL,
        bbox         TEXT NOT NULL,
        filter_value TEXT NOT NULL
    )";

/// A persisted flow observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRow {
    pub id: i64,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub location: String,
    pub speed: f64,
    pub jam_factor: f64,
    pub bbox: String,
    pub filter_value: String,
}

/// SQLite sink for polled flow results.
pub struct FlowStore {
    conn: Connection,
}

impl FlowStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FlowStore, Error> {
        debug!("Opening flow store at {}", path.as_ref().display());
        FlowStore::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<FlowStore, Error> {
        FlowStore::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<FlowStore, Error> {
        conn.execute(CREATE_TABLE_SQL, [])?;
        Ok(FlowStore { conn })
    }

    /// Insert one row per result, all stamped with `timestamp`, in a single transaction.
    pub fn insert_results(
        &mut self,
        results: &[FlowResult],
        bbox: &BoundingBox,
        filter: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<usize, Error> {
        let timestamp = timestamp.to_rfc3339();
        let bbox = bbox.to_string();

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO traffic_flow (timestamp, location, speed, jam_factor, bbox, filter_value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for result in results {
                stmt.execute(params![
                    timestamp,
                    result.location.description,
                    result.current_flow.speed,
                    result.current_flow.jam_factor,
                    bbox,
                    filter,
                ])?;
            }
        }
        tx.commit()?;

        Ok(results.len())
    }

    /// Most recent rows first.
    pub fn recent(&self, limit: usize) -> Result<Vec<FlowRow>, Error> {
        let limit = limit as i64;
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, location, speed, jam_factor, bbox, filter_value
             FROM traffic_flow ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(FlowRow {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                location: row.get(2)?,
                speed: row.get(3)?,
                jam_factor: row.get(4)?,
                bbox: row.get(5)?,
                filter_value: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<FlowRow>, _>>()?)
    }

    pub fn count(&self) -> Result<usize, Error> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM traffic_flow", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn result(description: &str, speed: f64, jam_factor: f64) -> FlowResult {
        FlowResult::from_value(&json!({
            "location": { "description": description },
            "currentFlow": { "speed": speed, "jamFactor": jam_factor }
        }))
        .unwrap()
    }

    #[test]
    fn inserts_and_reads_back_newest_first() {
        let mut store = FlowStore::open_in_memory().unwrap();
        let bbox: BoundingBox = "-0.8,50.8,-0.6,50.9".parse().unwrap();
        let timestamp = Utc.with_ymd_and_hms(2024, 10, 1, 8, 0, 0).unwrap();

        let written = store
            .insert_results(
                &[result("Tangmere Road", 12.5, 3.2), result("Tangmere Airfield", 20.0, 0.5)],
                &bbox,
                "tangmere",
                timestamp,
            )
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.count().unwrap(), 2);

        let rows = store.recent(10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].location, "Tangmere Airfield");
        assert_eq!(rows[1].location, "Tangmere Road");
        assert_eq!(rows[1].speed, 12.5);
        assert_eq!(rows[1].jam_factor, 3.2);
        assert_eq!(rows[1].bbox, "-0.8,50.8,-0.6,50.9");
        assert_eq!(rows[1].filter_value, "tangmere");
        assert_eq!(rows[1].timestamp, "2024-10-01T08:00:00+00:00");
    }

    #[test]
    fn recent_respects_limit() {
        let mut store = FlowStore::open_in_memory().unwrap();
        let bbox: BoundingBox = "0,0,1,1".parse().unwrap();
        let results: Vec<FlowResult> = (0..5).map(|i| result(&format!("Road {}", i), 10.0, 1.0)).collect();
        store.insert_results(&results, &bbox, "", Utc::now()).unwrap();

        let rows = store.recent(3).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].location, "Road 4");
    }

    #[test]
    fn reopening_file_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.db");
        let bbox: BoundingBox = "0,0,1,1".parse().unwrap();

        {
            let mut store = FlowStore::open(&path).unwrap();
            store
                .insert_results(&[result("A27", 30.0, 0.0)], &bbox, "a27", Utc::now())
                .unwrap();
        }

        let store = FlowStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }
}
