//! SQLite backend (feature `sqlite`).
//!
//! One database file (default `routegen.db`) with a table per artifact:
//! `coordinates`, `routes`, `errors` and `congestion`.  Route vertices are
//! stored as a JSON `[[lon, lat], …]` text column.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};

use rg_congestion::CongestionResult;
use rg_core::CoordinatePair;
use rg_routing::{Route, RouteError};

use crate::row::{CongestionRow, CoordinateRow, ErrorRow};
use crate::writer::ArtifactWriter;
use crate::{OutputError, OutputResult};

pub const DEFAULT_DB_NAME: &str = "routegen.db";

pub struct SqliteWriter {
    conn: Connection,
    path: PathBuf,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `routegen.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        Self::open(&dir.join(DEFAULT_DB_NAME))
    }

    pub fn open(path: &Path) -> OutputResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS coordinates (
                 pair_id           INTEGER PRIMARY KEY,
                 origin_lon        REAL NOT NULL,
                 origin_lat        REAL NOT NULL,
                 destination_lon   REAL NOT NULL,
                 destination_lat   REAL NOT NULL,
                 trip_count        INTEGER NOT NULL,
                 origin_zone       INTEGER,
                 destination_zone  INTEGER,
                 destination_fixed INTEGER NOT NULL,
                 profile           TEXT
             );
             CREATE TABLE IF NOT EXISTS routes (
                 pair_id      INTEGER PRIMARY KEY,
                 trip_count   INTEGER NOT NULL,
                 profile      TEXT NOT NULL,
                 snapped      TEXT NOT NULL,
                 attempts     INTEGER NOT NULL,
                 vertex_count INTEGER NOT NULL,
                 length_m     REAL NOT NULL,
                 points       TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS errors (
                 pair_id         INTEGER NOT NULL,
                 origin_lon      REAL NOT NULL,
                 origin_lat      REAL NOT NULL,
                 destination_lon REAL NOT NULL,
                 destination_lat REAL NOT NULL,
                 trip_count      INTEGER NOT NULL,
                 profile         TEXT NOT NULL,
                 reason          TEXT NOT NULL,
                 attempts        INTEGER NOT NULL,
                 message         TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS congestion (
                 rank                 INTEGER PRIMARY KEY,
                 segment_id           INTEGER NOT NULL,
                 a_lon                REAL NOT NULL,
                 a_lat                REAL NOT NULL,
                 b_lon                REAL NOT NULL,
                 b_lat                REAL NOT NULL,
                 crossing_count       INTEGER NOT NULL,
                 overlapping_segments INTEGER NOT NULL,
                 trip_mass            INTEGER NOT NULL,
                 overlap_trips        INTEGER NOT NULL,
                 crossing_volume      INTEGER NOT NULL,
                 occurrences          INTEGER NOT NULL,
                 routes               INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, path: path.to_owned(), finished: false })
    }
}

impl ArtifactWriter for SqliteWriter {
    fn write_coordinates(&mut self, pairs: &[CoordinatePair]) -> OutputResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO coordinates \
                 (pair_id, origin_lon, origin_lat, destination_lon, destination_lat, trip_count, \
                  origin_zone, destination_zone, destination_fixed, profile) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for row in pairs.iter().map(CoordinateRow::from) {
                stmt.execute(params![
                    row.pair_id,
                    row.origin_lon,
                    row.origin_lat,
                    row.destination_lon,
                    row.destination_lat,
                    row.trip_count,
                    row.origin_zone.map(|z| z as i64),
                    row.destination_zone.map(|z| z as i64),
                    row.destination_fixed as i64,
                    row.profile,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_routes(&mut self, routes: &[Route]) -> OutputResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO routes \
                 (pair_id, trip_count, profile, snapped, attempts, vertex_count, length_m, points) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for route in routes {
                let points = serde_json::to_string(&route.points)
                    .map_err(|source| OutputError::Json { path: self.path.clone(), source })?;
                stmt.execute(params![
                    route.pair_id.0,
                    route.trip_count,
                    route.profile.as_str(),
                    route.snapped.as_str(),
                    route.attempts,
                    route.vertex_count() as i64,
                    route.length_m(),
                    points,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_errors(&mut self, errors: &[RouteError]) -> OutputResult<()> {
        if errors.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO errors \
                 (pair_id, origin_lon, origin_lat, destination_lon, destination_lat, trip_count, \
                  profile, reason, attempts, message) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for row in errors.iter().map(ErrorRow::from) {
                stmt.execute(params![
                    row.pair_id,
                    row.origin_lon,
                    row.origin_lat,
                    row.destination_lon,
                    row.destination_lat,
                    row.trip_count,
                    row.profile,
                    row.reason,
                    row.attempts,
                    row.message,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Replaces any earlier ranking in the database.
    fn write_congestion(&mut self, results: &[CongestionResult]) -> OutputResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM congestion", [])?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO congestion \
                 (rank, segment_id, a_lon, a_lat, b_lon, b_lat, crossing_count, \
                  overlapping_segments, trip_mass, overlap_trips, crossing_volume, occurrences, routes) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            for (i, r) in results.iter().enumerate() {
                let row = CongestionRow::new(i as u64 + 1, r);
                stmt.execute(params![
                    row.rank as i64,
                    row.segment_id,
                    row.a_lon,
                    row.a_lat,
                    row.b_lon,
                    row.b_lat,
                    row.crossing_count as i64,
                    row.overlapping_segments,
                    row.trip_mass as i64,
                    row.overlap_trips as i64,
                    row.crossing_volume as i64,
                    row.occurrences,
                    row.routes,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
