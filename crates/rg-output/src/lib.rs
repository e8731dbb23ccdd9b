//! `rg-output`: run artifacts for routegen.
//!
//! | Feature   | Backend | Files created (default stems)                             |
//! |-----------|---------|-----------------------------------------------------------|
//! | *(none)*  | JSON    | `coordinates.json`, `routes.json`, `errors.json`, `congestion.json` |
//! | *(none)*  | CSV     | `coordinates.csv`, `errors.csv`, `congestion.csv`         |
//! | `sqlite`  | SQLite  | `routegen.db`                                             |
//!
//! JSON is the canonical format: later pipeline stages read it back with
//! [`read_coordinates`] and [`read_routes`].  CSV and SQLite are mirrors for
//! inspection.  All backends implement [`ArtifactWriter`]; stems are set per
//! run through [`ArtifactNames`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use rg_output::{ArtifactNames, CsvWriter, ErrorLogObserver};
//!
//! let names = ArtifactNames::default().errors(format!("errors_{stamp}"));
//! let mut log = ErrorLogObserver::new(CsvWriter::with_names(&error_dir, names));
//! let report = batch.run(&pairs, &mut log)?;
//! if let Some(e) = log.take_error() { log::error!("error log: {e}"); }
//! ```

pub mod csv;
pub mod error;
pub mod json;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use self::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use json::{JsonWriter, read_congestion, read_coordinates, read_json, read_routes, write_json};
pub use observer::ErrorLogObserver;
pub use row::{CongestionRow, CoordinateRow, ErrorRow};
pub use writer::{ArtifactNames, ArtifactWriter};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
