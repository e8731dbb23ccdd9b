//! JSON backend and readers.
//!
//! Artifacts are JSON arrays of the library record types, pretty-printed.
//! Coordinates serialize as `[lon, lat]` with full `f64` precision, so a
//! file read back with [`read_coordinates`] or [`read_routes`] is identical
//! to what was written.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use rg_congestion::CongestionResult;
use rg_core::CoordinatePair;
use rg_routing::{Route, RouteError};

use crate::writer::{ArtifactNames, ArtifactWriter};
use crate::{OutputError, OutputResult};

/// Serialize `value` to `path`, creating or truncating it.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> OutputResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, value)
        .map_err(|source| OutputError::Json { path: path.to_owned(), source })?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> OutputResult<T> {
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|source| OutputError::Json { path: path.to_owned(), source })
}

/// Read a coordinates artifact.
pub fn read_coordinates(path: &Path) -> OutputResult<Vec<CoordinatePair>> {
    read_json(path)
}

/// Read a routes artifact.
pub fn read_routes(path: &Path) -> OutputResult<Vec<Route>> {
    read_json(path)
}

pub fn read_congestion(path: &Path) -> OutputResult<Vec<CongestionResult>> {
    read_json(path)
}

/// Writes each artifact as `{dir}/{stem}.json`.
///
/// Errors are buffered and written on [`finish`][ArtifactWriter::finish],
/// since a JSON array cannot be appended to.
pub struct JsonWriter {
    dir: PathBuf,
    names: ArtifactNames,
    errors: Vec<RouteError>,
    errors_pending: bool,
    finished: bool,
}

impl JsonWriter {
    /// `dir` must exist.
    pub fn new(dir: &Path) -> Self {
        Self::with_names(dir, ArtifactNames::default())
    }

    pub fn with_names(dir: &Path, names: ArtifactNames) -> Self {
        Self {
            dir: dir.to_owned(),
            names,
            errors: Vec::new(),
            errors_pending: false,
            finished: false,
        }
    }

    pub fn path_for(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.json"))
    }

    fn write<T: Serialize + ?Sized>(&self, stem: &str, value: &T) -> OutputResult<()> {
        let path = self.path_for(stem);
        write_json(&path, value)?;
        log::info!("wrote {}", path.display());
        Ok(())
    }
}

impl ArtifactWriter for JsonWriter {
    fn write_coordinates(&mut self, pairs: &[CoordinatePair]) -> OutputResult<()> {
        self.write(&self.names.coordinates, pairs)
    }

    fn write_routes(&mut self, routes: &[Route]) -> OutputResult<()> {
        self.write(&self.names.routes, routes)
    }

    fn write_errors(&mut self, errors: &[RouteError]) -> OutputResult<()> {
        self.errors.extend_from_slice(errors);
        self.errors_pending = true;
        Ok(())
    }

    fn write_congestion(&mut self, results: &[CongestionResult]) -> OutputResult<()> {
        self.write(&self.names.congestion, results)
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        if self.errors_pending {
            self.write(&self.names.errors, &self.errors)?;
        }
        Ok(())
    }
}
