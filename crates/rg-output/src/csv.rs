//! CSV backend.
//!
//! Mirrors the tabular artifacts as `{stem}.csv` in the output directory:
//! coordinates, the error log and the congestion ranking.  Routes have no
//! flat form and are skipped.  Files are created on first write; header rows
//! come from the row types in [`row`][crate::row].

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;

use rg_congestion::CongestionResult;
use rg_core::CoordinatePair;
use rg_routing::RouteError;

use crate::OutputResult;
use crate::row::{CongestionRow, CoordinateRow, ErrorRow};
use crate::writer::{ArtifactNames, ArtifactWriter};

pub struct CsvWriter {
    dir: PathBuf,
    names: ArtifactNames,
    errors: Option<Writer<File>>,
    finished: bool,
}

impl CsvWriter {
    /// `dir` must exist.
    pub fn new(dir: &Path) -> Self {
        Self::with_names(dir, ArtifactNames::default())
    }

    pub fn with_names(dir: &Path, names: ArtifactNames) -> Self {
        Self { dir: dir.to_owned(), names, errors: None, finished: false }
    }

    pub fn path_for(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.csv"))
    }
}

impl ArtifactWriter for CsvWriter {
    fn write_coordinates(&mut self, pairs: &[CoordinatePair]) -> OutputResult<()> {
        let mut w = Writer::from_path(self.path_for(&self.names.coordinates))?;
        for pair in pairs {
            w.serialize(CoordinateRow::from(pair))?;
        }
        w.flush()?;
        Ok(())
    }

    /// Appends and flushes, so the log on disk is current after every call.
    fn write_errors(&mut self, errors: &[RouteError]) -> OutputResult<()> {
        let w = match self.errors.take() {
            Some(w) => w,
            None => Writer::from_path(self.path_for(&self.names.errors))?,
        };
        let w = self.errors.insert(w);
        for e in errors {
            w.serialize(ErrorRow::from(e))?;
        }
        w.flush()?;
        Ok(())
    }

    fn write_congestion(&mut self, results: &[CongestionResult]) -> OutputResult<()> {
        let mut w = Writer::from_path(self.path_for(&self.names.congestion))?;
        for (i, r) in results.iter().enumerate() {
            w.serialize(CongestionRow::new(i as u64 + 1, r))?;
        }
        w.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        if let Some(w) = &mut self.errors {
            w.flush()?;
        }
        Ok(())
    }
}
