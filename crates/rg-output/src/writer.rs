//! The `ArtifactWriter` trait implemented by all backend writers.

use rg_congestion::CongestionResult;
use rg_core::CoordinatePair;
use rg_routing::{Route, RouteError};

use crate::OutputResult;

/// File stems (no extension) for the four artifacts of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactNames {
    pub coordinates: String,
    pub routes: String,
    pub errors: String,
    pub congestion: String,
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            coordinates: "coordinates".into(),
            routes: "routes".into(),
            errors: "errors".into(),
            congestion: "congestion".into(),
        }
    }
}

impl ArtifactNames {
    pub fn coordinates(mut self, stem: impl Into<String>) -> Self {
        self.coordinates = stem.into();
        self
    }

    pub fn routes(mut self, stem: impl Into<String>) -> Self {
        self.routes = stem.into();
        self
    }

    pub fn errors(mut self, stem: impl Into<String>) -> Self {
        self.errors = stem.into();
        self
    }

    pub fn congestion(mut self, stem: impl Into<String>) -> Self {
        self.congestion = stem.into();
        self
    }
}

/// Trait implemented by the JSON, CSV and SQLite writers.
///
/// A writer only creates the files for artifacts it is actually given, so
/// one writer type serves every mode.  Backends that have no sensible
/// rendition of an artifact keep the default no-op.
pub trait ArtifactWriter {
    fn write_coordinates(&mut self, _pairs: &[CoordinatePair]) -> OutputResult<()> {
        Ok(())
    }

    fn write_routes(&mut self, _routes: &[Route]) -> OutputResult<()> {
        Ok(())
    }

    /// May be called repeatedly; each call appends.
    fn write_errors(&mut self, errors: &[RouteError]) -> OutputResult<()>;

    fn write_congestion(&mut self, _results: &[CongestionResult]) -> OutputResult<()> {
        Ok(())
    }

    /// Flush and close all underlying handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
