//! `ErrorLogObserver<W>`: streams route errors to an `ArtifactWriter`.

use rg_batch::{BatchObserver, BatchReport};
use rg_routing::RouteError;

use crate::writer::ArtifactWriter;
use crate::{OutputError, OutputResult};

/// A [`BatchObserver`] that appends every [`RouteError`] to `writer` as it
/// happens, so the error log survives a run that is interrupted.
///
/// Observer methods have no return value, so write errors are stored; check
/// [`take_error`][Self::take_error] after the batch returns.
pub struct ErrorLogObserver<W: ArtifactWriter> {
    writer: W,
    written: usize,
    last_error: Option<OutputError>,
}

impl<W: ArtifactWriter> ErrorLogObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0, last_error: None }
    }

    /// Route errors handed to the writer so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            log::error!("error log write failed: {e}");
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: ArtifactWriter> BatchObserver for ErrorLogObserver<W> {
    fn on_error(&mut self, error: &RouteError) {
        let result = self.writer.write_errors(std::slice::from_ref(error));
        if result.is_ok() {
            self.written += 1;
        }
        self.store_err(result);
    }

    fn on_batch_end(&mut self, _report: &BatchReport) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
