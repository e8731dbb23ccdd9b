//! Batch observer trait for progress reporting and incremental persistence.

use std::time::Instant;

use rg_routing::{Route, RouteError};

use crate::BatchReport;

/// Callbacks invoked by [`RouteBatch::run`][crate::RouteBatch::run].
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  With the `parallel` feature the batch
/// serializes calls behind a mutex, so implementations never see two
/// callbacks at once; completion order is arbitrary.
///
/// # Example: failure counter
///
/// ```rust,ignore
/// struct CountFailures(usize);
///
/// impl BatchObserver for CountFailures {
///     fn on_error(&mut self, _error: &RouteError) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait BatchObserver {
    /// Called once before any pair is dispatched.
    fn on_batch_start(&mut self, _total: usize) {}

    /// Called for every successful route.
    fn on_route(&mut self, _route: &Route) {}

    /// Called for every failed pair.
    fn on_error(&mut self, _error: &RouteError) {}

    /// Called once with the final report.
    fn on_batch_end(&mut self, _report: &BatchReport) {}
}

/// A [`BatchObserver`] that does nothing.
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Both observers see every callback, `.0` first.
impl<A: BatchObserver, B: BatchObserver> BatchObserver for (A, B) {
    fn on_batch_start(&mut self, total: usize) {
        self.0.on_batch_start(total);
        self.1.on_batch_start(total);
    }

    fn on_route(&mut self, route: &Route) {
        self.0.on_route(route);
        self.1.on_route(route);
    }

    fn on_error(&mut self, error: &RouteError) {
        self.0.on_error(error);
        self.1.on_error(error);
    }

    fn on_batch_end(&mut self, report: &BatchReport) {
        self.0.on_batch_end(report);
        self.1.on_batch_end(report);
    }
}

/// Logs progress at `info` every `every` completed pairs and a summary at
/// the end.
pub struct ProgressLogger {
    every: usize,
    total: usize,
    done: usize,
    started: Option<Instant>,
}

impl ProgressLogger {
    pub fn new(every: usize) -> Self {
        Self { every: every.max(1), total: 0, done: 0, started: None }
    }

    fn tick(&mut self) {
        self.done += 1;
        if self.done % self.every == 0 || self.done == self.total {
            log::info!("routed {}/{} pairs", self.done, self.total);
        }
    }
}

impl BatchObserver for ProgressLogger {
    fn on_batch_start(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
        self.started = Some(Instant::now());
        log::info!("routing {total} pairs");
    }

    fn on_route(&mut self, _route: &Route) {
        self.tick();
    }

    fn on_error(&mut self, error: &RouteError) {
        log::warn!("{error}");
        self.tick();
    }

    fn on_batch_end(&mut self, report: &BatchReport) {
        let elapsed = self.started.map(|t| t.elapsed().as_secs_f64()).unwrap_or(0.0);
        log::info!(
            "batch finished in {elapsed:.1}s: {} routes, {} errors, {} skipped",
            report.routes.len(),
            report.errors.len(),
            report.skipped,
        );
        if let Some(fatal) = &report.fatal {
            log::error!("batch stopped early: {fatal}");
        }
    }
}
