//! The `RouteBatch` orchestrator.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use rg_core::{CoordinatePair, PairId, TravelProfile};
use rg_routing::{Route, RouteError, RouteProvider, RouteRequester};

use crate::{BatchObserver, BatchResult, CancelToken};

// ── BatchReport ───────────────────────────────────────────────────────────────

/// Everything a batch produced.  `routes` and `errors` are sorted by
/// `PairId`; every dispatched pair appears in exactly one of them.
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub routes: Vec<Route>,
    pub errors: Vec<RouteError>,
    /// Pairs never dispatched because the batch was cancelled.
    pub skipped: usize,
    /// The failure that stopped the batch, if any.  Also present in `errors`.
    pub fatal: Option<RouteError>,
}

impl BatchReport {
    /// Pairs accounted for: routed, failed or skipped.
    pub fn total(&self) -> usize {
        self.routes.len() + self.errors.len() + self.skipped
    }

    /// `true` if every pair was dispatched and none was fatal.
    pub fn is_complete(&self) -> bool {
        self.skipped == 0 && self.fatal.is_none()
    }

    /// `PairId`s of all dispatched pairs, ascending.
    pub fn dispatched(&self) -> Vec<PairId> {
        let mut ids: Vec<PairId> = self
            .routes
            .iter()
            .map(|r| r.pair_id)
            .chain(self.errors.iter().map(|e| e.pair_id))
            .collect();
        ids.sort_unstable();
        ids
    }
}

// ── Shared accumulators ───────────────────────────────────────────────────────

/// Append-only result collections shared by workers.  No lock is held
/// across a provider call.
struct Accumulators<'o, O> {
    routes: Mutex<Vec<Route>>,
    errors: Mutex<Vec<RouteError>>,
    fatal: Mutex<Option<RouteError>>,
    skipped: AtomicUsize,
    observer: Mutex<&'o mut O>,
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ── RouteBatch ────────────────────────────────────────────────────────────────

/// Drives a [`RouteRequester`] across many coordinate pairs.
///
/// Pairs are independent: a failure for one never stops the others, except
/// a fatal failure (rejected credentials), which cancels the batch.
/// Create via [`BatchBuilder`][crate::BatchBuilder].
pub struct RouteBatch<P: RouteProvider> {
    pub(crate) requester: RouteRequester<P>,
    pub(crate) default_profile: TravelProfile,
    pub(crate) workers: usize,
    pub(crate) cancel: CancelToken,
}

impl<P: RouteProvider> RouteBatch<P> {
    pub fn requester(&self) -> &RouteRequester<P> {
        &self.requester
    }

    pub fn default_profile(&self) -> TravelProfile {
        self.default_profile
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// A handle that stops this batch from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Route every pair, using each pair's own profile when set and
    /// `default_profile` otherwise.
    ///
    /// With the `parallel` feature pairs run on a dedicated Rayon pool of
    /// `workers` threads; otherwise they run in input order.
    pub fn run<O: BatchObserver + Send>(
        &self,
        pairs: &[CoordinatePair],
        observer: &mut O,
    ) -> BatchResult<BatchReport> {
        observer.on_batch_start(pairs.len());

        let acc = Accumulators {
            routes: Mutex::new(Vec::with_capacity(pairs.len())),
            errors: Mutex::new(Vec::new()),
            fatal: Mutex::new(None),
            skipped: AtomicUsize::new(0),
            observer: Mutex::new(observer),
        };

        #[cfg(not(feature = "parallel"))]
        {
            for pair in pairs {
                self.process(pair, &acc);
            }
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .thread_name(|i| format!("route-worker-{i}"))
                .build()
                .map_err(|e| crate::BatchError::WorkerPool(e.to_string()))?;
            pool.install(|| pairs.par_iter().for_each(|pair| self.process(pair, &acc)));
        }

        let Accumulators { routes, errors, fatal, skipped, observer } = acc;
        let mut report = BatchReport {
            routes: routes.into_inner().unwrap_or_else(|e| e.into_inner()),
            errors: errors.into_inner().unwrap_or_else(|e| e.into_inner()),
            skipped: skipped.into_inner(),
            fatal: fatal.into_inner().unwrap_or_else(|e| e.into_inner()),
        };
        report.routes.sort_unstable_by_key(|r| r.pair_id);
        report.errors.sort_unstable_by_key(|e| e.pair_id);

        let observer = observer.into_inner().unwrap_or_else(|e| e.into_inner());
        observer.on_batch_end(&report);
        Ok(report)
    }

    fn process<O: BatchObserver>(&self, pair: &CoordinatePair, acc: &Accumulators<'_, O>) {
        if self.cancel.is_cancelled() {
            acc.skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let profile = pair.effective_profile(self.default_profile);
        match self.requester.request(pair, profile) {
            Ok(route) => {
                lock(&acc.observer).on_route(&route);
                lock(&acc.routes).push(route);
            }
            Err(error) => {
                if error.is_fatal() {
                    let mut fatal = lock(&acc.fatal);
                    if fatal.is_none() {
                        log::error!("{error}; cancelling remaining pairs");
                        *fatal = Some(error.clone());
                    }
                    self.cancel.cancel();
                }
                lock(&acc.observer).on_error(&error);
                lock(&acc.errors).push(error);
            }
        }
    }
}
