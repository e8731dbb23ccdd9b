//! Fluent builder for constructing a [`RouteBatch`].

use std::sync::Arc;

use rg_core::TravelProfile;
use rg_routing::{RateLimit, RateLimiter, RetryPolicy, RoadSnapIndex, RouteProvider, RouteRequester};

use crate::{BatchError, BatchResult, CancelToken, RouteBatch};

/// Fluent builder for [`RouteBatch<P>`].
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                              |
/// |---------------------|--------------------------------------|
/// | `.profile(p)`       | `TravelProfile::DrivingCar`          |
/// | `.workers(n)`       | 1                                    |
/// | `.rate_limit(l)`    | unlimited                            |
/// | `.retry_policy(r)`  | `RetryPolicy::default()`             |
/// | `.snap_budget(n)`   | 3 (all strategies)                   |
/// | `.local_snap(i)`    | none                                 |
/// | `.cancel_token(t)`  | a fresh token                        |
///
/// # Example
///
/// ```rust,ignore
/// let batch = BatchBuilder::new(OrsClient::new(OrsConfig::new(key))?)
///     .profile(TravelProfile::FootWalking)
///     .workers(4)
///     .rate_limit(RateLimit::per_minute(40))
///     .build()?;
/// let report = batch.run(&pairs, &mut ProgressLogger::new(100))?;
/// ```
pub struct BatchBuilder<P: RouteProvider> {
    provider: P,
    profile: TravelProfile,
    workers: usize,
    rate_limit: Option<RateLimit>,
    retry: RetryPolicy,
    snap_budget: usize,
    local_snap: Option<Arc<RoadSnapIndex>>,
    cancel: Option<CancelToken>,
}

impl<P: RouteProvider> BatchBuilder<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            profile: TravelProfile::default(),
            workers: 1,
            rate_limit: None,
            retry: RetryPolicy::default(),
            snap_budget: 3,
            local_snap: None,
            cancel: None,
        }
    }

    /// Profile for pairs that do not carry their own.
    pub fn profile(mut self, profile: TravelProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Worker threads (only used with the `parallel` feature).
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Shared across all workers of the batch.
    pub fn rate_limit(mut self, limit: RateLimit) -> Self {
        self.rate_limit = Some(limit);
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn snap_budget(mut self, budget: usize) -> Self {
        self.snap_budget = budget;
        self
    }

    pub fn local_snap(mut self, index: RoadSnapIndex) -> Self {
        self.local_snap = Some(Arc::new(index));
        self
    }

    /// Use an externally owned token, e.g. one wired to Ctrl-C.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn build(self) -> BatchResult<RouteBatch<P>> {
        if self.workers == 0 {
            return Err(BatchError::Config("workers must be at least 1".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(BatchError::Config("retry policy needs at least one attempt".into()));
        }

        let limiter = match self.rate_limit {
            Some(limit) => RateLimiter::new(limit),
            None => RateLimiter::unlimited(),
        };
        let mut requester = RouteRequester::new(self.provider)
            .rate_limiter(Arc::new(limiter))
            .retry_policy(self.retry)
            .snap_budget(self.snap_budget);
        if let Some(index) = self.local_snap {
            requester = requester.local_snap(index);
        }

        Ok(RouteBatch {
            requester,
            default_profile: self.profile,
            workers: self.workers,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}
