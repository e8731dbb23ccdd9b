//! Per-pair route requests with retry and endpoint snapping.
//!
//! # Request lifecycle
//!
//! ```text
//! Pending ──ok──────────────────────────────────────────► Success
//!    │
//!    ├─ network / 429 ─► NetworkRetry(n) ─ok────────────► Success
//!    │                        └─ ceiling reached ───────► Failure(network | rate-limited)
//!    │
//!    ├─ no route ─► SnapRetry(origin) ─► SnapRetry(destination) ─► SnapRetry(both)
//!    │                  └─ok─► Success          (budget exhausted) ─► Failure(snapping-exhausted)
//!    │
//!    └─ invalid input / malformed / unauthorized ───────► Failure
//! ```
//!
//! Each snap strategy is itself an exact call and may pass through
//! `NetworkRetry`.  Terminal states are never left.  Every provider call
//! (directions or snap) first takes a token from the shared
//! [`RateLimiter`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rg_core::{Coordinate, CoordinatePair, PairId, TravelProfile};

use crate::{
    FailureReason, ProviderError, ProviderResult, RateLimiter, RoadSnapIndex, Route, RouteError,
    RouteProvider, SnapKind,
};

// ── RetryPolicy ───────────────────────────────────────────────────────────────

/// Bounds on retrying transient provider failures.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Calls per exact request, first attempt included.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles each time.
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Pause after a 429 that carried no `Retry-After` hint.
    pub rate_limit_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            rate_limit_pause: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Retries without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            rate_limit_pause: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

// ── Request state ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum RequestState {
    Pending,
    NetworkRetry(u32),
    SnapRetry(SnapKind),
    Success,
    Failure(FailureReason),
}

impl RequestState {
    fn is_terminal(self) -> bool {
        matches!(self, RequestState::Success | RequestState::Failure(_))
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Pending => f.write_str("pending"),
            RequestState::NetworkRetry(n) => write!(f, "network-retry#{n}"),
            RequestState::SnapRetry(k) => write!(f, "snap-retry({k:?})"),
            RequestState::Success => f.write_str("success"),
            RequestState::Failure(r) => write!(f, "failure({r})"),
        }
    }
}

/// Bookkeeping for one `request` call.
struct Attempt {
    pair: PairId,
    state: RequestState,
    calls: u32,
}

impl Attempt {
    fn new(pair: PairId) -> Self {
        Self { pair, state: RequestState::Pending, calls: 0 }
    }

    fn enter(&mut self, next: RequestState) {
        debug_assert!(!self.state.is_terminal(), "{}: left terminal state {}", self.pair, self.state);
        log::debug!("{}: {} -> {}", self.pair, self.state, next);
        self.state = next;
    }
}

// ── RouteRequester ────────────────────────────────────────────────────────────

/// Turns one coordinate pair into a [`Route`] or a [`RouteError`].
///
/// Holds no per-request state, so one requester serves every worker.
pub struct RouteRequester<P: RouteProvider> {
    provider: P,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    snap_budget: usize,
    local_snap: Option<Arc<RoadSnapIndex>>,
}

impl<P: RouteProvider> RouteRequester<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            limiter: Arc::new(RateLimiter::unlimited()),
            retry: RetryPolicy::default(),
            snap_budget: SnapKind::STRATEGIES.len(),
            local_snap: None,
        }
    }

    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Number of snap strategies to try (0 disables snapping).  Capped at 3.
    pub fn snap_budget(mut self, budget: usize) -> Self {
        self.snap_budget = budget.min(SnapKind::STRATEGIES.len());
        self
    }

    /// Fallback for points the provider cannot snap.
    pub fn local_snap(mut self, index: Arc<RoadSnapIndex>) -> Self {
        self.local_snap = Some(index);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Route `pair` under `profile`.
    pub fn request(&self, pair: &CoordinatePair, profile: TravelProfile) -> Result<Route, RouteError> {
        let mut at = Attempt::new(pair.id);

        let first_message = match self.call_with_retry(&mut at, pair.origin, pair.destination, profile) {
            Ok(points) => return Ok(self.succeed(&mut at, pair, profile, points, SnapKind::None)),
            Err(ProviderError::NoRoute(msg)) => msg,
            Err(e) => return Err(self.fail_with(&mut at, pair, profile, &e)),
        };

        let mut snapped_origin: Option<Option<Coordinate>> = None;
        let mut snapped_destination: Option<Option<Coordinate>> = None;
        let mut last_message = first_message;

        for kind in SnapKind::STRATEGIES.into_iter().take(self.snap_budget) {
            at.enter(RequestState::SnapRetry(kind));

            let origin = if kind.moves_origin() {
                match self.snapped(&mut at, &mut snapped_origin, pair.origin, profile) {
                    Ok(Some(c)) => c,
                    Ok(None) => continue,
                    Err(e) => return Err(self.fail_with(&mut at, pair, profile, &e)),
                }
            } else {
                pair.origin
            };
            let destination = if kind.moves_destination() {
                match self.snapped(&mut at, &mut snapped_destination, pair.destination, profile) {
                    Ok(Some(c)) => c,
                    Ok(None) => continue,
                    Err(e) => return Err(self.fail_with(&mut at, pair, profile, &e)),
                }
            } else {
                pair.destination
            };

            match self.call_with_retry(&mut at, origin, destination, profile) {
                Ok(points) => return Ok(self.succeed(&mut at, pair, profile, points, kind)),
                Err(ProviderError::NoRoute(msg)) => last_message = msg,
                Err(e) => return Err(self.fail_with(&mut at, pair, profile, &e)),
            }
        }

        let reason = if self.snap_budget == 0 {
            FailureReason::NoPathFound
        } else {
            FailureReason::SnappingExhausted
        };
        Err(self.fail(&mut at, pair, profile, reason, last_message))
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// One exact request, retrying network failures and 429s under the
    /// attempt ceiling.  A short polyline is a malformed answer.
    fn call_with_retry(
        &self,
        at: &mut Attempt,
        origin: Coordinate,
        destination: Coordinate,
        profile: TravelProfile,
    ) -> ProviderResult<Vec<Coordinate>> {
        let mut attempt = 1;
        loop {
            self.limiter.acquire();
            at.calls += 1;
            let err = match self.provider.directions(origin, destination, profile) {
                Ok(points) if points.len() >= 2 => return Ok(points),
                Ok(points) => {
                    return Err(ProviderError::Malformed(format!(
                        "route has {} vertices",
                        points.len()
                    )));
                }
                Err(e) => e,
            };
            if !err.is_transient() || attempt >= self.retry.max_attempts {
                return Err(err);
            }

            let wait = match &err {
                ProviderError::RateLimited { retry_after } => {
                    retry_after.unwrap_or(self.retry.rate_limit_pause)
                }
                _ => self.retry.backoff(attempt),
            };
            at.enter(RequestState::NetworkRetry(attempt));
            log::debug!("{}: {err}; retrying in {wait:?}", at.pair);
            if !wait.is_zero() {
                std::thread::sleep(wait);
            }
            attempt += 1;
        }
    }

    /// Snap `point` once per request; later strategies reuse the answer.
    fn snapped(
        &self,
        at: &mut Attempt,
        cache: &mut Option<Option<Coordinate>>,
        point: Coordinate,
        profile: TravelProfile,
    ) -> ProviderResult<Option<Coordinate>> {
        if let Some(known) = *cache {
            return Ok(known);
        }
        self.limiter.acquire();
        at.calls += 1;
        let remote = match self.provider.snap(point, profile) {
            Ok(found) => found,
            Err(e @ ProviderError::Unauthorized(_)) => return Err(e),
            Err(e) => {
                log::debug!("{}: provider snap failed ({e}); trying local index", at.pair);
                None
            }
        };
        let found = remote.or_else(|| self.local_snap.as_ref().and_then(|idx| idx.snap(point)));
        *cache = Some(found);
        Ok(found)
    }

    fn succeed(
        &self,
        at: &mut Attempt,
        pair: &CoordinatePair,
        profile: TravelProfile,
        points: Vec<Coordinate>,
        snapped: SnapKind,
    ) -> Route {
        at.enter(RequestState::Success);
        Route {
            pair_id: pair.id,
            origin: pair.origin,
            destination: pair.destination,
            points,
            trip_count: pair.trip_count,
            profile,
            snapped,
            attempts: at.calls,
        }
    }

    fn fail_with(
        &self,
        at: &mut Attempt,
        pair: &CoordinatePair,
        profile: TravelProfile,
        err: &ProviderError,
    ) -> RouteError {
        self.fail(at, pair, profile, FailureReason::from(err), err.to_string())
    }

    fn fail(
        &self,
        at: &mut Attempt,
        pair: &CoordinatePair,
        profile: TravelProfile,
        reason: FailureReason,
        message: String,
    ) -> RouteError {
        at.enter(RequestState::Failure(reason));
        RouteError::new(pair, profile, reason, message, at.calls)
    }
}
