//! Unit tests for rg-batch.

use std::sync::Mutex;

use rg_core::{Coordinate, CoordinatePair, PairId, TravelProfile};
use rg_routing::{
    FailureReason, ProviderError, ProviderResult, RetryPolicy, Route, RouteError, RouteProvider,
};

use crate::{BatchBuilder, BatchError, BatchObserver, BatchReport, CancelToken, NoopObserver};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn pairs(n: u32) -> Vec<CoordinatePair> {
    (0..n)
        .map(|i| {
            let origin = Coordinate::new(127.0 + i as f64 * 0.001, 37.5);
            CoordinatePair::new(PairId(i), origin, Coordinate::new(127.1, 37.6), i + 1)
        })
        .collect()
}

/// Echoes a straight two-point route, except for origins listed in
/// `fail`, which get `error`.
struct Echo {
    fail: Vec<Coordinate>,
    error: ProviderError,
    calls: Mutex<Vec<TravelProfile>>,
}

impl Echo {
    fn ok() -> Self {
        Self::failing(vec![], ProviderError::InvalidInput("unused".into()))
    }

    fn failing(fail: Vec<Coordinate>, error: ProviderError) -> Self {
        Self { fail, error, calls: Mutex::new(Vec::new()) }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl RouteProvider for Echo {
    fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        profile: TravelProfile,
    ) -> ProviderResult<Vec<Coordinate>> {
        self.calls.lock().unwrap().push(profile);
        if self.fail.contains(&origin) {
            Err(self.error.clone())
        } else {
            Ok(vec![origin, destination])
        }
    }
}

#[derive(Default)]
struct Recorder {
    started: Option<usize>,
    routes: Vec<PairId>,
    errors: Vec<PairId>,
    ended: usize,
}

impl BatchObserver for Recorder {
    fn on_batch_start(&mut self, total: usize) {
        self.started = Some(total);
    }
    fn on_route(&mut self, route: &Route) {
        self.routes.push(route.pair_id);
    }
    fn on_error(&mut self, error: &RouteError) {
        self.errors.push(error.pair_id);
    }
    fn on_batch_end(&mut self, _report: &BatchReport) {
        self.ended += 1;
    }
}

// ── Orchestration ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod orchestration {
    use super::*;

    #[test]
    fn partial_failure_keeps_going() {
        let input = pairs(10);
        let fail = vec![input[2].origin, input[5].origin, input[9].origin];
        let provider = Echo::failing(fail, ProviderError::InvalidInput("bad".into()));
        let batch = BatchBuilder::new(provider).build().unwrap();

        let report = batch.run(&input, &mut NoopObserver).unwrap();

        assert_eq!(report.routes.len(), 7);
        assert_eq!(report.errors.len(), 3);
        assert!(report.is_complete());
        let expected: Vec<PairId> = input.iter().map(|p| p.id).collect();
        assert_eq!(report.dispatched(), expected);

        let failed: Vec<PairId> = report.errors.iter().map(|e| e.pair_id).collect();
        assert_eq!(failed, vec![PairId(2), PairId(5), PairId(9)]);
        assert!(report.errors.iter().all(|e| e.reason == FailureReason::InvalidInput));
    }

    #[test]
    fn routes_carry_pair_trip_counts() {
        let input = pairs(4);
        let batch = BatchBuilder::new(Echo::ok()).build().unwrap();
        let report = batch.run(&input, &mut NoopObserver).unwrap();
        for (route, pair) in report.routes.iter().zip(&input) {
            assert_eq!(route.pair_id, pair.id);
            assert_eq!(route.trip_count, pair.trip_count);
            assert_eq!(route.points, vec![pair.origin, pair.destination]);
        }
    }

    #[test]
    fn pair_profile_overrides_default() {
        let mut input = pairs(2);
        input[1].profile = Some(TravelProfile::FootWalking);
        let batch = BatchBuilder::new(Echo::ok())
            .profile(TravelProfile::DrivingHgv)
            .build()
            .unwrap();

        let report = batch.run(&input, &mut NoopObserver).unwrap();
        assert_eq!(report.routes[0].profile, TravelProfile::DrivingHgv);
        assert_eq!(report.routes[1].profile, TravelProfile::FootWalking);
    }

    #[test]
    fn observer_sees_every_outcome_once() {
        let input = pairs(6);
        let provider = Echo::failing(vec![input[0].origin], ProviderError::InvalidInput("x".into()));
        let batch = BatchBuilder::new(provider).build().unwrap();
        let mut rec = Recorder::default();

        batch.run(&input, &mut rec).unwrap();

        assert_eq!(rec.started, Some(6));
        assert_eq!(rec.routes.len(), 5);
        assert_eq!(rec.errors, vec![PairId(0)]);
        assert_eq!(rec.ended, 1);
    }

    #[test]
    fn paired_observers_both_see_callbacks() {
        let input = pairs(3);
        let provider = Echo::failing(vec![input[1].origin], ProviderError::InvalidInput("x".into()));
        let batch = BatchBuilder::new(provider).build().unwrap();
        let mut both = (Recorder::default(), Recorder::default());

        batch.run(&input, &mut both).unwrap();

        assert_eq!(both.0.routes.len(), 2);
        assert_eq!(both.1.routes.len(), 2);
        assert_eq!(both.0.errors, both.1.errors);
        assert_eq!((both.0.ended, both.1.ended), (1, 1));
    }

    #[test]
    fn empty_input_is_an_empty_report() {
        let batch = BatchBuilder::new(Echo::ok()).build().unwrap();
        let report = batch.run(&[], &mut NoopObserver).unwrap();
        assert_eq!(report.total(), 0);
        assert!(report.is_complete());
    }

    #[test]
    fn network_failures_are_retried_per_pair() {
        let input = pairs(3);
        let provider = Echo::failing(vec![input[1].origin], ProviderError::Network("reset".into()));
        let batch = BatchBuilder::new(provider)
            .retry_policy(RetryPolicy::immediate(4))
            .build()
            .unwrap();

        let report = batch.run(&input, &mut NoopObserver).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].reason, FailureReason::Network);
        assert_eq!(report.errors[0].attempts, 4);
        assert_eq!(batch.requester().provider().call_count(), 2 + 4);
    }
}

// ── Cancellation ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod cancellation {
    use super::*;

    #[test]
    fn cancelled_before_start_dispatches_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let batch = BatchBuilder::new(Echo::ok()).cancel_token(token).build().unwrap();

        let report = batch.run(&pairs(5), &mut NoopObserver).unwrap();

        assert_eq!(report.skipped, 5);
        assert!(report.routes.is_empty() && report.errors.is_empty());
        assert!(!report.is_complete());
        assert_eq!(batch.requester().provider().call_count(), 0);
    }

    #[test]
    fn token_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    /// Succeeds on every call and fires `token` on call number `after`.
    struct CancelAfter {
        token: CancelToken,
        after: usize,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl RouteProvider for CancelAfter {
        fn directions(
            &self,
            origin: Coordinate,
            destination: Coordinate,
            _profile: TravelProfile,
        ) -> ProviderResult<Vec<Coordinate>> {
            let n = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            if n == self.after {
                self.token.cancel();
            }
            Ok(vec![origin, destination])
        }
    }

    #[test]
    fn external_cancel_mid_run_skips_remaining_pairs() {
        let token = CancelToken::new();
        let provider = CancelAfter { token: token.clone(), after: 4, calls: Default::default() };
        let batch = BatchBuilder::new(provider).cancel_token(token.clone()).build().unwrap();
        let input = pairs(10);
        let mut rec = Recorder::default();

        let report = batch.run(&input, &mut rec).unwrap();

        assert!(token.is_cancelled());
        assert!(report.fatal.is_none());
        assert!(report.errors.is_empty());
        assert_eq!(report.total(), 10);
        assert!(report.skipped > 0);
        assert!(!report.is_complete());

        // The request in flight when the token fired still completes.
        let calls = batch.requester().provider().calls.load(std::sync::atomic::Ordering::SeqCst);
        assert_eq!(report.routes.len(), calls);
        assert!(report.routes.len() >= 4);
        for route in &report.routes {
            let pair = &input[route.pair_id.index()];
            assert_eq!(route.points, vec![pair.origin, pair.destination]);
        }
        assert_eq!(rec.routes.len(), report.routes.len());
        assert_eq!(rec.ended, 1);

        #[cfg(not(feature = "parallel"))]
        {
            assert_eq!(report.dispatched(), (0..4).map(PairId).collect::<Vec<_>>());
            assert_eq!(report.skipped, 6);
        }
    }

    #[test]
    fn unauthorized_stops_the_batch_and_keeps_partial_output() {
        let input = pairs(10);
        let provider = Echo::failing(
            vec![input[3].origin],
            ProviderError::Unauthorized("Access to this API has been disallowed".into()),
        );
        let batch = BatchBuilder::new(provider).build().unwrap();

        let report = batch.run(&input, &mut NoopObserver).unwrap();

        let fatal = report.fatal.as_ref().unwrap();
        assert_eq!(fatal.pair_id, PairId(3));
        assert_eq!(fatal.reason, FailureReason::Unauthorized);
        assert!(report.errors.iter().any(|e| e.pair_id == PairId(3)));
        assert_eq!(report.total(), 10);
        assert!(batch.cancel_token().is_cancelled());

        #[cfg(not(feature = "parallel"))]
        {
            assert_eq!(report.routes.len(), 3);
            assert_eq!(report.skipped, 6);
        }
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use super::*;

    #[test]
    fn zero_workers_rejected() {
        let err = BatchBuilder::new(Echo::ok()).workers(0).build().err().unwrap();
        assert!(matches!(err, BatchError::Config(_)));
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = BatchBuilder::new(Echo::ok())
            .retry_policy(RetryPolicy::immediate(0))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, BatchError::Config(_)));
    }

    #[test]
    fn defaults() {
        let batch = BatchBuilder::new(Echo::ok()).build().unwrap();
        assert_eq!(batch.workers(), 1);
        assert_eq!(batch.default_profile(), TravelProfile::DrivingCar);
    }
}
