//! Unit tests for rg-routing.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use rg_core::{Coordinate, CoordinatePair, PairId, TravelProfile};

use crate::{
    FailureReason, ProviderError, ProviderResult, RateLimit, RateLimiter, RetryPolicy,
    RoadSnapIndex, RouteProvider, RouteRequester, SnapKind,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn c(lon: f64, lat: f64) -> Coordinate {
    Coordinate::new(lon, lat)
}

fn pair() -> CoordinatePair {
    CoordinatePair::new(PairId(7), c(127.00, 37.50), c(127.02, 37.52), 4)
}

fn line() -> Vec<Coordinate> {
    vec![c(127.00, 37.50), c(127.01, 37.51), c(127.02, 37.52)]
}

fn no_route() -> ProviderResult<Vec<Coordinate>> {
    Err(ProviderError::NoRoute("Could not find routable point".into()))
}

fn network() -> ProviderResult<Vec<Coordinate>> {
    Err(ProviderError::Network("connection reset".into()))
}

/// Replays scripted directions answers in order; the last one repeats.
struct Scripted {
    answers: Mutex<VecDeque<ProviderResult<Vec<Coordinate>>>>,
    snap_to: Option<Coordinate>,
    requests: Mutex<Vec<(Coordinate, Coordinate)>>,
    snaps: Mutex<u32>,
}

impl Scripted {
    fn new(answers: Vec<ProviderResult<Vec<Coordinate>>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            snap_to: None,
            requests: Mutex::new(Vec::new()),
            snaps: Mutex::new(0),
        }
    }

    fn snapping_to(mut self, target: Coordinate) -> Self {
        self.snap_to = Some(target);
        self
    }

    fn requests(&self) -> Vec<(Coordinate, Coordinate)> {
        self.requests.lock().unwrap().clone()
    }
}

impl RouteProvider for Scripted {
    fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        _profile: TravelProfile,
    ) -> ProviderResult<Vec<Coordinate>> {
        self.requests.lock().unwrap().push((origin, destination));
        let mut answers = self.answers.lock().unwrap();
        if answers.len() > 1 {
            answers.pop_front().unwrap()
        } else {
            answers.front().cloned().unwrap()
        }
    }

    fn snap(&self, _point: Coordinate, _profile: TravelProfile) -> ProviderResult<Option<Coordinate>> {
        *self.snaps.lock().unwrap() += 1;
        Ok(self.snap_to)
    }
}

fn requester(p: &Scripted) -> RouteRequester<&Scripted> {
    RouteRequester::new(p).retry_policy(RetryPolicy::immediate(3))
}

// ── RouteRequester ────────────────────────────────────────────────────────────

#[cfg(test)]
mod requester {
    use super::*;

    #[test]
    fn success_returns_provider_polyline_verbatim() {
        let p = Scripted::new(vec![Ok(line())]);
        let route = requester(&p).request(&pair(), TravelProfile::DrivingCar).unwrap();
        assert_eq!(route.points, line());
        assert_eq!(route.pair_id, PairId(7));
        assert_eq!(route.trip_count, 4);
        assert_eq!(route.snapped, SnapKind::None);
        assert_eq!(route.attempts, 1);
    }

    #[test]
    fn network_failure_retried_until_success() {
        let p = Scripted::new(vec![network(), network(), Ok(line())]);
        let route = requester(&p).request(&pair(), TravelProfile::DrivingCar).unwrap();
        assert_eq!(route.attempts, 3);
    }

    #[test]
    fn network_failure_exhausts_attempt_ceiling() {
        let p = Scripted::new(vec![network()]);
        let err = requester(&p).request(&pair(), TravelProfile::DrivingCar).unwrap_err();
        assert_eq!(err.reason, FailureReason::Network);
        assert_eq!(err.attempts, 3);
        assert_eq!(p.requests().len(), 3);
        assert_eq!(err.pair_id, PairId(7));
    }

    #[test]
    fn rate_limit_exhausts_as_rate_limited() {
        let p = Scripted::new(vec![Err(ProviderError::RateLimited { retry_after: None })]);
        let err = requester(&p).request(&pair(), TravelProfile::DrivingCar).unwrap_err();
        assert_eq!(err.reason, FailureReason::RateLimited);
        assert_eq!(err.attempts, 3);
    }

    #[test]
    fn rate_limit_then_success() {
        let p = Scripted::new(vec![
            Err(ProviderError::RateLimited { retry_after: Some(Duration::ZERO) }),
            Ok(line()),
        ]);
        assert!(requester(&p).request(&pair(), TravelProfile::DrivingCar).is_ok());
    }

    #[test]
    fn invalid_input_is_not_retried() {
        let p = Scripted::new(vec![Err(ProviderError::InvalidInput("bad profile".into()))]);
        let err = requester(&p).request(&pair(), TravelProfile::DrivingCar).unwrap_err();
        assert_eq!(err.reason, FailureReason::InvalidInput);
        assert_eq!(err.attempts, 1);
    }

    #[test]
    fn unauthorized_is_fatal() {
        let p = Scripted::new(vec![Err(ProviderError::Unauthorized("bad key".into()))]);
        let err = requester(&p).request(&pair(), TravelProfile::DrivingCar).unwrap_err();
        assert_eq!(err.reason, FailureReason::Unauthorized);
        assert!(err.is_fatal());
    }

    #[test]
    fn single_vertex_answer_is_malformed() {
        let p = Scripted::new(vec![Ok(vec![c(127.0, 37.5)])]);
        let err = requester(&p).request(&pair(), TravelProfile::DrivingCar).unwrap_err();
        assert_eq!(err.reason, FailureReason::MalformedResponse);
    }

    #[test]
    fn no_route_snaps_origin_first() {
        let road = c(127.001, 37.501);
        let p = Scripted::new(vec![no_route(), Ok(line())]).snapping_to(road);
        let route = requester(&p).request(&pair(), TravelProfile::DrivingCar).unwrap();

        assert_eq!(route.snapped, SnapKind::Origin);
        // Pair endpoints are kept; only the request moved.
        assert_eq!(route.origin, pair().origin);
        let reqs = p.requests();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[1], (road, pair().destination));
        // 2 directions + 1 snap.
        assert_eq!(route.attempts, 3);
    }

    #[test]
    fn snap_strategies_run_in_order() {
        let road = c(127.001, 37.501);
        let p = Scripted::new(vec![no_route(), no_route(), no_route(), Ok(line())])
            .snapping_to(road);
        let route = requester(&p).request(&pair(), TravelProfile::DrivingCar).unwrap();

        assert_eq!(route.snapped, SnapKind::Both);
        let reqs = p.requests();
        assert_eq!(reqs[1], (road, pair().destination));
        assert_eq!(reqs[2], (pair().origin, road));
        assert_eq!(reqs[3], (road, road));
        // Each endpoint is snapped once and reused.
        assert_eq!(*p.snaps.lock().unwrap(), 2);
    }

    #[test]
    fn all_strategies_failing_is_snapping_exhausted() {
        let p = Scripted::new(vec![no_route()]).snapping_to(c(127.001, 37.501));
        let err = requester(&p).request(&pair(), TravelProfile::DrivingCar).unwrap_err();
        assert_eq!(err.reason, FailureReason::SnappingExhausted);
        assert_eq!(p.requests().len(), 4);
    }

    #[test]
    fn unsnappable_points_skip_strategies() {
        let p = Scripted::new(vec![no_route()]);
        let err = requester(&p).request(&pair(), TravelProfile::DrivingCar).unwrap_err();
        assert_eq!(err.reason, FailureReason::SnappingExhausted);
        assert_eq!(p.requests().len(), 1);
    }

    #[test]
    fn snap_budget_limits_strategies() {
        let p = Scripted::new(vec![no_route()]).snapping_to(c(127.001, 37.501));
        let err = requester(&p)
            .snap_budget(1)
            .request(&pair(), TravelProfile::DrivingCar)
            .unwrap_err();
        assert_eq!(err.reason, FailureReason::SnappingExhausted);
        assert_eq!(p.requests().len(), 2);
    }

    #[test]
    fn zero_snap_budget_reports_no_path() {
        let p = Scripted::new(vec![no_route()]);
        let err = requester(&p)
            .snap_budget(0)
            .request(&pair(), TravelProfile::DrivingCar)
            .unwrap_err();
        assert_eq!(err.reason, FailureReason::NoPathFound);
    }

    #[test]
    fn local_index_used_when_provider_cannot_snap() {
        let road = vec![c(126.99, 37.50), c(127.01, 37.50)];
        let index = RoadSnapIndex::from_polylines([road.as_slice()], 500.0);
        let p = Scripted::new(vec![no_route(), Ok(line())]);
        let route = requester(&p)
            .local_snap(std::sync::Arc::new(index))
            .request(&pair(), TravelProfile::DrivingCar)
            .unwrap();

        assert_eq!(route.snapped, SnapKind::Origin);
        let (snapped_origin, _) = p.requests()[1];
        assert!(snapped_origin.approx_eq(c(127.00, 37.50), 1e-9));
    }

    #[test]
    fn profile_recorded_on_route_and_error() {
        let p = Scripted::new(vec![Ok(line())]);
        let route = requester(&p).request(&pair(), TravelProfile::CyclingRegular).unwrap();
        assert_eq!(route.profile, TravelProfile::CyclingRegular);

        let p = Scripted::new(vec![Err(ProviderError::InvalidInput("x".into()))]);
        let err = requester(&p).request(&pair(), TravelProfile::FootWalking).unwrap_err();
        assert_eq!(err.profile, TravelProfile::FootWalking);
    }
}

// ── RetryPolicy ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod retry {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(350));
        assert_eq!(policy.backoff(64), Duration::from_millis(350));
    }

    #[test]
    fn immediate_never_waits() {
        let policy = RetryPolicy::immediate(4);
        assert_eq!(policy.max_attempts, 4);
        assert!(policy.backoff(3).is_zero());
        assert!(policy.rate_limit_pause.is_zero());
    }
}

// ── RateLimiter ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod limiter {
    use super::*;

    #[test]
    fn burst_up_to_capacity_then_waits() {
        let limiter = RateLimiter::new(RateLimit { calls: 2, period: Duration::from_secs(60) });
        assert!(limiter.reserve().is_zero());
        assert!(limiter.reserve().is_zero());
        let wait = limiter.reserve();
        assert!(wait > Duration::from_secs(25) && wait <= Duration::from_secs(30), "{wait:?}");
        // Reservations queue behind each other.
        let next = limiter.reserve();
        assert!(next > wait);
    }

    #[test]
    fn unlimited_never_waits() {
        let limiter = RateLimiter::unlimited();
        for _ in 0..1_000 {
            assert!(limiter.reserve().is_zero());
        }
        assert!(limiter.limit().is_none());
    }

    #[test]
    fn zero_calls_disables_limiting() {
        let limiter = RateLimiter::new(RateLimit::per_minute(0));
        assert!(limiter.limit().is_none());
        assert!(limiter.reserve().is_zero());
    }

    #[test]
    fn default_is_forty_per_minute() {
        assert_eq!(RateLimit::default(), RateLimit::per_minute(40));
    }
}

// ── Snap index ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod snap {
    use super::*;

    fn grid() -> RoadSnapIndex {
        let east_west = vec![c(127.00, 37.50), c(127.01, 37.50), c(127.02, 37.50)];
        let north_south = vec![c(127.03, 37.49), c(127.03, 37.51)];
        RoadSnapIndex::from_polylines([east_west.as_slice(), north_south.as_slice()], 200.0)
    }

    #[test]
    fn projects_onto_nearest_piece() {
        let idx = grid();
        assert_eq!(idx.len(), 3);
        let s = idx.snap(c(127.015, 37.5005)).unwrap();
        assert!(s.approx_eq(c(127.015, 37.50), 1e-9), "{s}");
    }

    #[test]
    fn clamps_to_segment_end() {
        let s = grid().snap(c(126.9995, 37.50)).unwrap();
        assert!(s.approx_eq(c(127.00, 37.50), 1e-9), "{s}");
    }

    #[test]
    fn picks_closer_road() {
        let s = grid().snap(c(127.0295, 37.505)).unwrap();
        assert!(s.approx_eq(c(127.03, 37.505), 1e-9), "{s}");
    }

    #[test]
    fn too_far_does_not_snap() {
        assert!(grid().snap(c(127.01, 37.52)).is_none());
    }

    #[test]
    fn empty_index_does_not_snap() {
        let idx = RoadSnapIndex::from_polylines(std::iter::empty::<&[Coordinate]>(), 1e9);
        assert!(idx.is_empty());
        assert!(idx.snap(c(127.0, 37.5)).is_none());
    }
}

// ── ORS response handling ─────────────────────────────────────────────────────

#[cfg(test)]
mod ors {
    use super::*;
    use crate::ors::{classify_error, parse_directions, parse_retry_after, parse_snap};

    fn encoded(points: &[Coordinate]) -> String {
        polyline::encode_coordinates(points.iter().map(|p| geo_types::Coord { x: p.lon, y: p.lat }), 5)
            .unwrap()
    }

    #[test]
    fn directions_geometry_decoded_lon_lat() {
        let body = format!(
            r#"{{"routes":[{{"summary":{{"distance":1234.5}},"geometry":"{}"}}]}}"#,
            encoded(&line())
        );
        let points = parse_directions(&body).unwrap();
        assert_eq!(points.len(), 3);
        for (got, want) in points.iter().zip(line()) {
            assert!(got.approx_eq(want, 1e-5), "{got} vs {want}");
        }
    }

    #[test]
    fn directions_without_routes_is_malformed() {
        assert!(matches!(parse_directions(r#"{"routes":[]}"#), Err(ProviderError::Malformed(_))));
        assert!(matches!(parse_directions("<html>"), Err(ProviderError::Malformed(_))));
    }

    #[test]
    fn ors_point_not_found_is_no_route() {
        let body = r#"{"error":{"code":2010,"message":"Could not find routable point within a radius of 2000.0 meters"}}"#;
        assert!(matches!(classify_error(404, body, None), ProviderError::NoRoute(_)));
        // The code alone is enough even when the status is generic.
        assert!(matches!(classify_error(400, body, None), ProviderError::NoRoute(_)));
    }

    #[test]
    fn route_not_found_code() {
        let body = r#"{"error":{"code":2009,"message":"Route could not be found"}}"#;
        assert!(matches!(classify_error(404, body, None), ProviderError::NoRoute(_)));
    }

    #[test]
    fn status_mapping() {
        let hint = Some(Duration::from_secs(3));
        assert_eq!(classify_error(429, "", hint), ProviderError::RateLimited { retry_after: hint });
        assert!(matches!(
            classify_error(403, r#"{"error":"Access to this API has been disallowed"}"#, None),
            ProviderError::Unauthorized(m) if m.contains("disallowed")
        ));
        assert!(matches!(classify_error(401, "", None), ProviderError::Unauthorized(_)));
        assert!(matches!(classify_error(400, r#"{"error":{"code":2003,"message":"bad"}}"#, None),
            ProviderError::InvalidInput(_)));
        assert!(matches!(classify_error(503, "busy", None), ProviderError::Network(_)));
        assert!(matches!(classify_error(418, "", None), ProviderError::Malformed(_)));
    }

    #[test]
    fn snap_location_or_null() {
        let hit = r#"{"locations":[{"location":[127.0012,37.5004],"snapped_distance":12.3}]}"#;
        assert_eq!(parse_snap(hit).unwrap(), Some(c(127.0012, 37.5004)));
        assert_eq!(parse_snap(r#"{"locations":[null]}"#).unwrap(), None);
        assert_eq!(parse_snap(r#"{"locations":[]}"#).unwrap(), None);
    }

    #[test]
    fn retry_after_seconds() {
        assert_eq!(parse_retry_after(" 12 "), Some(Duration::from_secs(12)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
