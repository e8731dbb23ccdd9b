//! Unit tests for rg-congestion.

use rg_core::{Coordinate, PairId, SegmentId, TravelProfile};
use rg_routing::{Route, SnapKind};

use crate::{CongestionAggregator, CongestionResult, Segment};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn c(lon: f64, lat: f64) -> Coordinate {
    Coordinate::new(lon, lat)
}

fn route(id: u32, points: &[[f64; 2]], trips: u32) -> Route {
    let points: Vec<Coordinate> = points.iter().copied().map(Coordinate::from).collect();
    Route {
        pair_id: PairId(id),
        origin: points[0],
        destination: points[points.len() - 1],
        points,
        trip_count: trips,
        profile: TravelProfile::DrivingCar,
        snapped: SnapKind::None,
        attempts: 1,
    }
}

fn seg(pair: u32, a: [f64; 2], b: [f64; 2], trips: u32) -> Segment {
    Segment { pair_id: PairId(pair), position: 0, a: a.into(), b: b.into(), trip_count: trips }
}

fn aggregate(segments: &[Segment]) -> Vec<CongestionResult> {
    CongestionAggregator::default().aggregate(segments).unwrap()
}

/// Result whose endpoints match `a`/`b` in either order.
fn find<'r>(results: &'r [CongestionResult], a: [f64; 2], b: [f64; 2]) -> &'r CongestionResult {
    let (a, b) = (Coordinate::from(a), Coordinate::from(b));
    results
        .iter()
        .find(|r| {
            (r.a.approx_eq(a, 1e-9) && r.b.approx_eq(b, 1e-9))
                || (r.a.approx_eq(b, 1e-9) && r.b.approx_eq(a, 1e-9))
        })
        .unwrap()
}

// ── Decomposition ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod decomposition {
    use super::*;
    use crate::{ValidationError, decompose, decompose_all};

    #[test]
    fn vertex_count_minus_one_segments() {
        let r = route(3, &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [2.0, 1.0], [2.0, 3.0]], 7);
        let segments = decompose(&r).unwrap();

        assert_eq!(segments.len(), r.vertex_count() - 1);
        assert!(segments.iter().all(|s| s.trip_count == 7 && s.pair_id == PairId(3)));
        let positions: Vec<u32> = segments.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn segments_reconstruct_the_route() {
        let r = route(0, &[[127.01, 37.5], [127.02, 37.51], [127.02, 37.52], [127.03, 37.52]], 1);
        let segments = decompose(&r).unwrap();

        let mut rebuilt = vec![segments[0].a];
        rebuilt.extend(segments.iter().map(|s| s.b));
        assert_eq!(rebuilt, r.points);
        for w in segments.windows(2) {
            assert_eq!(w[0].b, w[1].a);
        }
    }

    #[test]
    fn too_few_vertices_rejected() {
        let r = route(9, &[[0.0, 0.0]], 1);
        assert_eq!(
            decompose(&r).unwrap_err(),
            ValidationError::TooFewVertices { pair_id: PairId(9), vertices: 1 }
        );
    }

    #[test]
    fn non_finite_vertex_rejected() {
        let r = route(2, &[[0.0, 0.0], [f64::NAN, 1.0], [2.0, 2.0]], 1);
        assert_eq!(
            decompose(&r).unwrap_err(),
            ValidationError::NonFiniteVertex { pair_id: PairId(2), index: 1 }
        );
    }

    #[test]
    fn decompose_all_stops_at_first_invalid_route() {
        let routes = vec![
            route(0, &[[0.0, 0.0], [1.0, 0.0]], 1),
            route(1, &[[5.0, 5.0]], 1),
            route(2, &[[7.0, 7.0]], 1),
        ];
        let err = decompose_all(&routes).unwrap_err();
        assert!(matches!(err, ValidationError::TooFewVertices { pair_id: PairId(1), .. }));
    }

    #[test]
    fn decompose_all_concatenates() {
        let routes = vec![
            route(0, &[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]], 1),
            route(1, &[[0.0, 1.0], [1.0, 1.0]], 4),
        ];
        let segments = decompose_all(&routes).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2].pair_id, PairId(1));
        assert_eq!(segments[2].trip_count, 4);
    }
}

// ── Deduplication ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod deduplication {
    use super::*;
    use crate::{DEFAULT_TOLERANCE, SegmentKey, dedup};

    #[test]
    fn direction_is_ignored() {
        let out = dedup(
            &[seg(0, [0.0, 0.0], [1.0, 0.0], 2), seg(1, [1.0, 0.0], [0.0, 0.0], 3)],
            DEFAULT_TOLERANCE,
        )
        .unwrap();
        assert_eq!(out.unique.len(), 1);
        let u = &out.unique[0];
        assert_eq!(u.trip_mass, 5);
        assert_eq!(u.occurrences, 2);
        assert_eq!(u.routes, 2);
    }

    #[test]
    fn endpoints_within_tolerance_merge() {
        let out = dedup(
            &[seg(0, [0.0, 0.0], [1.0, 0.0], 1), seg(1, [0.0000001, 0.0], [1.0, 0.0000002], 1)],
            DEFAULT_TOLERANCE,
        )
        .unwrap();
        assert_eq!(out.unique.len(), 1);
    }

    #[test]
    fn endpoints_straddling_a_cell_edge_merge() {
        // Both origins lie within 2e-13 of the lat cell boundary at 0.5ε.
        let lo = [0.0, 0.5e-6 - 1e-13];
        let hi = [0.0, 0.5e-6 + 1e-13];
        assert_ne!(SegmentKey::new(lo.into(), c(0.01, 0.01), 1e-6), SegmentKey::new(hi.into(), c(0.01, 0.01), 1e-6));

        let segments = [seg(0, lo, [0.01, 0.01], 2), seg(1, hi, [0.01, 0.01], 3)];
        let out = dedup(&segments, DEFAULT_TOLERANCE).unwrap();
        assert_eq!(out.unique.len(), 1);
        assert_eq!(out.unique[0].occurrences, 2);
        assert_eq!(out.unique[0].trip_mass, 5);

        let results = aggregate(&segments);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].crossing_count, 1);
    }

    #[test]
    fn straddling_merge_does_not_depend_on_input_order() {
        let mut segments = vec![
            seg(0, [0.0, 0.5e-6 + 1e-13], [0.01, 0.01], 1),
            seg(1, [0.01, 0.01], [0.0, 0.5e-6 - 1e-13], 1),
            seg(2, [0.0, 0.0], [0.0, 1.0], 1),
        ];
        let first = dedup(&segments, DEFAULT_TOLERANCE).unwrap().unique;
        segments.reverse();
        let second = dedup(&segments, DEFAULT_TOLERANCE).unwrap().unique;
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn neighbouring_cells_beyond_tolerance_stay_apart() {
        let out = dedup(
            &[seg(0, [0.0, 0.0], [1.0, 0.0], 1), seg(1, [0.0, 1.2e-6], [1.0, 0.0], 1)],
            DEFAULT_TOLERANCE,
        )
        .unwrap();
        assert_eq!(out.unique.len(), 2);
    }

    #[test]
    fn repeated_traversal_by_one_route_counts_one_route() {
        let out = dedup(
            &[seg(4, [0.0, 0.0], [1.0, 0.0], 1), seg(4, [1.0, 0.0], [0.0, 0.0], 1)],
            DEFAULT_TOLERANCE,
        )
        .unwrap();
        assert_eq!(out.unique[0].occurrences, 2);
        assert_eq!(out.unique[0].routes, 1);
    }

    #[test]
    fn zero_length_segments_dropped() {
        let out = dedup(
            &[
                seg(0, [1.0, 1.0], [1.0, 1.0], 1),
                seg(0, [1.0, 1.0], [1.0000002, 1.0], 1),
                seg(0, [1.0, 1.0], [2.0, 1.0], 1),
            ],
            DEFAULT_TOLERANCE,
        )
        .unwrap();
        assert_eq!(out.dropped, 2);
        assert_eq!(out.unique.len(), 1);
    }

    #[test]
    fn key_is_none_for_collapsed_segment() {
        assert!(SegmentKey::new(c(3.0, 3.0), c(3.0, 3.0), 1e-6).is_none());
        assert_eq!(
            SegmentKey::new(c(0.0, 0.0), c(1.0, 2.0), 1e-6),
            SegmentKey::new(c(1.0, 2.0), c(0.0, 0.0), 1e-6)
        );
    }

    #[test]
    fn ids_do_not_depend_on_input_order() {
        let mut segments = vec![
            seg(0, [5.0, 5.0], [6.0, 5.0], 1),
            seg(1, [0.0, 0.0], [1.0, 0.0], 1),
            seg(2, [2.0, 3.0], [2.0, 4.0], 1),
        ];
        let first = dedup(&segments, DEFAULT_TOLERANCE).unwrap().unique;
        segments.reverse();
        let second = dedup(&segments, DEFAULT_TOLERANCE).unwrap().unique;

        assert_eq!(first, second);
        let ids: Vec<SegmentId> = first.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![SegmentId(0), SegmentId(1), SegmentId(2)]);
    }
}

// ── Overlap rule ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod overlap_rule {
    use super::*;
    use crate::overlap::{overlap_length, overlaps};

    #[test]
    fn point_touch_is_not_an_overlap() {
        assert_eq!(overlap_length(c(0.0, 0.0), c(1.0, 1.0), c(1.0, 1.0), c(2.0, 0.0)), None);
    }

    #[test]
    fn proper_crossing_is_not_an_overlap() {
        assert_eq!(overlap_length(c(0.0, 0.0), c(2.0, 2.0), c(0.0, 2.0), c(2.0, 0.0)), None);
    }

    #[test]
    fn collinear_end_to_end_is_not_an_overlap() {
        assert!(!overlaps(c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(2.0, 0.0), 1e-6));
    }

    #[test]
    fn partial_collinear_overlap_has_its_length() {
        let len = overlap_length(c(0.0, 0.0), c(2.0, 0.0), c(1.0, 0.0), c(3.0, 0.0)).unwrap();
        assert!((len - 1.0).abs() < 1e-12);
        assert!(overlaps(c(0.0, 0.0), c(2.0, 0.0), c(1.0, 0.0), c(3.0, 0.0), 1e-6));
    }

    #[test]
    fn contained_segment_overlaps() {
        assert!(overlaps(c(0.0, 0.0), c(4.0, 4.0), c(1.0, 1.0), c(2.0, 2.0), 1e-6));
    }

    #[test]
    fn parallel_disjoint_lines_do_not_overlap() {
        assert_eq!(overlap_length(c(0.0, 0.0), c(2.0, 0.0), c(0.0, 1.0), c(2.0, 1.0)), None);
    }
}

// ── Index ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod index {
    use super::*;
    use crate::{DEFAULT_TOLERANCE, SegmentIndex, dedup};

    #[test]
    fn candidates_are_near_segments_only() {
        let unique = dedup(
            &[
                seg(0, [0.0, 0.0], [2.0, 0.0], 1),
                seg(0, [1.0, -1.0], [1.0, 1.0], 1),
                seg(0, [10.0, 10.0], [11.0, 10.0], 1),
            ],
            DEFAULT_TOLERANCE,
        )
        .unwrap()
        .unique;
        let index = SegmentIndex::build(&unique, DEFAULT_TOLERANCE);
        assert_eq!(index.len(), 3);

        let far = unique.iter().find(|u| u.a.lon == 10.0).unwrap();
        let mut got: Vec<SegmentId> = index.candidates(&unique[0]).collect();
        got.sort();
        assert!(got.contains(&unique[0].id));
        assert!(!got.contains(&far.id));
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn empty_index() {
        let index = SegmentIndex::build(&[], DEFAULT_TOLERANCE);
        assert!(index.is_empty());
    }
}

// ── Aggregation ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod aggregation {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::{DEFAULT_TOLERANCE, ValidationError, dedup, overlap::overlaps};

    #[test]
    fn point_crossings_never_count() {
        let results = aggregate(&[
            seg(0, [0.0, 0.0], [1.0, 1.0], 1),
            seg(1, [1.0, 1.0], [2.0, 0.0], 1),
        ]);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.crossing_count == 0 && r.overlapping_segments == 0));
    }

    #[test]
    fn line_overlaps_count_once_each_way() {
        let results = aggregate(&[
            seg(0, [0.0, 0.0], [2.0, 0.0], 3),
            seg(1, [1.0, 0.0], [3.0, 0.0], 5),
        ]);
        let left = find(&results, [0.0, 0.0], [2.0, 0.0]);
        let right = find(&results, [1.0, 0.0], [3.0, 0.0]);
        assert_eq!((left.crossing_count, right.crossing_count), (1, 1));
        assert_eq!((left.overlapping_segments, right.overlapping_segments), (1, 1));
        assert_eq!(left.overlap_trips, 5);
        assert_eq!(right.overlap_trips, 3);
        assert_eq!((left.crossing_volume, right.crossing_volume), (8, 8));
    }

    #[test]
    fn shared_sub_segment_end_to_end() {
        let routes = vec![
            route(0, &[[0.0, 0.0], [1.0, 0.0], [2.0, 1.0], [3.0, 1.0]], 2),
            route(1, &[[0.0, 3.0], [1.0, 0.0], [2.0, 1.0], [2.0, 4.0]], 3),
        ];
        let results = CongestionAggregator::default().aggregate_routes(&routes).unwrap();

        assert_eq!(results.len(), 5);
        let shared = &results[0];
        assert!(shared.a.approx_eq(c(1.0, 0.0), 1e-9) && shared.b.approx_eq(c(2.0, 1.0), 1e-9));
        assert_eq!(shared.crossing_count, 1);
        assert_eq!(shared.trip_mass, 5);
        assert_eq!(shared.routes, 2);
        assert!(results[1..].iter().all(|r| r.crossing_count == 0));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let routes = vec![
            route(0, &[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0]], 1),
            route(1, &[[1.0, 0.0], [3.0, 0.0], [3.0, 1.0]], 2),
            route(2, &[[2.0, 2.0], [2.0, 0.0], [0.0, 0.0]], 4),
        ];
        let agg = CongestionAggregator::default();
        let first = agg.aggregate_routes(&routes).unwrap();
        let second = agg.aggregate_routes(&routes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn ordering_is_crossings_then_mass_then_id() {
        let mut segments = Vec::new();
        for i in 0..3 {
            segments.push(seg(i, [10.0, 10.0], [11.0, 10.0], 1));
            segments.push(seg(i, [20.0, 20.0], [21.0, 20.0], 5));
        }
        segments.push(seg(9, [30.0, 30.0], [31.0, 30.0], 100));
        segments.push(seg(9, [50.0, 0.0], [51.0, 0.0], 1));
        segments.push(seg(9, [40.0, 0.0], [41.0, 0.0], 1));

        let results = aggregate(&segments);
        let firsts: Vec<f64> = results.iter().map(|r| r.a.lon.round()).collect();
        assert_eq!(firsts, vec![20.0, 10.0, 30.0, 40.0, 50.0]);
        assert_eq!(results[0].crossing_count, 2);
        assert_eq!(results[1].crossing_count, 2);
        assert!(results[3].segment < results[4].segment);
    }

    #[test]
    fn matches_brute_force_and_is_symmetric() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut segments = Vec::new();
        while segments.len() < 60 {
            let a = [rng.gen_range(0..4) as f64, rng.gen_range(0..4) as f64];
            let b = [rng.gen_range(0..4) as f64, rng.gen_range(0..4) as f64];
            if a != b {
                let pair = segments.len() as u32 / 3;
                segments.push(seg(pair, a, b, rng.gen_range(1..5)));
            }
        }

        let unique = dedup(&segments, DEFAULT_TOLERANCE).unwrap().unique;
        let n = unique.len();
        let mut crossings: Vec<u64> = unique.iter().map(|u| u.occurrences as u64 - 1).collect();
        let mut partners = vec![0u32; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let (u, v) = (&unique[i], &unique[j]);
                let ij = overlaps(u.a, u.b, v.a, v.b, DEFAULT_TOLERANCE);
                let ji = overlaps(v.a, v.b, u.a, u.b, DEFAULT_TOLERANCE);
                assert_eq!(ij, ji, "overlap of {i} and {j} is not symmetric");
                if ij {
                    crossings[i] += v.occurrences as u64;
                    partners[i] += 1;
                }
            }
        }

        let results = aggregate(&segments);
        assert_eq!(results.len(), n);
        for r in &results {
            let i = r.segment.index();
            assert_eq!(r.crossing_count, crossings[i], "crossing count of {}", r.segment);
            assert_eq!(r.overlapping_segments, partners[i], "partners of {}", r.segment);
        }
        let total: u32 = results.iter().map(|r| r.overlapping_segments).sum();
        assert_eq!(total % 2, 0);
    }

    #[test]
    fn empty_input() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn tolerance_must_be_positive_and_finite() {
        for bad in [0.0, -1e-6, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                CongestionAggregator::new(bad),
                Err(ValidationError::InvalidTolerance(_))
            ));
        }
        assert_eq!(CongestionAggregator::new(1e-5).unwrap().tolerance(), 1e-5);
    }

    #[test]
    fn invalid_route_fails_aggregation() {
        let routes = vec![route(0, &[[0.0, 0.0]], 1)];
        assert!(CongestionAggregator::default().aggregate_routes(&routes).is_err());
    }
}
