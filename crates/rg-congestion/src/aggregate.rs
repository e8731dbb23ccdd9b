//! The `CongestionAggregator`.

use serde::{Deserialize, Serialize};

use rg_core::{Coordinate, SegmentId};
use rg_routing::Route;

use crate::{
    Segment, SegmentIndex, UniqueSegment, ValidationError, ValidationResult, dedup, decompose_all,
    overlap,
};

/// Default ε in degrees, about 0.1 m.  Finer than the 1e-5 precision of
/// encoded polylines, so distinct polyline vertices never merge.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

// ── CongestionResult ──────────────────────────────────────────────────────────

/// One row of the congestion ranking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CongestionResult {
    pub segment: SegmentId,
    pub a: Coordinate,
    pub b: Coordinate,
    /// Other segment occurrences overlapping this one as a line, duplicates
    /// of this segment included.
    pub crossing_count: u64,
    /// Distinct other unique segments overlapping this one as a line.
    pub overlapping_segments: u32,
    pub trip_mass: u64,
    /// Trip mass of the overlapping other unique segments.
    pub overlap_trips: u64,
    /// Trips using this stretch of road: `trip_mass + overlap_trips`.
    /// The trip-weighted counterpart of `crossing_count`.
    pub crossing_volume: u64,
    pub occurrences: u32,
    pub routes: u32,
}

// ── CongestionAggregator ──────────────────────────────────────────────────────

/// Ranks unique segments by how many other segment occurrences share road
/// with them.
///
/// ```text
/// segments ─▶ dedup (ε grid) ─▶ R-tree ─▶ candidate pairs ─▶ overlap rule
///                                                          └▶ per-segment sums ─▶ sort
/// ```
#[derive(Copy, Clone, Debug)]
pub struct CongestionAggregator {
    tolerance: f64,
}

impl Default for CongestionAggregator {
    fn default() -> Self {
        Self { tolerance: DEFAULT_TOLERANCE }
    }
}

impl CongestionAggregator {
    pub fn new(tolerance: f64) -> ValidationResult<Self> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(ValidationError::InvalidTolerance(tolerance));
        }
        Ok(Self { tolerance })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Decompose `routes` and aggregate their segments.
    pub fn aggregate_routes(&self, routes: &[Route]) -> ValidationResult<Vec<CongestionResult>> {
        self.aggregate(&decompose_all(routes)?)
    }

    /// One result per unique segment, sorted by crossing count descending,
    /// then trip mass descending, then id ascending.
    pub fn aggregate(&self, segments: &[Segment]) -> ValidationResult<Vec<CongestionResult>> {
        let unique = dedup(segments, self.tolerance)?.unique;
        let index = SegmentIndex::build(&unique, self.tolerance);
        let pairs = self.overlap_pairs(&unique, &index);

        let mut results: Vec<CongestionResult> = unique
            .iter()
            .map(|u| CongestionResult {
                segment: u.id,
                a: u.a,
                b: u.b,
                crossing_count: u.occurrences as u64 - 1,
                overlapping_segments: 0,
                trip_mass: u.trip_mass,
                overlap_trips: 0,
                crossing_volume: u.trip_mass,
                occurrences: u.occurrences,
                routes: u.routes,
            })
            .collect();

        // `results` is indexed by SegmentId until sorted.
        for &(i, j) in &pairs {
            let (si, sj) = (&unique[i], &unique[j]);
            let ri = &mut results[i];
            ri.crossing_count += sj.occurrences as u64;
            ri.overlapping_segments += 1;
            ri.overlap_trips += sj.trip_mass;
            ri.crossing_volume += sj.trip_mass;
            let rj = &mut results[j];
            rj.crossing_count += si.occurrences as u64;
            rj.overlapping_segments += 1;
            rj.overlap_trips += si.trip_mass;
            rj.crossing_volume += si.trip_mass;
        }

        results.sort_by(|x, y| {
            y.crossing_count
                .cmp(&x.crossing_count)
                .then(y.trip_mass.cmp(&x.trip_mass))
                .then(x.segment.cmp(&y.segment))
        });

        log::info!(
            "congestion: {} segments, {} unique, {} overlapping pairs",
            segments.len(),
            unique.len(),
            pairs.len()
        );
        Ok(results)
    }

    /// Index pairs `(i, j)` with `i < j` that overlap as a line.
    fn overlap_pairs(&self, unique: &[UniqueSegment], index: &SegmentIndex) -> Vec<(usize, usize)> {
        let eps = self.tolerance;
        let partners = |i: usize| -> Vec<(usize, usize)> {
            let u = &unique[i];
            let mut found: Vec<(usize, usize)> = index
                .candidates(u)
                .map(|id| id.0 as usize)
                .filter(|&j| j > i)
                .filter(|&j| overlap::overlaps(u.a, u.b, unique[j].a, unique[j].b, eps))
                .map(|j| (i, j))
                .collect();
            found.sort_unstable();
            found
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            (0..unique.len()).into_par_iter().flat_map_iter(partners).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            (0..unique.len()).flat_map(partners).collect()
        }
    }
}
