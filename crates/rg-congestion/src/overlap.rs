//! The line-overlap rule.
//!
//! Two segments overlap when their exact intersection is itself a line of
//! length greater than ε.  Crossings and end-to-end touches intersect in a
//! single point and never count.

use geo::Line;
use geo::algorithm::line_intersection::{LineIntersection, line_intersection};

use rg_core::Coordinate;

#[inline]
fn line(a: Coordinate, b: Coordinate) -> Line<f64> {
    Line::new(geo::coord! { x: a.lon, y: a.lat }, geo::coord! { x: b.lon, y: b.lat })
}

/// Length (degrees) of the shared part of `(a1, b1)` and `(a2, b2)`, or
/// `None` if they meet in at most one point.
pub fn overlap_length(a1: Coordinate, b1: Coordinate, a2: Coordinate, b2: Coordinate) -> Option<f64> {
    match line_intersection(line(a1, b1), line(a2, b2))? {
        LineIntersection::Collinear { intersection } => {
            let d = intersection.delta();
            Some(d.x.hypot(d.y))
        }
        LineIntersection::SinglePoint { .. } => None,
    }
}

/// `true` if the segments share a line piece longer than `tolerance`.
#[inline]
pub fn overlaps(a1: Coordinate, b1: Coordinate, a2: Coordinate, b2: Coordinate, tolerance: f64) -> bool {
    overlap_length(a1, b1, a2, b2).is_some_and(|len| len > tolerance)
}
