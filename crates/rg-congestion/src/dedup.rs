//! Geometric deduplication of segments.
//!
//! # Keys
//!
//! Each endpoint is snapped to the ε grid (`round(x / ε)`), and the two grid
//! points are put in ascending order, so `A→B` and `B→A` share a key.
//! Segments whose endpoints are within ε of each other are zero-length and
//! are dropped.
//!
//! # Merging
//!
//! Two endpoints closer than ε can still round into neighbouring cells, so a
//! segment with no entry under its own key is also compared against the
//! entries of the ±1 neighbouring cells of both endpoints.  It joins the
//! first entry whose anchor (the first segment that created it) matches both
//! endpoints within ε, in either direction.
//!
//! Segments are merged in ascending endpoint order (compared `lon`, then
//! `lat`), so anchors, and the geometry kept for each merged segment, do not
//! depend on input order and stay exactly on input vertices.  `SegmentId`s
//! are handed out after sorting the keys.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use rg_core::{Coordinate, PairId, SegmentId};

use crate::{Segment, ValidationError, ValidationResult};

/// Grid cell of one endpoint.
type Cell = (i64, i64);

/// Direction-independent segment key: two distinct cells, ascending.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentKey(Cell, Cell);

impl SegmentKey {
    /// `None` for zero-length segments.
    pub fn new(a: Coordinate, b: Coordinate, tolerance: f64) -> Option<Self> {
        Self::oriented(a, b, tolerance).map(|(key, ..)| key)
    }

    /// The key plus the endpoints reordered to match it.
    fn oriented(a: Coordinate, b: Coordinate, tolerance: f64) -> Option<(Self, Coordinate, Coordinate)> {
        if a.approx_eq(b, tolerance) {
            return None;
        }
        let (ca, cb) = (cell(a, tolerance), cell(b, tolerance));
        match ca.cmp(&cb) {
            Ordering::Less => Some((SegmentKey(ca, cb), a, b)),
            Ordering::Greater => Some((SegmentKey(cb, ca), b, a)),
            Ordering::Equal => None,
        }
    }

    fn from_cells(x: Cell, y: Cell) -> Option<Self> {
        match x.cmp(&y) {
            Ordering::Less => Some(SegmentKey(x, y)),
            Ordering::Greater => Some(SegmentKey(y, x)),
            Ordering::Equal => None,
        }
    }

    /// Keys formed from the ±1 neighbourhoods of both cells, own key first.
    fn neighbourhood(self) -> impl Iterator<Item = SegmentKey> {
        let SegmentKey(x, y) = self;
        std::iter::once(self).chain(OFFSETS.into_iter().flat_map(move |dx| {
            OFFSETS
                .into_iter()
                .filter_map(move |dy| Self::from_cells(shift(x, dx), shift(y, dy)))
                .filter(move |k| *k != self)
        }))
    }
}

const OFFSETS: [Cell; 9] = [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 0), (0, 1), (1, -1), (1, 0), (1, 1)];

#[inline]
fn shift(c: Cell, d: Cell) -> Cell {
    (c.0 + d.0, c.1 + d.1)
}

fn cmp_endpoints(x: (Coordinate, Coordinate), y: (Coordinate, Coordinate)) -> Ordering {
    x.0.lon
        .total_cmp(&y.0.lon)
        .then(x.0.lat.total_cmp(&y.0.lat))
        .then(x.1.lon.total_cmp(&y.1.lon))
        .then(x.1.lat.total_cmp(&y.1.lat))
}

#[inline]
fn cell(c: Coordinate, tolerance: f64) -> Cell {
    ((c.lon / tolerance).round() as i64, (c.lat / tolerance).round() as i64)
}

/// A deduplicated segment with everything that merged into it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniqueSegment {
    pub id: SegmentId,
    pub a: Coordinate,
    pub b: Coordinate,
    /// Sum of contributing trip counts.
    pub trip_mass: u64,
    /// Number of contributing segments.
    pub occurrences: u32,
    /// Number of distinct contributing routes.
    pub routes: u32,
}

/// Output of [`dedup`].
#[derive(Clone, Debug, Default)]
pub struct Dedup {
    /// Ordered by `id`, which is also key order.
    pub unique: Vec<UniqueSegment>,
    /// Zero-length segments removed.
    pub dropped: usize,
}

struct Merge {
    anchor: (Coordinate, Coordinate),
    trip_mass: u64,
    occurrences: u32,
    pairs: Vec<PairId>,
}

impl Merge {
    /// `(a, b)` reoriented to the anchor if both endpoints match within ε.
    fn matches(&self, a: Coordinate, b: Coordinate, tolerance: f64) -> Option<(Coordinate, Coordinate)> {
        let (p, q) = self.anchor;
        if a.approx_eq(p, tolerance) && b.approx_eq(q, tolerance) {
            Some((a, b))
        } else if a.approx_eq(q, tolerance) && b.approx_eq(p, tolerance) {
            Some((b, a))
        } else {
            None
        }
    }
}

/// Existing entry that `(a, b)` belongs to, under its own key or a neighbour.
fn find_entry(
    merged: &FxHashMap<SegmentKey, Merge>,
    key: SegmentKey,
    a: Coordinate,
    b: Coordinate,
    tolerance: f64,
) -> Option<SegmentKey> {
    key.neighbourhood()
        .find(|k| merged.get(k).is_some_and(|m| m.matches(a, b, tolerance).is_some()))
}

/// Merge geometrically identical segments.
///
/// Fails only if there are more segments than `SegmentId` can number.
pub fn dedup(segments: &[Segment], tolerance: f64) -> ValidationResult<Dedup> {
    u32::try_from(segments.len()).map_err(|_| ValidationError::TooManySegments(segments.len()))?;

    let mut dropped = 0usize;
    let mut oriented: Vec<(SegmentKey, Coordinate, Coordinate, &Segment)> = segments
        .iter()
        .filter_map(|seg| match SegmentKey::oriented(seg.a, seg.b, tolerance) {
            Some((key, a, b)) => Some((key, a, b, seg)),
            None => {
                dropped += 1;
                None
            }
        })
        .collect();
    oriented.sort_by(|x, y| {
        cmp_endpoints((x.1, x.2), (y.1, y.2))
            .then(x.3.pair_id.cmp(&y.3.pair_id))
            .then(x.3.position.cmp(&y.3.position))
    });

    let mut merged: FxHashMap<SegmentKey, Merge> = FxHashMap::default();
    for (key, a, b, seg) in oriented {
        let key = find_entry(&merged, key, a, b, tolerance).unwrap_or(key);
        let m = merged.entry(key).or_insert_with(|| Merge {
            anchor: (a, b),
            trip_mass: 0,
            occurrences: 0,
            pairs: Vec::new(),
        });
        m.trip_mass += seg.trip_count as u64;
        m.occurrences += 1;
        m.pairs.push(seg.pair_id);
    }

    let mut keyed: Vec<(SegmentKey, Merge)> = merged.into_iter().collect();
    keyed.sort_unstable_by_key(|(k, _)| *k);

    let mut unique = Vec::with_capacity(keyed.len());
    for (i, (_, mut m)) in keyed.into_iter().enumerate() {
        m.pairs.sort_unstable();
        m.pairs.dedup();
        let (a, b) = m.anchor;
        unique.push(UniqueSegment {
            id: SegmentId::try_from(i).map_err(|_| ValidationError::TooManySegments(segments.len()))?,
            a,
            b,
            trip_mass: m.trip_mass,
            occurrences: m.occurrences,
            routes: u32::try_from(m.pairs.len()).map_err(|_| ValidationError::TooManySegments(segments.len()))?,
        });
    }

    if dropped > 0 {
        log::info!("dropped {dropped} zero-length segments");
    }
    log::debug!("{} segments merged into {} unique", segments.len() - dropped, unique.len());
    Ok(Dedup { unique, dropped })
}
