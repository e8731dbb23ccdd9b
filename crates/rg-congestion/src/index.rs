//! R-tree over unique segments.
//!
//! Envelopes are inflated by ε so segments that touch within tolerance are
//! still reported as candidates.  The index only narrows the search; the
//! overlap rule in [`overlap`][crate::overlap] decides what counts.

use rstar::{AABB, RTree, RTreeObject};

use rg_core::SegmentId;

use crate::UniqueSegment;

#[derive(Clone, Debug)]
struct SegmentEntry {
    id: SegmentId,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Read-only after construction.
pub struct SegmentIndex {
    tree: RTree<SegmentEntry>,
    tolerance: f64,
}

impl SegmentIndex {
    /// Bulk-load the index.
    pub fn build(segments: &[UniqueSegment], tolerance: f64) -> Self {
        let entries = segments
            .iter()
            .map(|s| SegmentEntry { id: s.id, envelope: inflated(s, tolerance) })
            .collect();
        Self { tree: RTree::bulk_load(entries), tolerance }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// IDs of segments whose inflated envelopes meet `segment`'s, itself
    /// included.
    pub fn candidates<'a>(&'a self, segment: &UniqueSegment) -> impl Iterator<Item = SegmentId> + 'a {
        let query = inflated(segment, self.tolerance);
        self.tree.locate_in_envelope_intersecting(&query).map(|e| e.id)
    }
}

fn inflated(s: &UniqueSegment, tolerance: f64) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [s.a.lon.min(s.b.lon) - tolerance, s.a.lat.min(s.b.lat) - tolerance],
        [s.a.lon.max(s.b.lon) + tolerance, s.a.lat.max(s.b.lat) + tolerance],
    )
}
