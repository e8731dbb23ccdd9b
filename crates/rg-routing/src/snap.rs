//! Local nearest-road snapping.
//!
//! Used when the provider cannot snap a point itself.  Known road geometry
//! (typically polylines of previously generated routes) is split into
//! straight pieces and bulk-loaded into an R-tree; a query returns the
//! closest point on the closest piece.
//!
//! Distances inside the tree are planar in degrees with longitude scaled by
//! `cos(lat)` of the network's mean latitude, which keeps nearest-piece
//! ordering correct at city scale.  The reported snap distance is
//! haversine metres.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use rg_core::Coordinate;

// ── R-tree road entry ─────────────────────────────────────────────────────────

/// One straight road piece in scaled `[x, y]` space.
#[derive(Clone, Debug)]
struct RoadEntry {
    a: [f64; 2],
    b: [f64; 2],
}

impl RoadEntry {
    /// Closest point on the piece to `p`.
    fn nearest_point(&self, p: &[f64; 2]) -> [f64; 2] {
        let (dx, dy) = (self.b[0] - self.a[0], self.b[1] - self.a[1]);
        let len2 = dx * dx + dy * dy;
        if len2 == 0.0 {
            return self.a;
        }
        let t = (((p[0] - self.a[0]) * dx + (p[1] - self.a[1]) * dy) / len2).clamp(0.0, 1.0);
        [self.a[0] + t * dx, self.a[1] + t * dy]
    }
}

impl RTreeObject for RoadEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.a, self.b)
    }
}

impl PointDistance for RoadEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let q = self.nearest_point(point);
        let (dx, dy) = (q[0] - point[0], q[1] - point[1]);
        dx * dx + dy * dy
    }
}

// ── RoadSnapIndex ─────────────────────────────────────────────────────────────

/// Read-only spatial index over known road geometry.
pub struct RoadSnapIndex {
    tree: RTree<RoadEntry>,
    lon_scale: f64,
    max_distance_m: f64,
}

impl RoadSnapIndex {
    /// Build from road polylines.  Points farther than `max_distance_m` from
    /// every road do not snap.
    pub fn from_polylines<'a, I>(polylines: I, max_distance_m: f64) -> Self
    where
        I: IntoIterator<Item = &'a [Coordinate]>,
    {
        let lines: Vec<&[Coordinate]> = polylines.into_iter().collect();

        let (sum, n) = lines
            .iter()
            .flat_map(|l| l.iter())
            .fold((0.0, 0usize), |(s, n), c| (s + c.lat, n + 1));
        let mean_lat = if n == 0 { 0.0 } else { sum / n as f64 };
        let lon_scale = mean_lat.to_radians().cos().max(1e-6);

        let entries: Vec<RoadEntry> = lines
            .iter()
            .flat_map(|l| l.windows(2))
            .map(|w| RoadEntry {
                a: [w[0].lon * lon_scale, w[0].lat],
                b: [w[1].lon * lon_scale, w[1].lat],
            })
            .collect();

        log::debug!("road snap index: {} pieces from {} polylines", entries.len(), lines.len());
        Self { tree: RTree::bulk_load(entries), lon_scale, max_distance_m }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Nearest point on the known road network, if one lies within the
    /// configured distance.
    pub fn snap(&self, point: Coordinate) -> Option<Coordinate> {
        let q = [point.lon * self.lon_scale, point.lat];
        let entry = self.tree.nearest_neighbor(&q)?;
        let [x, y] = entry.nearest_point(&q);
        let snapped = Coordinate::new(x / self.lon_scale, y);
        (point.distance_m(snapped) <= self.max_distance_m).then_some(snapped)
    }
}
