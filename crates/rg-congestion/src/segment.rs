//! Route → atomic two-point segments.

use serde::{Deserialize, Serialize};

use rg_core::{Coordinate, PairId};
use rg_routing::Route;

use crate::{ValidationError, ValidationResult};

/// One leg `(a, b)` between consecutive vertices of a route.  Direction is
/// kept for reconstruction but ignored by deduplication.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub pair_id: PairId,
    /// Index of `a` in the owning route.
    pub position: u32,
    pub a: Coordinate,
    pub b: Coordinate,
    pub trip_count: u32,
}

/// Split `route` into `vertex_count − 1` segments carrying its trip count.
pub fn decompose(route: &Route) -> ValidationResult<Vec<Segment>> {
    let pts = &route.points;
    if pts.len() < 2 {
        return Err(ValidationError::TooFewVertices {
            pair_id: route.pair_id,
            vertices: pts.len(),
        });
    }
    if let Some(index) = pts.iter().position(|c| !c.lon.is_finite() || !c.lat.is_finite()) {
        return Err(ValidationError::NonFiniteVertex { pair_id: route.pair_id, index });
    }

    pts.windows(2)
        .enumerate()
        .map(|(i, w)| {
            let position = u32::try_from(i).map_err(|_| ValidationError::TooManySegments(pts.len() - 1))?;
            Ok(Segment { pair_id: route.pair_id, position, a: w[0], b: w[1], trip_count: route.trip_count })
        })
        .collect()
}

/// Concatenated segments of every route; stops at the first invalid route.
pub fn decompose_all(routes: &[Route]) -> ValidationResult<Vec<Segment>> {
    let mut out = Vec::with_capacity(routes.iter().map(|r| r.points.len().saturating_sub(1)).sum());
    for route in routes {
        out.extend(decompose(route)?);
    }
    log::debug!("decomposed {} routes into {} segments", routes.len(), out.len());
    Ok(out)
}
