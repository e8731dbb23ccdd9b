//! `CoordinatePair`: one simulated trip waiting to be routed.

use serde::{Deserialize, Serialize};

use crate::{Coordinate, PairId, TravelProfile, ZoneCode};

/// An origin/destination coordinate pair plus the trip volume it stands for.
///
/// Produced by the zone sampler (or from a fixed-origin list) and consumed
/// exactly once by the route requester.  Every route and every route error
/// carries the `id` of the pair that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordinatePair {
    pub id: PairId,
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// Trip count inherited from the OD record.
    pub trip_count: u32,
    /// Per-pair profile; overrides the batch default when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<TravelProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_zone: Option<ZoneCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_zone: Option<ZoneCode>,
    /// `true` when the destination is the configured facility point rather
    /// than a sampled zone coordinate.
    #[serde(default)]
    pub destination_fixed: bool,
}

impl CoordinatePair {
    /// A pair with no zone provenance (fixed-origin scenarios, tests).
    pub fn new(id: PairId, origin: Coordinate, destination: Coordinate, trip_count: u32) -> Self {
        Self {
            id,
            origin,
            destination,
            trip_count,
            profile: None,
            origin_zone: None,
            destination_zone: None,
            destination_fixed: false,
        }
    }

    /// The profile to route with: the pair's own, else `default`.
    #[inline]
    pub fn effective_profile(&self, default: TravelProfile) -> TravelProfile {
        self.profile.unwrap_or(default)
    }
}
