//! Pairs for the fixed-origins scenario: user-supplied origins, one shared
//! destination, one trip each.

use rg_core::{Coordinate, CoordinatePair, PairId, TravelProfile};

pub fn pairs_from_fixed_origins(
    origins: &[Coordinate],
    destination: Coordinate,
    profile: TravelProfile,
) -> Vec<CoordinatePair> {
    origins
        .iter()
        .enumerate()
        .map(|(i, &origin)| {
            let mut pair = CoordinatePair::new(PairId(i as u32), origin, destination, 1);
            pair.profile = Some(profile);
            pair.destination_fixed = true;
            pair
        })
        .collect()
}
