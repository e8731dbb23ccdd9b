//! Travel profile enum shared by the sampler, the router and the artifacts.
//!
//! Variant names follow the OpenRouteService profile identifiers, which are
//! also the serialized form.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// The means by which a simulated trip travels.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TravelProfile {
    #[default]
    DrivingCar,
    DrivingHgv,
    CyclingRegular,
    CyclingRoad,
    CyclingMountain,
    CyclingElectric,
    FootWalking,
    FootHiking,
    Wheelchair,
}

impl TravelProfile {
    pub const ALL: [TravelProfile; 9] = [
        TravelProfile::DrivingCar,
        TravelProfile::DrivingHgv,
        TravelProfile::CyclingRegular,
        TravelProfile::CyclingRoad,
        TravelProfile::CyclingMountain,
        TravelProfile::CyclingElectric,
        TravelProfile::FootWalking,
        TravelProfile::FootHiking,
        TravelProfile::Wheelchair,
    ];

    /// Provider identifier, also used in URLs and CSV columns.
    pub fn as_str(self) -> &'static str {
        match self {
            TravelProfile::DrivingCar      => "driving-car",
            TravelProfile::DrivingHgv      => "driving-hgv",
            TravelProfile::CyclingRegular  => "cycling-regular",
            TravelProfile::CyclingRoad     => "cycling-road",
            TravelProfile::CyclingMountain => "cycling-mountain",
            TravelProfile::CyclingElectric => "cycling-electric",
            TravelProfile::FootWalking     => "foot-walking",
            TravelProfile::FootHiking      => "foot-hiking",
            TravelProfile::Wheelchair      => "wheelchair",
        }
    }

    /// Map a travel-mode code from the OD source data to a profile.
    ///
    /// | Code       | Profile           |
    /// |------------|-------------------|
    /// | 0, 2, 5, 7 | `driving-car`     |
    /// | 1, 6       | `driving-hgv`     |
    /// | 3          | `foot-walking`    |
    /// | 4          | `cycling-regular` |
    pub fn from_modal_code(code: u8) -> Option<TravelProfile> {
        match code {
            0 | 2 | 5 | 7 => Some(TravelProfile::DrivingCar),
            1 | 6         => Some(TravelProfile::DrivingHgv),
            3             => Some(TravelProfile::FootWalking),
            4             => Some(TravelProfile::CyclingRegular),
            _             => None,
        }
    }
}

impl FromStr for TravelProfile {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        TravelProfile::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoreError::UnknownProfile(s.to_owned()))
    }
}

impl std::fmt::Display for TravelProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
