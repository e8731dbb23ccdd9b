//! `rg-zones`: OD records, zone polygons, and coordinate sampling.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`od`]         | `OdRecord`, `load_od_csv`, `load_od_reader`               |
//! | [`filter`]     | `OdFilter` (time of day, origin/destination zone)         |
//! | [`zone`]       | `ZonePolygon`, `ZoneSet`, `load_zones_json`               |
//! | [`projection`] | `SourceCrs`, reprojection of zone boundaries to WGS-84    |
//! | [`sampler`]    | `ZoneCoordinateSampler`, `DestinationFix`, `SampleOutcome` |
//! | [`fixed`]      | `pairs_from_fixed_origins`                                |
//! | [`error`]      | `ZoneError`, `SamplingError`                              |
//!
//! # Sampling model (summary)
//!
//! ```text
//! for record in filter(records):
//!     origin      = uniform interior point of zone(record.origin)
//!     destination = fixed facility point        with probability p
//!                 | uniform interior point of zone(record.destination)
//!     emit CoordinatePair { origin, destination, record.trip_count }
//! ```
//!
//! Interior points come from bounded rejection sampling inside the zone's
//! bounding box.  Per-record failures are collected, never fatal.

pub mod error;
pub mod filter;
pub mod fixed;
pub mod od;
pub mod projection;
pub mod sampler;
pub mod zone;


pub use error::{SamplingError, ZoneError, ZoneResult};
pub use filter::OdFilter;
pub use fixed::pairs_from_fixed_origins;
pub use od::{OdRecord, load_od_csv, load_od_reader};
pub use projection::SourceCrs;
pub use sampler::{
    DestinationFix, FixAllocation, SampleOutcome, SamplingFailure, ZoneCoordinateSampler,
};
pub use zone::{ZonePolygon, ZoneSet, load_zones_json, load_zones_reader};
