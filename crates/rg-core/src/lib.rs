//! `rg-core`: foundational types for the `routegen` workspace.
//!
//! This crate is a dependency of every other `rg-*` crate.  It has no `rg-*`
//! dependencies and few external ones (`rand`, `thiserror`, `serde`, and
//! `geo-types` for conversions into the `geo` ecosystem).
//!
//! # What lives here
//!
//! | Module        | Contents                                                |
//! |---------------|---------------------------------------------------------|
//! | [`ids`]       | `RecordId`, `PairId`, `SegmentId`, `ZoneCode`           |
//! | [`geo`]       | `Coordinate`, haversine distance, tolerance comparison  |
//! | [`pair`]      | `CoordinatePair`: one trip to be routed                |
//! | [`profile`]   | `TravelProfile` enum (routing provider profiles)        |
//! | [`time`]      | `TimeOfDay`, `TimeWindow`                               |
//! | [`rng`]       | `RunRng` (seeded, injectable random source)             |
//! | [`error`]     | `CoreError`, `CoreResult`                               |

pub mod error;
pub mod geo;
pub mod ids;
pub mod pair;
pub mod profile;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::Coordinate;
pub use ids::{PairId, RecordId, SegmentId, ZoneCode};
pub use pair::CoordinatePair;
pub use profile::TravelProfile;
pub use rng::RunRng;
pub use time::{TimeOfDay, TimeWindow};
