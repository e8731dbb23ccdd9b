//! `rg-congestion`: segment-level congestion ranking over routed trips.
//!
//! # Pipeline
//!
//! ```text
//! Route ──decompose──▶ Segment* ──dedup──▶ UniqueSegment* ──index──▶ SegmentIndex
//!                                                   │                    │
//!                                                   └──── overlap rule ◀─┘
//!                                                             │
//!                                                   CongestionResult* (ranked)
//! ```
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | `segment`   | [`Segment`], [`decompose`], [`decompose_all`]         |
//! | `dedup`     | ε-grid keys, [`UniqueSegment`], [`dedup()`]           |
//! | `index`     | [`SegmentIndex`] (R-tree over inflated envelopes)     |
//! | `overlap`   | line-overlap test on top of `geo` line intersection   |
//! | `aggregate` | [`CongestionAggregator`], [`CongestionResult`]        |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                              |
//! |------------|-----------------------------------------------------|
//! | `parallel` | Runs the per-segment overlap queries on Rayon.      |

pub mod aggregate;
pub mod dedup;
pub mod error;
pub mod index;
pub mod overlap;
pub mod segment;

#[cfg(test)]
mod tests;

pub use aggregate::{CongestionAggregator, CongestionResult, DEFAULT_TOLERANCE};
pub use dedup::{Dedup, SegmentKey, UniqueSegment, dedup};
pub use error::{ValidationError, ValidationResult};
pub use index::SegmentIndex;
pub use segment::{Segment, decompose, decompose_all};
