//! `rg-batch`: routes many coordinate pairs and collects the outcome.
//!
//! # Batch loop
//!
//! ```text
//! for pair in pairs:                       (parallel with the `parallel` feature)
//!   ① Cancelled? : skip, count in `skipped`
//!   ② Request    : RouteRequester::request(pair, pair.profile ?? default)
//!   ③ Record     : Route → routes, RouteError → errors (mutex-guarded)
//!   ④ Fatal?     : unauthorized cancels every pair not yet dispatched
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | Runs pairs on a Rayon pool of `workers` threads.          |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use rg_batch::{BatchBuilder, NoopObserver};
//!
//! let batch = BatchBuilder::new(provider).workers(4).build()?;
//! let report = batch.run(&pairs, &mut NoopObserver)?;
//! ```

pub mod batch;
pub mod builder;
pub mod cancel;
pub mod error;
pub mod observer;

#[cfg(test)]
mod tests;

pub use batch::{BatchReport, RouteBatch};
pub use builder::BatchBuilder;
pub use cancel::CancelToken;
pub use error::{BatchError, BatchResult};
pub use observer::{BatchObserver, NoopObserver, ProgressLogger};
