//! `rg-routing`: turning coordinate pairs into routed polylines.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                    |
//! |---------------|-------------------------------------------------------------|
//! | [`provider`]  | `RouteProvider` trait                                       |
//! | [`ors`]       | OpenRouteService response handling, `OrsClient` (feature `ors`) |
//! | [`limiter`]   | `RateLimit`, `RateLimiter` (shared token bucket)            |
//! | [`snap`]      | `RoadSnapIndex` (R-tree nearest-road fallback)              |
//! | [`requester`] | `RouteRequester`, `RetryPolicy`                             |
//! | [`route`]     | `Route`, `RouteError`, `FailureReason`, `SnapKind`          |
//! | [`error`]     | `ProviderError`, `ProviderResult<T>`                        |
//!
//! # Feature flags
//!
//! | Flag  | Effect                                                          |
//! |-------|-----------------------------------------------------------------|
//! | `ors` | Builds the blocking HTTP client via `reqwest`.                  |

pub mod error;
pub mod limiter;
pub mod ors;
pub mod provider;
pub mod requester;
pub mod route;
pub mod snap;

#[cfg(test)]
mod tests;

pub use error::{ProviderError, ProviderResult};
pub use limiter::{RateLimit, RateLimiter};
pub use ors::OrsConfig;
#[cfg(feature = "ors")]
pub use ors::OrsClient;
pub use provider::RouteProvider;
pub use requester::{RetryPolicy, RouteRequester};
pub use route::{FailureReason, Route, RouteError, SnapKind};
pub use snap::RoadSnapIndex;
