//! The routing-provider boundary.
//!
//! # Pluggability
//!
//! The requester talks to routing services only through [`RouteProvider`],
//! so the OpenRouteService client, a self-hosted engine, or a scripted test
//! double are interchangeable.  Providers are stateless from the
//! requester's point of view: retries, snapping, and rate limiting all live
//! in [`RouteRequester`][crate::RouteRequester].

use rg_core::{Coordinate, TravelProfile};

use crate::ProviderResult;

/// An external routing service.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`; the batch orchestrator shares one
/// provider across all worker threads.
pub trait RouteProvider: Send + Sync {
    /// Route `origin → destination` under `profile`, returning the polyline
    /// vertices exactly as reported by the service.
    fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        profile: TravelProfile,
    ) -> ProviderResult<Vec<Coordinate>>;

    /// Project `point` onto the service's road network.
    ///
    /// `Ok(None)` means the service found no road nearby or cannot snap at
    /// all; the requester then falls back to its local snap index.
    fn snap(&self, _point: Coordinate, _profile: TravelProfile) -> ProviderResult<Option<Coordinate>> {
        Ok(None)
    }

    /// Short label for log lines.
    fn name(&self) -> &str {
        "provider"
    }
}

impl<P: RouteProvider + ?Sized> RouteProvider for &P {
    fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        profile: TravelProfile,
    ) -> ProviderResult<Vec<Coordinate>> {
        (**self).directions(origin, destination, profile)
    }

    fn snap(&self, point: Coordinate, profile: TravelProfile) -> ProviderResult<Option<Coordinate>> {
        (**self).snap(point, profile)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
