//! Routing results: successful [`Route`]s and structured [`RouteError`]s.
//!
//! Both are persisted as artifacts, so both serialize with serde and both
//! carry the `PairId` of the coordinate pair that produced them.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rg_core::{Coordinate, CoordinatePair, PairId, TravelProfile};

use crate::ProviderError;

// ── SnapKind ──────────────────────────────────────────────────────────────────

/// Which endpoints were moved onto the road network before routing.
/// Variants are listed in the order the requester tries them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapKind {
    /// Exact coordinates.
    #[default]
    None,
    Origin,
    Destination,
    Both,
}

impl SnapKind {
    /// Snapping strategies in retry order.
    pub const STRATEGIES: [SnapKind; 3] = [SnapKind::Origin, SnapKind::Destination, SnapKind::Both];

    pub fn moves_origin(self) -> bool {
        matches!(self, SnapKind::Origin | SnapKind::Both)
    }

    pub fn moves_destination(self) -> bool {
        matches!(self, SnapKind::Destination | SnapKind::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SnapKind::None => "none",
            SnapKind::Origin => "origin",
            SnapKind::Destination => "destination",
            SnapKind::Both => "both",
        }
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// A routed polyline for one coordinate pair.  Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub pair_id: PairId,
    /// Endpoints of the originating pair, before any snapping.
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// Vertices exactly as reported by the provider; at least two.
    pub points: Vec<Coordinate>,
    pub trip_count: u32,
    pub profile: TravelProfile,
    #[serde(default)]
    pub snapped: SnapKind,
    /// Provider calls spent on this pair, snapping included.
    #[serde(default)]
    pub attempts: u32,
}

impl Route {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Sum of haversine lengths of consecutive vertices, in metres.
    pub fn length_m(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance_m(w[1])).sum()
    }
}

// ── FailureReason ─────────────────────────────────────────────────────────────

/// Why a pair produced no route.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    Network,
    NoPathFound,
    SnappingExhausted,
    RateLimited,
    InvalidInput,
    MalformedResponse,
    Unauthorized,
}

impl FailureReason {
    /// Credential failures affect every later request too; the batch stops.
    pub fn is_fatal(self) -> bool {
        matches!(self, FailureReason::Unauthorized)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::Network => "network",
            FailureReason::NoPathFound => "no-path-found",
            FailureReason::SnappingExhausted => "snapping-exhausted",
            FailureReason::RateLimited => "rate-limited",
            FailureReason::InvalidInput => "invalid-input",
            FailureReason::MalformedResponse => "malformed-response",
            FailureReason::Unauthorized => "unauthorized",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&ProviderError> for FailureReason {
    fn from(e: &ProviderError) -> Self {
        match e {
            ProviderError::NoRoute(_) => FailureReason::NoPathFound,
            ProviderError::RateLimited { .. } => FailureReason::RateLimited,
            ProviderError::InvalidInput(_) => FailureReason::InvalidInput,
            ProviderError::Unauthorized(_) => FailureReason::Unauthorized,
            ProviderError::Network(_) => FailureReason::Network,
            ProviderError::Malformed(_) => FailureReason::MalformedResponse,
        }
    }
}

// ── RouteError ────────────────────────────────────────────────────────────────

/// One entry of the append-only error log.
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
#[error("{pair_id}: {reason} after {attempts} call(s): {message}")]
pub struct RouteError {
    pub pair_id: PairId,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub trip_count: u32,
    pub profile: TravelProfile,
    pub reason: FailureReason,
    pub message: String,
    pub attempts: u32,
}

impl RouteError {
    pub fn new(
        pair: &CoordinatePair,
        profile: TravelProfile,
        reason: FailureReason,
        message: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            pair_id: pair.id,
            origin: pair.origin,
            destination: pair.destination,
            trip_count: pair.trip_count,
            profile,
            reason,
            message: message.into(),
            attempts,
        }
    }

    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.reason.is_fatal()
    }
}
