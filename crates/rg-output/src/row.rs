//! Flat row types for the tabular backends.

use serde::Serialize;

use rg_congestion::CongestionResult;
use rg_core::CoordinatePair;
use rg_routing::RouteError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateRow {
    pub pair_id: u32,
    pub origin_lon: f64,
    pub origin_lat: f64,
    pub destination_lon: f64,
    pub destination_lat: f64,
    pub trip_count: u32,
    pub origin_zone: Option<u64>,
    pub destination_zone: Option<u64>,
    pub destination_fixed: bool,
    pub profile: Option<&'static str>,
}

impl From<&CoordinatePair> for CoordinateRow {
    fn from(p: &CoordinatePair) -> Self {
        Self {
            pair_id: p.id.0,
            origin_lon: p.origin.lon,
            origin_lat: p.origin.lat,
            destination_lon: p.destination.lon,
            destination_lat: p.destination.lat,
            trip_count: p.trip_count,
            origin_zone: p.origin_zone.map(|z| z.0),
            destination_zone: p.destination_zone.map(|z| z.0),
            destination_fixed: p.destination_fixed,
            profile: p.profile.map(|pr| pr.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRow {
    pub pair_id: u32,
    pub origin_lon: f64,
    pub origin_lat: f64,
    pub destination_lon: f64,
    pub destination_lat: f64,
    pub trip_count: u32,
    pub profile: &'static str,
    pub reason: &'static str,
    pub attempts: u32,
    pub message: String,
}

impl From<&RouteError> for ErrorRow {
    fn from(e: &RouteError) -> Self {
        Self {
            pair_id: e.pair_id.0,
            origin_lon: e.origin.lon,
            origin_lat: e.origin.lat,
            destination_lon: e.destination.lon,
            destination_lat: e.destination.lat,
            trip_count: e.trip_count,
            profile: e.profile.as_str(),
            reason: e.reason.as_str(),
            attempts: e.attempts,
            message: e.message.clone(),
        }
    }
}

/// One ranked congestion row; `rank` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CongestionRow {
    pub rank: u64,
    pub segment_id: u32,
    pub a_lon: f64,
    pub a_lat: f64,
    pub b_lon: f64,
    pub b_lat: f64,
    pub crossing_count: u64,
    pub overlapping_segments: u32,
    pub trip_mass: u64,
    pub overlap_trips: u64,
    pub crossing_volume: u64,
    pub occurrences: u32,
    pub routes: u32,
}

impl CongestionRow {
    pub fn new(rank: u64, r: &CongestionResult) -> Self {
        Self {
            rank,
            segment_id: r.segment.0,
            a_lon: r.a.lon,
            a_lat: r.a.lat,
            b_lon: r.b.lon,
            b_lat: r.b.lat,
            crossing_count: r.crossing_count,
            overlapping_segments: r.overlapping_segments,
            trip_mass: r.trip_mass,
            overlap_trips: r.overlap_trips,
            crossing_volume: r.crossing_volume,
            occurrences: r.occurrences,
            routes: r.routes,
        }
    }
}
