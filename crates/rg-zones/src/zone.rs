//! Zone reference data: administrative boundaries keyed by zone code.
//!
//! # JSON format
//!
//! ```json
//! [
//!   { "code": 1101053, "api_code": 11010530, "boundary": [[126.97, 37.57], [126.98, 37.57], [126.98, 37.58]] },
//!   { "code": 1101054, "boundary": [[[126.0, 37.0], [126.1, 37.0], [126.1, 37.1]],
//!                                   [[126.2, 37.0], [126.3, 37.0], [126.3, 37.1]]] }
//! ]
//! ```
//!
//! `boundary` is either one ring (a polygon) or a list of rings (a
//! multi-polygon of disjoint parts).  Rings need not repeat their first
//! vertex.  Coordinates are in the file's CRS and are reprojected to WGS-84
//! on load.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use geo::{Area, BoundingRect, Contains, LineString, MultiPolygon, Point, Polygon, Rect};
use serde::Deserialize;

use rg_core::{Coordinate, ZoneCode};

use crate::projection::Reprojector;
use crate::{SourceCrs, ZoneError, ZoneResult};

// ── ZonePolygon ───────────────────────────────────────────────────────────────

/// An administrative zone boundary in WGS-84 degrees.  Immutable after load.
#[derive(Clone, Debug, PartialEq)]
pub struct ZonePolygon {
    code: ZoneCode,
    api_code: Option<ZoneCode>,
    shape: MultiPolygon<f64>,
    bbox: Option<Rect<f64>>,
}

impl ZonePolygon {
    /// Build a zone from `[lon, lat]` rings.  Each ring becomes one part.
    pub fn from_rings(code: ZoneCode, rings: Vec<Vec<[f64; 2]>>) -> ZoneResult<Self> {
        Self::from_shape(code, shape_from_rings(code, rings)?)
    }

    /// Build a zone from an existing geometry.  Every part needs at least
    /// three vertices and finite coordinates.
    pub fn from_shape(code: ZoneCode, shape: MultiPolygon<f64>) -> ZoneResult<Self> {
        if shape.0.is_empty() {
            return Err(malformed(code, "no boundary rings"));
        }
        for part in &shape.0 {
            // Closed rings repeat the first vertex.
            if part.exterior().0.len() < 4 {
                return Err(malformed(code, "ring has fewer than 3 vertices"));
            }
            if part.exterior().0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
                return Err(malformed(code, "non-finite vertex"));
            }
        }
        let bbox = shape.bounding_rect();
        Ok(Self { code, api_code: None, shape, bbox })
    }

    pub fn with_api_code(mut self, api_code: ZoneCode) -> Self {
        self.api_code = Some(api_code);
        self
    }

    #[inline]
    pub fn code(&self) -> ZoneCode {
        self.code
    }

    /// Secondary code used by the external boundary service, if any.
    #[inline]
    pub fn api_code(&self) -> Option<ZoneCode> {
        self.api_code
    }

    #[inline]
    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    #[inline]
    pub fn bbox(&self) -> Option<Rect<f64>> {
        self.bbox
    }

    /// Unsigned planar area in square degrees.
    pub fn area(&self) -> f64 {
        self.shape.unsigned_area()
    }

    /// Strict interior test; points on the boundary are not contained.
    pub fn contains(&self, c: Coordinate) -> bool {
        self.shape.contains(&Point::new(c.lon, c.lat))
    }
}

fn malformed(code: ZoneCode, reason: &str) -> ZoneError {
    ZoneError::MalformedZone { code, reason: reason.to_owned() }
}

fn shape_from_rings(code: ZoneCode, rings: Vec<Vec<[f64; 2]>>) -> ZoneResult<MultiPolygon<f64>> {
    let mut parts = Vec::with_capacity(rings.len());
    for ring in rings {
        if ring.len() < 3 {
            return Err(malformed(code, "ring has fewer than 3 vertices"));
        }
        // Polygon::new closes the ring if needed.
        let exterior: LineString<f64> = ring.into_iter().map(|[x, y]| (x, y)).collect();
        parts.push(Polygon::new(exterior, vec![]));
    }
    Ok(MultiPolygon::new(parts))
}

// ── ZoneSet ───────────────────────────────────────────────────────────────────

/// All zones of one reference file, looked up by primary code or `api_code`.
#[derive(Clone, Debug, Default)]
pub struct ZoneSet {
    zones: HashMap<ZoneCode, ZonePolygon>,
    aliases: HashMap<ZoneCode, ZoneCode>,
}

impl ZoneSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone.  Duplicate primary codes are a structural error.
    pub fn insert(&mut self, zone: ZonePolygon) -> ZoneResult<()> {
        let code = zone.code();
        if self.zones.contains_key(&code) {
            return Err(ZoneError::DuplicateZone(code));
        }
        if let Some(alias) = zone.api_code() {
            self.aliases.insert(alias, code);
        }
        self.zones.insert(code, zone);
        Ok(())
    }

    /// Look up by primary code, falling back to the secondary code.
    pub fn get(&self, code: ZoneCode) -> Option<&ZonePolygon> {
        self.zones
            .get(&code)
            .or_else(|| self.aliases.get(&code).and_then(|primary| self.zones.get(primary)))
    }

    /// Primary code of the zone known as `code`, which may be an `api_code`.
    pub fn primary_code(&self, code: ZoneCode) -> Option<ZoneCode> {
        self.get(code).map(ZonePolygon::code)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZonePolygon> {
        self.zones.values()
    }
}

// ── JSON loading ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum BoundaryJson {
    Ring(Vec<[f64; 2]>),
    Rings(Vec<Vec<[f64; 2]>>),
}

#[derive(Deserialize)]
struct ZoneJson {
    code: ZoneCode,
    #[serde(default)]
    api_code: Option<ZoneCode>,
    boundary: BoundaryJson,
}

/// Load zone reference data from a JSON file stored in `crs`.
pub fn load_zones_json(path: &Path, crs: &SourceCrs) -> ZoneResult<ZoneSet> {
    let file = std::fs::File::open(path)?;
    load_zones_reader(std::io::BufReader::new(file), crs)
}

/// Like [`load_zones_json`] but accepts any `Read` source.
pub fn load_zones_reader<R: Read>(reader: R, crs: &SourceCrs) -> ZoneResult<ZoneSet> {
    let rows: Vec<ZoneJson> = serde_json::from_reader(reader)?;
    let reprojector = Reprojector::for_crs(crs)?;

    let mut set = ZoneSet::new();
    for row in rows {
        let rings = match row.boundary {
            BoundaryJson::Ring(ring) => vec![ring],
            BoundaryJson::Rings(rings) => rings,
        };
        let mut shape = shape_from_rings(row.code, rings)?;
        if let Some(r) = &reprojector {
            shape = r.project(&shape)?;
        }
        let mut zone = ZonePolygon::from_shape(row.code, shape)?;
        if let Some(api) = row.api_code {
            zone = zone.with_api_code(api);
        }
        set.insert(zone)?;
    }

    log::info!("loaded {} zones ({:?})", set.len(), crs);
    Ok(set)
}
