//! Reprojection of zone boundaries into WGS-84.
//!
//! Korean administrative boundaries are distributed in EPSG:5179 (Korea 2000
//! unified CS, metres).  Sampling and routing work in longitude/latitude, so
//! boundaries are reprojected once at load time rather than per sample.

use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj, transform::transform};
use serde::{Deserialize, Serialize};

use crate::{ZoneError, ZoneResult};

const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";
const EPSG_5179: &str = "+proj=tmerc +lat_0=38 +lon_0=127.5 +k=0.9996 \
                         +x_0=1000000 +y_0=2000000 +ellps=GRS80 +units=m +no_defs +type=crs";

/// Coordinate reference system the zone reference file is stored in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCrs {
    /// Already longitude/latitude degrees; no reprojection.
    #[default]
    Wgs84,
    /// Korea 2000 / Unified CS.
    Epsg5179,
    /// Any projected CRS given as a PROJ.4 string.
    Proj4(String),
}

impl SourceCrs {
    fn proj_string(&self) -> Option<&str> {
        match self {
            SourceCrs::Wgs84 => None,
            SourceCrs::Epsg5179 => Some(EPSG_5179),
            SourceCrs::Proj4(s) => Some(s.as_str()),
        }
    }
}

/// Projected → geographic transform.  Built once per reference file.
pub(crate) struct Reprojector {
    from: Proj,
    to:   Proj,
}

impl Reprojector {
    /// `None` when `crs` is already WGS-84.
    pub(crate) fn for_crs(crs: &SourceCrs) -> ZoneResult<Option<Self>> {
        let Some(source) = crs.proj_string() else {
            return Ok(None);
        };
        let from = Proj::from_proj_string(source)
            .map_err(|e| ZoneError::Projection(format!("source CRS {source:?}: {e}")))?;
        let to = Proj::from_proj_string(WGS84)
            .map_err(|e| ZoneError::Projection(format!("WGS-84: {e}")))?;
        Ok(Some(Self { from, to }))
    }

    /// Projected metres in, degrees out.
    pub(crate) fn project_coord(&self, c: Coord<f64>) -> ZoneResult<Coord<f64>> {
        let mut point = (c.x, c.y, 0.0);
        transform(&self.from, &self.to, &mut point)
            .map_err(|e| ZoneError::Projection(format!("({}, {}): {e}", c.x, c.y)))?;
        Ok(Coord { x: point.0.to_degrees(), y: point.1.to_degrees() })
    }

    pub(crate) fn project(&self, shape: &MultiPolygon<f64>) -> ZoneResult<MultiPolygon<f64>> {
        shape.try_map_coords(|c| self.project_coord(c))
    }
}
