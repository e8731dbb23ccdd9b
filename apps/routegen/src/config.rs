//! JSON run configuration.
//!
//! One file drives every mode; each mode only requires the keys it uses
//! (see [`RunConfig::validate`]).  The effective configuration is written
//! next to each run's output as `last_checkpoint.json`, minus the API token.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rg_core::{Coordinate, TimeOfDay, TravelProfile, ZoneCode};
use rg_zones::{DestinationFix, FixAllocation, OdFilter, SourceCrs};

use crate::cli::Mode;

/// Environment variable consulted when `ors_token` is absent.
pub const TOKEN_ENV: &str = "ORS_API_KEY";

/// Daily request quota of the public OpenRouteService plan.
pub const MAX_DAILY_QUERIES: usize = 2_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'{field}' is required in {mode} mode")]
    Missing { field: &'static str, mode: &'static str },

    #[error("'{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output formats.  JSON is always written; the others are mirrors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Csv,
    Sqlite,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default, skip_serializing)]
    pub ors_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ors_base_url: Option<String>,

    #[serde(default)]
    pub od_data_path: Option<PathBuf>,
    #[serde(default)]
    pub zone_data_path: Option<PathBuf>,
    #[serde(default)]
    pub zone_crs: SourceCrs,
    #[serde(default)]
    pub save_directory: Option<PathBuf>,
    #[serde(default)]
    pub error_directory: Option<PathBuf>,

    /// `MMDD` of the OD file.
    #[serde(default)]
    pub date: Option<String>,
    /// `HH:MM`; ignored when `view_all_day`.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub view_all_day: bool,

    #[serde(default)]
    pub destination_zone: Option<ZoneCode>,
    #[serde(default)]
    pub destination_point: Option<Coordinate>,
    #[serde(default)]
    pub probability: f64,
    #[serde(default)]
    pub fix_allocation: FixAllocation,

    #[serde(default)]
    pub coordinates_path: Option<PathBuf>,
    #[serde(default)]
    pub routes_path: Option<PathBuf>,
    #[serde(default)]
    pub fixed_origins: Vec<Coordinate>,
    #[serde(default)]
    pub fixed_destination: Option<Coordinate>,

    #[serde(default)]
    pub profile: TravelProfile,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub max_queries: Option<usize>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_calls_per_minute")]
    pub calls_per_minute: u32,
    #[serde(default = "default_max_sampling_attempts")]
    pub max_sampling_attempts: u32,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_formats")]
    pub formats: Vec<Format>,

    /// Routes artifact whose geometry backs local endpoint snapping.
    #[serde(default)]
    pub snap_routes_path: Option<PathBuf>,
    #[serde(default = "default_snap_distance")]
    pub snap_max_distance_m: f64,
}

fn default_seed() -> u64 {
    42
}

fn default_workers() -> usize {
    1
}

fn default_calls_per_minute() -> u32 {
    40
}

fn default_max_sampling_attempts() -> u32 {
    rg_zones::sampler::DEFAULT_MAX_ATTEMPTS
}

fn default_tolerance() -> f64 {
    rg_congestion::DEFAULT_TOLERANCE
}

fn default_formats() -> Vec<Format> {
    vec![Format::Json, Format::Csv]
}

fn default_snap_distance() -> f64 {
    350.0
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Required keys per mode plus value checks.
    pub fn validate(&self, mode: Mode) -> Result<(), ConfigError> {
        let m = mode.as_str();
        let need = |present: bool, field: &'static str| {
            if present { Ok(()) } else { Err(ConfigError::Missing { field, mode: m }) }
        };

        need(self.save_directory.is_some(), "save_directory")?;
        match mode {
            Mode::Coordinates => {
                need(self.od_data_path.is_some(), "od_data_path")?;
                need(self.zone_data_path.is_some(), "zone_data_path")?;
                self.validate_label(m)?;
                if self.probability > 0.0 {
                    need(self.destination_point.is_some(), "destination_point")?;
                }
                if self.max_sampling_attempts == 0 {
                    return Err(invalid("max_sampling_attempts", "must be at least 1"));
                }
            }
            Mode::Routes => {
                need(self.coordinates_path.is_some(), "coordinates_path")?;
                need(self.error_directory.is_some(), "error_directory")?;
                self.validate_label(m)?;
                self.validate_routing(m)?;
            }
            Mode::FixedOrigins => {
                need(!self.fixed_origins.is_empty(), "fixed_origins")?;
                need(self.fixed_destination.is_some(), "fixed_destination")?;
                need(self.error_directory.is_some(), "error_directory")?;
                self.validate_routing(m)?;
            }
            Mode::Congestion => {
                need(self.routes_path.is_some(), "routes_path")?;
                if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
                    return Err(invalid("tolerance", "must be finite and positive"));
                }
            }
        }

        let configured = self.destination_point.iter().chain(&self.fixed_destination).chain(&self.fixed_origins);
        for c in configured {
            Coordinate::checked(c.lon, c.lat).map_err(|e| invalid("coordinates", e.to_string()))?;
        }

        if self.formats.contains(&Format::Sqlite) && !cfg!(feature = "sqlite") {
            return Err(invalid("formats", "built without the `sqlite` feature"));
        }
        Ok(())
    }

    /// Keys that name the labelled output directory.
    fn validate_label(&self, mode: &'static str) -> Result<(), ConfigError> {
        let date = self.date.as_deref().ok_or(ConfigError::Missing { field: "date", mode })?;
        if date.len() != 4 || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("date", format!("expected MMDD, got {date:?}")));
        }
        if !self.view_all_day {
            self.time_of_day()?.ok_or(ConfigError::Missing { field: "time", mode })?;
        }
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(invalid("probability", format!("{} is outside [0, 1]", self.probability)));
        }
        Ok(())
    }

    fn validate_routing(&self, mode: &'static str) -> Result<(), ConfigError> {
        self.api_key().ok_or(ConfigError::Missing { field: "ors_token", mode })?;
        if self.workers == 0 {
            return Err(invalid("workers", "must be at least 1"));
        }
        if self.calls_per_minute == 0 {
            return Err(invalid("calls_per_minute", "must be at least 1"));
        }
        if let Some(n) = self.max_queries {
            if n == 0 || n > MAX_DAILY_QUERIES {
                return Err(invalid("max_queries", format!("must be in 1..={MAX_DAILY_QUERIES}, got {n}")));
            }
        }
        Ok(())
    }

    /// `ors_token`, else the `ORS_API_KEY` environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.ors_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()))
    }

    /// Parsed `time`, `None` when viewing all day or unset.
    pub fn time_of_day(&self) -> Result<Option<TimeOfDay>, ConfigError> {
        if self.view_all_day {
            return Ok(None);
        }
        self.time
            .as_deref()
            .map(|t| t.parse::<TimeOfDay>().map_err(|e| invalid("time", e.to_string())))
            .transpose()
    }

    /// Output directory name: `{zone}_D{date}_T{HHMM|ALL}_P{probability}`.
    pub fn label(&self) -> Result<String, ConfigError> {
        let time = match self.time_of_day()? {
            Some(t) => t.compact(),
            None => "ALL".to_owned(),
        };
        let date = self.date.as_deref().unwrap_or("");
        let core = format!("D{date}_T{time}_P{:?}", self.probability);
        Ok(match self.destination_zone {
            Some(zone) => format!("{zone}_{core}"),
            None => core,
        })
    }

    /// The OD file: `od_data_path` itself, or `od_2023{date}_1.csv` inside
    /// it when it is a directory.
    pub fn od_file(&self) -> Option<PathBuf> {
        let base = self.od_data_path.as_ref()?;
        if base.is_dir() {
            let date = self.date.as_deref().unwrap_or("");
            Some(base.join(format!("od_2023{date}_1.csv")))
        } else {
            Some(base.clone())
        }
    }

    pub fn od_filter(&self) -> Result<OdFilter, ConfigError> {
        let mut filter = OdFilter::new();
        if let Some(t) = self.time_of_day()? {
            filter = filter.at(t);
        }
        if let Some(zone) = self.destination_zone {
            filter = filter.destination(zone);
        }
        Ok(filter)
    }

    pub fn destination_fix(&self) -> Option<DestinationFix> {
        let point = self.destination_point?;
        (self.probability > 0.0)
            .then(|| DestinationFix::new(point, self.probability).allocation(self.fix_allocation))
    }

    pub fn wants(&self, format: Format) -> bool {
        self.formats.contains(&format)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}
