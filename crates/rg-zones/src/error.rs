use thiserror::Error;

use rg_core::{CoreError, ZoneCode};

/// Structural errors: unreadable inputs and malformed reference data.
/// Fatal to the whole run.
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("OD parse error: {0}")]
    Parse(String),

    #[error("zone {code}: malformed boundary ({reason})")]
    MalformedZone { code: ZoneCode, reason: String },

    #[error("duplicate zone code {0}")]
    DuplicateZone(ZoneCode),

    #[error("projection error: {0}")]
    Projection(String),

    #[error("zone reference JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ZoneResult<T> = Result<T, ZoneError>;

/// Per-record sampling failure.  Logged and skipped; never aborts a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplingError {
    #[error("zone {0} not present in reference data")]
    UnknownZone(ZoneCode),

    #[error("zone {zone}: no interior point after {attempts} attempts")]
    Exhausted { zone: ZoneCode, attempts: u32 },

    #[error("zone {0} has zero area")]
    EmptyZone(ZoneCode),
}
