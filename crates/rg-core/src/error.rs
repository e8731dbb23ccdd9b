//! Workspace base error type.
//!
//! Sub-crates define their own error enums and either convert `CoreError`
//! into them via `From` or wrap it as one variant.

use thiserror::Error;

/// The error type for `rg-core` parsing and validation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid time of day {0:?}: expected HH:MM")]
    InvalidTime(String),

    #[error("unknown travel profile {0:?}")]
    UnknownProfile(String),

    #[error("invalid coordinate ({lon}, {lat})")]
    InvalidCoordinate { lon: f64, lat: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `rg-core`.
pub type CoreResult<T> = Result<T, CoreError>;
