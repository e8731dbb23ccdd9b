use thiserror::Error;

use rg_core::PairId;

/// Input that cannot enter congestion analysis.  Fatal to the analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("route {pair_id} has {vertices} vertex(es); at least 2 required")]
    TooFewVertices { pair_id: PairId, vertices: usize },

    #[error("route {pair_id} vertex {index} is not finite")]
    NonFiniteVertex { pair_id: PairId, index: usize },

    #[error("{0} segments exceed the u32 id space")]
    TooManySegments(usize),

    #[error("tolerance must be finite and positive, got {0}")]
    InvalidTolerance(f64),
}

pub type ValidationResult<T> = Result<T, ValidationError>;
