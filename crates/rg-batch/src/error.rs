use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("batch configuration error: {0}")]
    Config(String),

    #[error("could not start worker pool: {0}")]
    WorkerPool(String),
}

pub type BatchResult<T> = Result<T, BatchError>;
