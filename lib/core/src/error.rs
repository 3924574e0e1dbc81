use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index has not been built")]
    IndexNotBuilt,

    #[error("Index is already built; retrain into a fresh index instead")]
    IndexAlreadyBuilt,

    #[error("Engine is not trained")]
    NotTrained,

    #[error("Cannot train on an empty catalog")]
    EmptyCatalog,

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Embedding provider error: {0}")]
    Embedding(String),

    #[error("Embedding call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Corrupt state: {0}")]
    CorruptState(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
