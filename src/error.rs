use thiserror::Error;

#[derive(Error, Debug)]
pub enum PositionError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PositionError {
    pub fn config(msg: impl Into<String>) -> Self {
        PositionError::ConfigError(msg.into())
    }

    pub fn mismatch(msg: impl Into<String>) -> Self {
        PositionError::DimensionMismatch(msg.into())
    }

    pub fn serialization<E: std::fmt::Display>(error: E) -> Self {
        PositionError::Serialization(error.to_string())
    }
}
