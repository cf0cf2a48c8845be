//! Error types for the persona analyzer

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the persona analyzer
#[derive(Error, Debug)]
pub enum Error {
    // Data-source errors
    #[error("Position source error: {0}")]
    PositionSource(String),

    #[error("Transfer source error: {0}")]
    TransferSource(String),

    #[error("Price source error: {0}")]
    PriceSource(String),

    // Input errors
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error can be absorbed by a fallback data path
    /// instead of failing the whole analysis
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::PositionSource(_) | Error::TransferSource(_) | Error::PriceSource(_)
        )
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
