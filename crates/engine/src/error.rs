//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidAmount`] thrown when an amount is non-positive or not a number.
//! - [`RateUnavailable`] thrown when no usable exchange rate is available.
//! - [`RecordNotFound`] thrown when an id lookup misses.
//! - [`NoDataForPeriod`] thrown when a period has nothing to report.
//! - [`ProviderFailure`] thrown when an external provider fails.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`RateUnavailable`]: EngineError::RateUnavailable
//!  [`RecordNotFound`]: EngineError::RecordNotFound
//!  [`NoDataForPeriod`]: EngineError::NoDataForPeriod
//!  [`ProviderFailure`]: EngineError::ProviderFailure
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Exchange rate unavailable")]
    RateUnavailable,
    #[error("\"{0}\" not found!")]
    RecordNotFound(String),
    #[error("No data for period {0}")]
    NoDataForPeriod(String),
    #[error("Provider failure: {0}")]
    ProviderFailure(String),
    #[error(transparent)]
    Storage(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Export failed: {0}")]
    Export(String),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::RateUnavailable, Self::RateUnavailable) => true,
            (Self::RecordNotFound(a), Self::RecordNotFound(b)) => a == b,
            (Self::NoDataForPeriod(a), Self::NoDataForPeriod(b)) => a == b,
            (Self::ProviderFailure(a), Self::ProviderFailure(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a.kind() == b.kind(),
            (Self::Serialization(a), Self::Serialization(b)) => a.to_string() == b.to_string(),
            (Self::Export(a), Self::Export(b)) => a == b,
            _ => false,
        }
    }
}

/// Errors returned by the external collaborators (rate lookup, text generation).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("no usable value returned")]
    Unavailable,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider disabled")]
    Disabled,
}
