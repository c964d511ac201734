//! Error types for short option EV evaluation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvError {
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Zero premium: risk/reward ratio is undefined")]
    ZeroPremium,

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type EvResult<T> = Result<T, EvError>;

impl EvError {
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    pub fn numerical(msg: impl Into<String>) -> Self {
        Self::Numerical(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Name of the offending field, when the error is field-specific
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidField { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Require a finite, strictly positive value
pub(crate) fn require_positive(field: &'static str, value: f64) -> EvResult<f64> {
    if !value.is_finite() {
        return Err(EvError::invalid_field(field, format!("must be a number, got {}", value)));
    }
    if value <= 0.0 {
        return Err(EvError::invalid_field(field, format!("must be greater than 0, got {}", value)));
    }
    Ok(value)
}

/// Require a finite value of any sign
pub(crate) fn require_finite(field: &'static str, value: f64) -> EvResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvError::invalid_field(field, format!("must be a number, got {}", value)))
    }
}
