//! Configuration for option evaluation

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{EvError, EvResult};
use crate::models::{IntegrationSettings, PayoutModel, CALENDAR_DAYS_PER_YEAR, TRADING_DAYS_PER_YEAR};

/// Configuration for batch and single-option evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Which payout estimator feeds the EV
    /// Default: numerical integration
    pub payout_model: PayoutModel,

    /// Integration grid (numerical integration only)
    pub integration: IntegrationSettings,

    /// Add `theta · days / calendar_days_per_year` to the EV
    /// Default: false
    pub apply_time_decay: bool,

    /// Day count for annualizing time to expiry
    /// Default: 252
    pub trading_days_per_year: f64,

    /// Day count for theta decay
    /// Default: 365
    pub calendar_days_per_year: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self::batch()
    }
}

impl EvaluationConfig {
    /// Authoritative batch settings: numerical integration, no time decay
    pub fn batch() -> Self {
        Self {
            payout_model: PayoutModel::NumericalIntegration,
            integration: IntegrationSettings::default(),
            apply_time_decay: false,
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
            calendar_days_per_year: CALENDAR_DAYS_PER_YEAR,
        }
    }

    /// Single-option calculator settings: closed-form heuristic payout
    pub fn calculator() -> Self {
        Self {
            payout_model: PayoutModel::ClosedFormHeuristic,
            ..Self::batch()
        }
    }

    /// Batch settings with theta decay folded into the EV
    pub fn with_time_decay() -> Self {
        Self {
            apply_time_decay: true,
            ..Self::batch()
        }
    }

    pub fn validate(&self) -> EvResult<()> {
        if self.integration.steps == 0 {
            return Err(EvError::invalid_field("integration.steps", "must be at least 1"));
        }
        if self.integration.sigma_span <= 0.0 || !self.integration.sigma_span.is_finite() {
            return Err(EvError::invalid_field(
                "integration.sigma_span",
                format!("must be greater than 0, got {}", self.integration.sigma_span),
            ));
        }
        if self.trading_days_per_year <= 0.0 || self.trading_days_per_year.is_nan() {
            return Err(EvError::invalid_field(
                "trading_days_per_year",
                format!("must be greater than 0, got {}", self.trading_days_per_year),
            ));
        }
        if self.calendar_days_per_year <= 0.0 || self.calendar_days_per_year.is_nan() {
            return Err(EvError::invalid_field(
                "calendar_days_per_year",
                format!("must be greater than 0, got {}", self.calendar_days_per_year),
            ));
        }
        Ok(())
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> EvResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json).map_err(|e| EvError::Serialization(e.to_string()))?;
        config.validate()?;

        tracing::info!(
            model = config.payout_model.label(),
            time_decay = config.apply_time_decay,
            "Loaded evaluation config from {:?}",
            path.as_ref()
        );
        Ok(config)
    }
}
