//! Single-option calculator
//!
//! Strict counterpart of the batch path: every field is checked up front and
//! the first bad one is reported by name. Nothing is defaulted.

use serde::{Deserialize, Serialize};

use crate::core::error::{require_finite, require_positive};
use crate::core::{EvError, EvResult, Greeks, OptionType};
use crate::models::{estimated_profit_probability, ExerciseBreakdown};

use super::evaluator::{normalized_implied_vol, price_inputs, PricingInputs};
use super::{EvaluationConfig, EvaluationResult, EvaluationTrace, RiskGuidance};

/// Longest expiry the calculator accepts
pub const MAX_DAYS_TO_EXPIRY: i64 = 365;

/// Raw calculator form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorInput {
    pub option_type: OptionType,
    pub underlying_price: f64,
    pub strike: f64,
    pub premium: f64,
    pub days_to_expiry: i64,
    /// Fraction (0.8) or percentage (80.0), see [`crate::models::normalize_implied_vol`]
    pub implied_volatility: f64,
    pub greeks: Greeks,
    /// Explicit exercise probability in percent; skips the delta blend
    #[serde(default)]
    pub exercise_probability: Option<f64>,
    /// Quoted probability of profit in percent; estimated from delta when absent
    #[serde(default)]
    pub profit_probability: Option<f64>,
}

/// Calculator output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calculation {
    pub result: EvaluationResult,
    pub trace: EvaluationTrace,
    pub risk: RiskGuidance,
}

/// Evaluates one option entered by hand
pub struct OptionCalculator {
    config: EvaluationConfig,
}

impl OptionCalculator {
    /// Create with the calculator preset (closed-form heuristic payout)
    pub fn new() -> Self {
        Self {
            config: EvaluationConfig::calculator(),
        }
    }

    pub fn with_config(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn calculate(&self, input: &CalculatorInput) -> EvResult<Calculation> {
        self.config.validate()?;
        let inputs = validate_input(input)?;
        let exercise = exercise_for(input)?;

        let (result, trace) = price_inputs(0, &inputs, exercise, &self.config)?.into_traced();
        let risk = RiskGuidance::new(
            inputs.option_type,
            inputs.underlying,
            inputs.implied_vol,
            trace.annualized_time,
            result.risk_reward_ratio,
        );

        tracing::debug!(
            option_type = %input.option_type,
            strike = input.strike,
            expected_value = result.expected_value,
            model = result.payout_model.label(),
            "calculated single option"
        );

        Ok(Calculation { result, trace, risk })
    }
}

impl Default for OptionCalculator {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_input(input: &CalculatorInput) -> EvResult<PricingInputs> {
    let underlying = require_positive("underlying price", input.underlying_price)?;
    let strike = require_positive("strike", input.strike)?;
    let premium = require_positive("premium", input.premium)?;
    if input.days_to_expiry <= 0 || input.days_to_expiry > MAX_DAYS_TO_EXPIRY {
        return Err(EvError::invalid_field(
            "days to expiry",
            format!("must be between 1 and {}, got {}", MAX_DAYS_TO_EXPIRY, input.days_to_expiry),
        ));
    }
    require_positive("implied volatility", input.implied_volatility)?;
    require_positive("gamma", input.greeks.gamma)?;
    require_positive("vega", input.greeks.vega)?;
    require_finite("delta", input.greeks.delta)?;
    require_finite("theta", input.greeks.theta)?;
    let implied_vol = normalized_implied_vol(input.implied_volatility)?;

    Ok(PricingInputs {
        option_type: input.option_type,
        strike,
        premium,
        underlying,
        days_to_expiry: input.days_to_expiry as u32,
        implied_vol,
        greeks: input.greeks,
    })
}

fn exercise_for(input: &CalculatorInput) -> EvResult<ExerciseBreakdown> {
    let delta = input.greeks.delta;

    if let Some(percent) = input.exercise_probability {
        require_finite("exercise probability", percent)?;
        if !(0.0..=100.0).contains(&percent) {
            return Err(EvError::invalid_field(
                "exercise probability",
                format!("must be between 0 and 100%, got {}", percent),
            ));
        }
        return Ok(ExerciseBreakdown::explicit(delta, percent / 100.0));
    }

    let profit = match input.profit_probability {
        Some(percent) => require_finite("profit probability", percent)?,
        None => estimated_profit_probability(delta),
    };
    Ok(ExerciseBreakdown::blend(delta, profit))
}
