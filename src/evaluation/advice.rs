//! Trading advice derived from evaluation results
//!
//! Recommendation tiers, risk guidance for a single position, and the delta
//! window used to narrow a batch down to tradeable strikes.

use serde::{Deserialize, Serialize};

use crate::core::{OptionQuote, OptionType};

/// Recommendation tier for selling the option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    /// Positive EV with risk/reward below 2
    Recommended,
    /// Positive EV with risk/reward below 3
    Caution,
    /// Positive EV but risk/reward 3 or above
    HighRisk,
    /// Non-positive EV
    NotRecommended,
}

impl Recommendation {
    pub fn classify(expected_value: f64, risk_reward_ratio: f64) -> Self {
        if expected_value > 0.0 && risk_reward_ratio < 2.0 {
            Recommendation::Recommended
        } else if expected_value > 0.0 && risk_reward_ratio < 3.0 {
            Recommendation::Caution
        } else if expected_value > 0.0 {
            Recommendation::HighRisk
        } else {
            Recommendation::NotRecommended
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::Recommended => "recommended",
            Recommendation::Caution => "caution",
            Recommendation::HighRisk => "high risk",
            Recommendation::NotRecommended => "not recommended",
        }
    }
}

/// Position sizing and stop-loss hints for a single short option
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskGuidance {
    /// Underlying moved one implied σ against the seller
    pub stop_loss_price: f64,
    /// Suggested maximum position, percent of account (1 to 5)
    pub max_position_pct: f64,
}

impl RiskGuidance {
    pub fn new(option_type: OptionType, underlying: f64, implied_vol: f64, time: f64, risk_reward_ratio: f64) -> Self {
        let move_fraction = implied_vol * time.sqrt();
        let stop_loss_price = underlying * (1.0 + option_type.phi() * move_fraction);

        Self {
            stop_loss_price,
            max_position_pct: (10.0 / risk_reward_ratio).max(1.0).min(5.0),
        }
    }
}

/// Inclusive delta window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeltaFilter {
    pub min: f64,
    pub max: f64,
}

impl DeltaFilter {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Pick a window from the call/put mix of a chain
    ///
    /// Both sides present: [-0.4, 0.4]; mostly puts: [-0.4, -0.01];
    /// mostly calls: [0.01, 0.4]; nothing to go on: None.
    pub fn auto(quotes: &[OptionQuote]) -> Option<Self> {
        let calls = quotes.iter().filter(|q| q.option_type == OptionType::Call).count();
        let puts = quotes.len() - calls;

        if calls > 0 && puts > 0 {
            Some(Self::new(-0.4, 0.4))
        } else if puts > calls {
            Some(Self::new(-0.4, -0.01))
        } else if calls > puts {
            Some(Self::new(0.01, 0.4))
        } else {
            None
        }
    }

    pub fn contains(&self, delta: f64) -> bool {
        delta >= self.min && delta <= self.max
    }
}
