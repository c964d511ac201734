//! Expected value aggregation
//!
//! EV of a short option = premium kept when not exercised minus the
//! probability-weighted payout when it is.

use serde::{Deserialize, Serialize};

use crate::core::{EvError, EvResult, MarketContext, OptionQuote};

/// Calendar days per year used for theta decay
pub const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;

/// Components of the expected value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvBreakdown {
    pub exercise_probability: f64,
    pub no_exercise_probability: f64,
    pub premium: f64,
    pub potential_payout: f64,
    /// premium · (1 − p)
    pub premium_component: f64,
    /// payout · p
    pub payout_component: f64,
    /// theta · days / 365, 0 unless applied
    pub time_decay: f64,
    pub expected_value: f64,
    /// payout / premium
    pub risk_reward_ratio: f64,
}

impl EvBreakdown {
    /// Combine exercise probability, potential payout and premium.
    ///
    /// A zero premium leaves the risk/reward ratio undefined and is rejected.
    pub fn combine(exercise_probability: f64, potential_payout: f64, premium: f64) -> EvResult<Self> {
        let premium = check_premium(premium)?;
        let no_exercise_probability = 1.0 - exercise_probability;
        let premium_component = premium * no_exercise_probability;
        let payout_component = potential_payout * exercise_probability;

        let breakdown = Self {
            exercise_probability,
            no_exercise_probability,
            premium,
            potential_payout,
            premium_component,
            payout_component,
            time_decay: 0.0,
            expected_value: premium_component - payout_component,
            risk_reward_ratio: potential_payout / premium,
        };
        breakdown.ensure_finite()?;
        Ok(breakdown)
    }

    /// Add theta decay over the remaining days to the expected value
    pub fn with_time_decay(mut self, theta: f64, days_to_expiry: u32, days_per_year: f64) -> Self {
        self.time_decay = time_decay(theta, days_to_expiry, days_per_year);
        self.expected_value += self.time_decay;
        self
    }

    pub fn ensure_finite(&self) -> EvResult<()> {
        if !self.expected_value.is_finite() {
            return Err(EvError::numerical(format!("non-finite expected value {}", self.expected_value)));
        }
        if !self.risk_reward_ratio.is_finite() {
            return Err(EvError::numerical(format!(
                "non-finite risk/reward ratio {}",
                self.risk_reward_ratio
            )));
        }
        Ok(())
    }
}

/// Reject premiums the aggregator cannot divide by
pub fn check_premium(premium: f64) -> EvResult<f64> {
    if premium == 0.0 {
        return Err(EvError::ZeroPremium);
    }
    if premium < 0.0 || !premium.is_finite() {
        return Err(EvError::invalid_field("premium", format!("must be greater than 0, got {}", premium)));
    }
    Ok(premium)
}

/// `theta · days / days_per_year`
pub fn time_decay(theta: f64, days_to_expiry: u32, days_per_year: f64) -> f64 {
    theta * (days_to_expiry as f64 / days_per_year)
}

/// Quick delta-weighted screen over time value, with theta decay.
///
/// Uses |delta| as the probability of finishing in the money. ITM quotes
/// earn intrinsic plus time value with that probability; OTM quotes only
/// time value. Independent of the payout models.
pub fn time_value_screen(quote: &OptionQuote, ctx: &MarketContext) -> f64 {
    let spot = ctx.underlying_price;
    let intrinsic = quote.intrinsic_value(spot);
    let time_value = quote.time_value(spot);
    let probability = quote.greeks.delta_magnitude();

    let ev = if intrinsic > 0.0 {
        probability * (intrinsic + time_value) - (1.0 - probability) * time_value
    } else {
        probability * time_value - (1.0 - probability) * time_value
    };

    ev + time_decay(quote.greeks.theta, ctx.days_to_expiry, CALENDAR_DAYS_PER_YEAR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Greeks, OptionType};

    #[test]
    fn test_combine() {
        let b = EvBreakdown::combine(0.26, 1.9, 2.5).unwrap();
        assert!((b.no_exercise_probability - 0.74).abs() < 1e-12);
        assert!((b.premium_component - 1.85).abs() < 1e-12);
        assert!((b.payout_component - 0.494).abs() < 1e-12);
        assert!((b.expected_value - 1.356).abs() < 1e-12);
        assert!((b.risk_reward_ratio - 0.76).abs() < 1e-12);
        assert_eq!(b.time_decay, 0.0);
    }

    #[test]
    fn test_zero_premium_rejected() {
        assert!(matches!(EvBreakdown::combine(0.3, 1.0, 0.0), Err(EvError::ZeroPremium)));

        let err = EvBreakdown::combine(0.3, 1.0, -1.0).unwrap_err();
        assert_eq!(err.field(), Some("premium"));

        let err = EvBreakdown::combine(0.3, 1.0, f64::NAN).unwrap_err();
        assert_eq!(err.field(), Some("premium"));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(EvBreakdown::combine(0.3, f64::INFINITY, 1.0), Err(EvError::Numerical(_))));
    }

    #[test]
    fn test_time_decay() {
        let b = EvBreakdown::combine(0.26, 1.9, 2.5)
            .unwrap()
            .with_time_decay(-0.365, 10, CALENDAR_DAYS_PER_YEAR);
        assert!((b.time_decay + 0.01).abs() < 1e-12);
        assert!((b.expected_value - 1.346).abs() < 1e-12);
    }

    #[test]
    fn test_time_value_screen() {
        let ctx = MarketContext::new(340.0, 6).unwrap();

        // OTM: (p - (1 - p)) · tv + decay
        let otm = OptionQuote::new(OptionType::Call, 350.0, 2.0).with_greeks(Greeks::new(0.25, 0.01, -0.365, 0.1));
        let expected = (0.25 * 2.0 - 0.75 * 2.0) + (-0.365 * 6.0 / 365.0);
        assert!((time_value_screen(&otm, &ctx) - expected).abs() < 1e-12);

        // ITM put: intrinsic 10, time value 1
        let itm = OptionQuote::new(OptionType::Put, 350.0, 11.0).with_greeks(Greeks::new(-0.7, 0.01, 0.0, 0.1));
        let expected = 0.7 * 11.0 - 0.3 * 1.0;
        assert!((time_value_screen(&itm, &ctx) - expected).abs() < 1e-9);
    }
}
