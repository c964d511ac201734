//! Potential payout estimators
//!
//! Two independent ways of sizing what the seller stands to pay out if the
//! option is exercised against them:
//!
//! - **NumericalIntegration**: Riemann sum of the seller's loss beyond the
//!   premium over a normal price diffusion spanning ±3σ. Authoritative.
//! - **ClosedFormHeuristic**: Greek-weighted risk terms scaled by the
//!   exponential breakout heuristic. Used by the single-option calculator.
//!
//! Callers pick one through [`PayoutModel`]; neither is derived from the other.

use serde::{Deserialize, Serialize};

use super::normal::{breakout_probability, normal_pdf};
use crate::core::{Moneyness, OptionType};

/// Trading days per year used to annualize time to expiry
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Interpret an implied volatility quote. Anything above 1.0 is read as a
/// percentage (23.0 → 0.23), anything else as a fraction.
pub fn normalize_implied_vol(iv: f64) -> f64 {
    if iv > 1.0 {
        iv / 100.0
    } else {
        iv
    }
}

/// Days to expiry as a fraction of a year
pub fn annualized_time(days_to_expiry: u32, days_per_year: f64) -> f64 {
    days_to_expiry as f64 / days_per_year
}

/// Payout model selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutModel {
    /// Numerical integration of expected loss over the price distribution
    #[default]
    NumericalIntegration,
    /// Greek-weighted heuristic with exponential breakout probability
    ClosedFormHeuristic,
}

impl PayoutModel {
    pub fn label(&self) -> &'static str {
        match self {
            PayoutModel::NumericalIntegration => "numerical integration",
            PayoutModel::ClosedFormHeuristic => "closed-form heuristic",
        }
    }

    /// Estimate the potential payout for one option
    pub fn estimate(&self, inputs: &PayoutInputs, settings: &IntegrationSettings) -> PayoutEstimate {
        match self {
            PayoutModel::NumericalIntegration => {
                let outcome = integrate_expected_loss(inputs, settings);
                PayoutEstimate {
                    model: *self,
                    payout: outcome.intrinsic_component + outcome.expected_loss,
                    detail: PayoutDetail::Integration(outcome),
                }
            }
            PayoutModel::ClosedFormHeuristic => {
                let outcome = closed_form_payout(inputs);
                PayoutEstimate {
                    model: *self,
                    payout: outcome.payout,
                    detail: PayoutDetail::Heuristic(outcome),
                }
            }
        }
    }
}

/// Integration grid settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationSettings {
    /// Number of equal steps across the grid
    /// Default: 1000
    pub steps: usize,
    /// Half-width of the grid in standard deviations
    /// Default: 3.0 (grid spans ±3σ)
    pub sigma_span: f64,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            steps: 1000,
            sigma_span: 3.0,
        }
    }
}

/// Everything a payout model reads, already normalized
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoutInputs {
    pub option_type: OptionType,
    pub underlying: f64,
    pub strike: f64,
    pub premium: f64,
    /// Implied volatility as a fraction
    pub implied_vol: f64,
    /// Annualized time to expiry
    pub time: f64,
    pub delta: f64,
    pub gamma: f64,
}

impl PayoutInputs {
    /// Standard deviation of the terminal price, `S·σ·√T`
    pub fn sigma(&self) -> f64 {
        self.underlying * self.implied_vol * self.time.sqrt()
    }

    pub fn intrinsic(&self) -> f64 {
        self.option_type.intrinsic(self.underlying, self.strike)
    }

    pub fn moneyness(&self) -> Moneyness {
        Moneyness::classify(self.option_type, self.underlying, self.strike)
    }

    /// Seller's loss beyond the premium if the underlying settles at `price`
    fn loss_at(&self, price: f64) -> Option<f64> {
        let exercised = match self.option_type {
            OptionType::Call => price > self.strike,
            OptionType::Put => price < self.strike,
        };
        if !exercised {
            return None;
        }
        let loss = self.option_type.intrinsic(price, self.strike) - self.premium;
        (loss > 0.0).then_some(loss)
    }
}

/// Result of a payout model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutEstimate {
    pub model: PayoutModel,
    /// Potential payout fed to the EV aggregator
    pub payout: f64,
    pub detail: PayoutDetail,
}

/// Model-specific intermediate values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PayoutDetail {
    Integration(IntegrationOutcome),
    Heuristic(HeuristicOutcome),
}

/// Numerical integration intermediates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationOutcome {
    /// Standard deviation of the terminal price
    pub sigma: f64,
    /// First sampled price
    pub lower_bound: f64,
    /// End of the grid (not sampled)
    pub upper_bound: f64,
    /// Width of each step
    pub step_width: f64,
    pub steps: usize,
    /// Integrated loss beyond the premium
    pub expected_loss: f64,
    /// Intrinsic value added for ITM options, 0 otherwise
    pub intrinsic_component: f64,
}

/// Integrate the seller's expected loss beyond the premium.
///
/// Samples `S − kσ + 2kσ·i/n` for `i` in `0..n` and accumulates
/// `loss · pdf` wherever the loss is positive, then multiplies by the step
/// width. ITM options additionally carry their intrinsic value.
pub fn integrate_expected_loss(inputs: &PayoutInputs, settings: &IntegrationSettings) -> IntegrationOutcome {
    let sigma = inputs.sigma();
    let intrinsic_component = if inputs.option_type.is_itm(inputs.underlying, inputs.strike) {
        inputs.intrinsic()
    } else {
        0.0
    };

    if sigma <= 0.0 || sigma.is_nan() || settings.steps == 0 {
        tracing::debug!(sigma, steps = settings.steps, "degenerate integration grid, expected loss is 0");
        return IntegrationOutcome {
            sigma,
            lower_bound: inputs.underlying,
            upper_bound: inputs.underlying,
            step_width: 0.0,
            steps: settings.steps,
            expected_loss: 0.0,
            intrinsic_component,
        };
    }

    let steps = settings.steps as f64;
    let price_range = 2.0 * settings.sigma_span * sigma;
    let lower_bound = inputs.underlying - price_range / 2.0;

    let mut total = 0.0;
    for i in 0..settings.steps {
        let price = lower_bound + (price_range * i as f64 / steps);
        if let Some(loss) = inputs.loss_at(price) {
            total += loss * normal_pdf(price, inputs.underlying, sigma);
        }
    }

    let step_width = price_range / steps;

    IntegrationOutcome {
        sigma,
        lower_bound,
        upper_bound: inputs.underlying + price_range / 2.0,
        step_width,
        steps: settings.steps,
        expected_loss: total * step_width,
        intrinsic_component,
    }
}

/// Closed-form heuristic intermediates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeuristicOutcome {
    pub moneyness: Moneyness,
    /// Relative distance to the strike (OTM only)
    pub price_ratio: Option<f64>,
    /// `iv·√T`
    pub volatility_impact: f64,
    /// Exponential breakout probability (OTM only)
    pub break_probability: Option<f64>,
    pub delta_risk: f64,
    pub gamma_risk: f64,
    pub volatility_risk: f64,
    pub intrinsic_component: f64,
    pub payout: f64,
}

/// Greek-weighted payout heuristic.
///
/// OTM: `max(0, |Δ|·S·0.1 + Γ·S²·0.01 + S·iv·√T·|Δ|·breakout)`.
/// ITM and ATM: `intrinsic + |Δ|·S·0.15 + Γ·S²·0.02 + S·iv·√T·|Δ|·0.5`.
pub fn closed_form_payout(inputs: &PayoutInputs) -> HeuristicOutcome {
    let s = inputs.underlying;
    let abs_delta = inputs.delta.abs();
    let sqrt_t = inputs.time.sqrt();
    let volatility_impact = inputs.implied_vol * sqrt_t;
    let moneyness = inputs.moneyness();

    match moneyness {
        Moneyness::Otm => {
            let price_ratio = match inputs.option_type {
                OptionType::Call => (inputs.strike - s) / s,
                OptionType::Put => (s - inputs.strike) / s,
            };
            let break_probability = breakout_probability(price_ratio, volatility_impact);

            let delta_risk = abs_delta * s * 0.1;
            let gamma_risk = inputs.gamma * s * s * 0.01;
            let volatility_risk = s * inputs.implied_vol * sqrt_t * abs_delta;

            HeuristicOutcome {
                moneyness,
                price_ratio: Some(price_ratio),
                volatility_impact,
                break_probability: Some(break_probability),
                delta_risk,
                gamma_risk,
                volatility_risk,
                intrinsic_component: 0.0,
                payout: (delta_risk + gamma_risk + volatility_risk * break_probability).max(0.0),
            }
        }
        Moneyness::Itm | Moneyness::Atm => {
            let intrinsic = inputs.intrinsic();
            let delta_risk = abs_delta * s * 0.15;
            let gamma_risk = inputs.gamma * s * s * 0.02;
            let volatility_risk = s * inputs.implied_vol * sqrt_t * abs_delta * 0.5;

            HeuristicOutcome {
                moneyness,
                price_ratio: None,
                volatility_impact,
                break_probability: None,
                delta_risk,
                gamma_risk,
                volatility_risk,
                intrinsic_component: intrinsic,
                payout: intrinsic + delta_risk + gamma_risk + volatility_risk,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn otm_call() -> PayoutInputs {
        PayoutInputs {
            option_type: OptionType::Call,
            underlying: 340.0,
            strike: 350.0,
            premium: 2.5,
            implied_vol: 0.30,
            time: annualized_time(6, TRADING_DAYS_PER_YEAR),
            delta: 0.25,
            gamma: 0.01,
        }
    }

    #[test]
    fn test_normalize_implied_vol() {
        assert_eq!(normalize_implied_vol(23.0), 0.23);
        assert_eq!(normalize_implied_vol(0.23), 0.23);
        assert_eq!(normalize_implied_vol(1.0), 1.0);
        assert_eq!(normalize_implied_vol(1.5), 0.015);
    }

    #[test]
    fn test_sigma() {
        let inputs = otm_call();
        assert!((inputs.time - 0.0238095).abs() < 1e-6);
        assert!((inputs.sigma() - 15.739).abs() < 0.01);
    }

    #[test]
    fn test_integration_grid() {
        let outcome = integrate_expected_loss(&otm_call(), &IntegrationSettings::default());

        assert_eq!(outcome.steps, 1000);
        assert!((outcome.lower_bound - (340.0 - 3.0 * outcome.sigma)).abs() < 1e-9);
        assert!((outcome.upper_bound - (340.0 + 3.0 * outcome.sigma)).abs() < 1e-9);
        assert!((outcome.step_width - 6.0 * outcome.sigma / 1000.0).abs() < 1e-12);
        assert_eq!(outcome.intrinsic_component, 0.0);

        // E[max(S - 352.5, 0)] for S ~ N(340, 15.74) is about 1.91
        assert!(outcome.expected_loss > 1.7 && outcome.expected_loss < 2.1, "{}", outcome.expected_loss);
    }

    #[test]
    fn test_integration_is_deterministic() {
        let settings = IntegrationSettings::default();
        let a = integrate_expected_loss(&otm_call(), &settings);
        let b = integrate_expected_loss(&otm_call(), &settings);
        assert_eq!(a.expected_loss.to_bits(), b.expected_loss.to_bits());
    }

    #[test]
    fn test_deep_otm_has_no_payout() {
        let inputs = PayoutInputs {
            strike: 500.0,
            delta: 0.01,
            implied_vol: 0.2,
            ..otm_call()
        };
        let estimate = PayoutModel::NumericalIntegration.estimate(&inputs, &IntegrationSettings::default());
        assert_eq!(estimate.payout, 0.0);
    }

    #[test]
    fn test_deep_itm_covers_intrinsic() {
        let inputs = PayoutInputs {
            strike: 250.0,
            premium: 91.0,
            delta: 0.99,
            ..otm_call()
        };
        let estimate = PayoutModel::NumericalIntegration.estimate(&inputs, &IntegrationSettings::default());
        assert!(estimate.payout >= inputs.intrinsic());
        match estimate.detail {
            PayoutDetail::Integration(o) => assert_eq!(o.intrinsic_component, 90.0),
            _ => panic!("expected integration detail"),
        }
    }

    #[test]
    fn test_put_integration_mirrors_call() {
        let call = otm_call();
        let put = PayoutInputs {
            option_type: OptionType::Put,
            strike: 330.0,
            delta: -0.25,
            ..call
        };
        let settings = IntegrationSettings::default();
        let c = integrate_expected_loss(&call, &settings).expected_loss;
        let p = integrate_expected_loss(&put, &settings).expected_loss;
        // Same distance from spot; left Riemann sums differ only by grid offset
        assert!((c - p).abs() < 0.05, "call={} put={}", c, p);
    }

    #[test]
    fn test_degenerate_sigma() {
        let inputs = PayoutInputs {
            implied_vol: 0.0,
            ..otm_call()
        };
        let outcome = integrate_expected_loss(&inputs, &IntegrationSettings::default());
        assert_eq!(outcome.expected_loss, 0.0);
        assert_eq!(outcome.step_width, 0.0);

        let heuristic = closed_form_payout(&inputs);
        assert_eq!(heuristic.break_probability, Some(0.01));
        assert!(heuristic.payout.is_finite());

        let nan_vol = PayoutInputs {
            implied_vol: f64::NAN,
            ..otm_call()
        };
        let outcome = integrate_expected_loss(&nan_vol, &IntegrationSettings::default());
        assert_eq!(outcome.expected_loss, 0.0);
    }

    #[test]
    fn test_closed_form_otm() {
        let inputs = otm_call();
        let outcome = closed_form_payout(&inputs);

        let sqrt_t = inputs.time.sqrt();
        let ratio = 10.0 / 340.0;
        let bp = breakout_probability(ratio, 0.30 * sqrt_t);
        let expected = 0.25 * 340.0 * 0.1 + 0.01 * 340.0 * 340.0 * 0.01 + 340.0 * 0.30 * sqrt_t * 0.25 * bp;

        assert_eq!(outcome.moneyness, Moneyness::Otm);
        assert!((outcome.price_ratio.unwrap() - ratio).abs() < 1e-12);
        assert!((outcome.payout - expected).abs() < 1e-9);
    }

    #[test]
    fn test_closed_form_itm_and_atm() {
        let inputs = PayoutInputs {
            option_type: OptionType::Put,
            strike: 350.0,
            delta: -0.6,
            ..otm_call()
        };
        let outcome = closed_form_payout(&inputs);
        let sqrt_t = inputs.time.sqrt();
        let expected = 10.0 + 0.6 * 340.0 * 0.15 + 0.01 * 340.0 * 340.0 * 0.02 + 340.0 * 0.30 * sqrt_t * 0.6 * 0.5;

        assert_eq!(outcome.moneyness, Moneyness::Itm);
        assert_eq!(outcome.break_probability, None);
        assert!((outcome.payout - expected).abs() < 1e-9);

        let atm = closed_form_payout(&PayoutInputs { strike: 340.0, ..inputs });
        assert_eq!(atm.moneyness, Moneyness::Atm);
        assert_eq!(atm.intrinsic_component, 0.0);
    }

    #[test]
    fn test_models_are_distinct() {
        let settings = IntegrationSettings::default();
        let inputs = otm_call();
        let numerical = PayoutModel::NumericalIntegration.estimate(&inputs, &settings);
        let heuristic = PayoutModel::ClosedFormHeuristic.estimate(&inputs, &settings);
        assert_eq!(numerical.model, PayoutModel::NumericalIntegration);
        assert_eq!(heuristic.model, PayoutModel::ClosedFormHeuristic);
        assert!((numerical.payout - heuristic.payout).abs() > 0.1);
    }
}
