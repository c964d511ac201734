//! Normal distribution primitives
//!
//! Self-contained density, error function and CDF, plus the two breakout
//! probability estimators. The CDF uses the Abramowitz-Stegun 7.1.26 rational
//! approximation of erf (max error ~1.5e-7) so results match the tabulated
//! constants exactly rather than whatever a platform libm returns.

use std::f64::consts::{PI, SQRT_2};

/// Floor and cap for the exponential breakout heuristic
const BREAKOUT_MIN: f64 = 0.01;
const BREAKOUT_MAX: f64 = 0.99;

/// Decay rate of the exponential breakout heuristic
const BREAKOUT_DECAY: f64 = 1.5;

/// Floor and cap for the CDF-based breakout probability
const CHART_BREAKOUT_MIN: f64 = 0.001;
const CHART_BREAKOUT_MAX: f64 = 0.999;

/// Gaussian density with given mean and standard deviation.
///
/// Returns NaN when `std <= 0`; callers guard degenerate distributions.
pub fn normal_pdf(x: f64, mean: f64, std: f64) -> f64 {
    if std <= 0.0 || std.is_nan() {
        return f64::NAN;
    }
    let exponent = -0.5 * ((x - mean) / std).powi(2);
    (1.0 / (std * (2.0 * PI).sqrt())) * exponent.exp()
}

/// Error function, Abramowitz-Stegun 7.1.26
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x >= 0.0 { 1.0 } else { -1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();

    sign * y
}

/// Standard normal CDF
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / SQRT_2))
}

/// Heuristic probability that price breaks through the strike.
///
/// `price_ratio` is the relative distance to the strike, `volatility_impact`
/// is `iv·√T`. Exponential decay in `z = ratio / impact`, not the normal CDF.
pub fn breakout_probability(price_ratio: f64, volatility_impact: f64) -> f64 {
    if volatility_impact <= 0.0 {
        return BREAKOUT_MIN;
    }

    let z = price_ratio / volatility_impact;
    let probability = if z >= 0.0 {
        0.5 * (-z * BREAKOUT_DECAY).exp()
    } else {
        0.5 * (1.0 - (z * BREAKOUT_DECAY).exp())
    };

    probability.clamp(BREAKOUT_MIN, BREAKOUT_MAX)
}

/// Probability that price reaches the strike, `1 − Φ(|K − S| / std)`.
///
/// This is the estimate shown next to the distribution chart; it is not
/// interchangeable with [`breakout_probability`].
pub fn break_probability_for_chart(underlying: f64, strike: f64, std: f64) -> f64 {
    if std <= 0.0 {
        tracing::debug!(std, "degenerate distribution, using minimum break probability");
        return BREAKOUT_MIN;
    }

    let z = (strike - underlying).abs() / std;
    (1.0 - normal_cdf(z)).clamp(CHART_BREAKOUT_MIN, CHART_BREAKOUT_MAX)
}
