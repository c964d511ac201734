//! Terminal price distribution view
//!
//! Normal approximation of the underlying at expiry, `N(S, S·σ·√T)`, for
//! charting and risk summaries.

use serde::{Deserialize, Serialize};

use super::normal::{break_probability_for_chart, normal_pdf};

/// Number of intervals in the density curve
const CURVE_INTERVALS: usize = 200;

/// A price band and the share of the distribution it covers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmaBand {
    pub sigmas: u32,
    pub lower: f64,
    pub upper: f64,
    /// Coverage in percent
    pub coverage: f64,
}

/// One point of the density curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityPoint {
    pub price: f64,
    pub density: f64,
}

/// Normal price distribution at expiry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceDistribution {
    pub mean: f64,
    pub std: f64,
}

impl PriceDistribution {
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    /// 1σ, 2σ and 3σ bands around the mean
    pub fn sigma_bands(&self) -> [SigmaBand; 3] {
        let band = |sigmas: u32, coverage: f64| SigmaBand {
            sigmas,
            lower: self.mean - sigmas as f64 * self.std,
            upper: self.mean + sigmas as f64 * self.std,
            coverage,
        };
        [band(1, 68.27), band(2, 95.45), band(3, 99.73)]
    }

    /// Density curve that always includes the strike with one σ of margin
    pub fn density_curve(&self, strike: f64) -> Vec<DensityPoint> {
        if self.std <= 0.0 || self.std.is_nan() {
            return Vec::new();
        }

        let min_price = (self.mean - 3.0 * self.std).min(strike - self.std);
        let max_price = (self.mean + 3.0 * self.std).max(strike + self.std);
        let step = (max_price - min_price) / CURVE_INTERVALS as f64;

        (0..=CURVE_INTERVALS)
            .map(|i| {
                let price = min_price + i as f64 * step;
                DensityPoint {
                    price,
                    density: normal_pdf(price, self.mean, self.std),
                }
            })
            .collect()
    }

    /// Probability that price reaches the strike
    pub fn break_probability(&self, strike: f64) -> f64 {
        break_probability_for_chart(self.mean, strike, self.std)
    }
}
