//! Exercise probability
//!
//! Blends |delta| with the quoted probability of profit. The 0.8/0.2 weights
//! and the [0.01, 0.99] clamp are calibration constants.

use serde::{Deserialize, Serialize};

pub const DELTA_WEIGHT: f64 = 0.8;
pub const PROFIT_WEIGHT: f64 = 0.2;
pub const MIN_EXERCISE_PROBABILITY: f64 = 0.01;
pub const MAX_EXERCISE_PROBABILITY: f64 = 0.99;

/// Intermediate values of the exercise probability blend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExerciseBreakdown {
    /// |delta|
    pub delta_probability: f64,
    /// Profit probability as a fraction; None when the probability was given explicitly
    pub profit_probability: Option<f64>,
    /// 0.8·delta + 0.2·profit, before clamping
    pub weighted: f64,
    /// Final probability used downstream
    pub probability: f64,
}

impl ExerciseBreakdown {
    /// Blend delta with a profit probability given in percent
    pub fn blend(delta: f64, profit_probability_percent: f64) -> Self {
        let delta_probability = delta.abs();
        let profit_probability = profit_probability_percent / 100.0;
        let weighted = DELTA_WEIGHT * delta_probability + PROFIT_WEIGHT * profit_probability;

        Self {
            delta_probability,
            profit_probability: Some(profit_probability),
            weighted,
            probability: weighted.clamp(MIN_EXERCISE_PROBABILITY, MAX_EXERCISE_PROBABILITY),
        }
    }

    /// Use a caller-supplied probability (fraction) as-is
    pub fn explicit(delta: f64, probability: f64) -> Self {
        Self {
            delta_probability: delta.abs(),
            profit_probability: None,
            weighted: probability,
            probability,
        }
    }

    pub fn no_exercise(&self) -> f64 {
        1.0 - self.probability
    }

    pub fn is_explicit(&self) -> bool {
        self.profit_probability.is_none()
    }
}

/// Probability that the short option finishes in the money
pub fn exercise_probability(delta: f64, profit_probability_percent: f64) -> f64 {
    ExerciseBreakdown::blend(delta, profit_probability_percent).probability
}

/// Stand-in profit probability (percent) when none is quoted
pub fn estimated_profit_probability(delta: f64) -> f64 {
    delta.abs() * 0.5 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_weights() {
        let p = exercise_probability(0.25, 30.0);
        assert!((p - 0.26).abs() < 1e-12);

        // Sign of delta is ignored
        assert_eq!(exercise_probability(-0.25, 30.0), p);
    }

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(exercise_probability(0.0, 0.0), 0.01);
        assert_eq!(exercise_probability(1.0, 100.0), 0.99);

        let b = ExerciseBreakdown::blend(1.0, 100.0);
        assert!((b.weighted - 1.0).abs() < 1e-12);
        assert_eq!(b.probability, 0.99);
    }

    #[test]
    fn test_monotone_in_delta() {
        for profit in [0.0, 25.0, 60.0, 100.0] {
            let mut last = 0.0;
            for i in 0..=100 {
                let delta = -(i as f64) / 100.0;
                let p = exercise_probability(delta, profit);
                assert!(p >= last, "profit={} delta={}", profit, delta);
                assert!((0.01..=0.99).contains(&p));
                last = p;
            }
        }
    }

    #[test]
    fn test_estimated_profit_probability() {
        assert!((estimated_profit_probability(-0.4) - 20.0).abs() < 1e-12);

        let b = ExerciseBreakdown::explicit(0.3, 0.42);
        assert!(b.is_explicit());
        assert_eq!(b.probability, 0.42);
        assert!((b.no_exercise() - 0.58).abs() < 1e-12);
    }
}
