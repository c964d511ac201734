//! Option Greeks
//!
//! Sensitivities as quoted by the data source. Nothing here derives them;
//! they are inputs to the EV model.

use serde::{Deserialize, Serialize};

use super::error::{require_finite, EvResult};

/// Option Greeks (sensitivities)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta: dV/dS, positive for calls and negative for puts
    pub delta: f64,
    /// Gamma: d²V/dS²
    #[serde(default)]
    pub gamma: f64,
    /// Theta: dV/dt, per day (usually negative for the long side)
    #[serde(default)]
    pub theta: f64,
    /// Vega: dV/dσ
    #[serde(default)]
    pub vega: f64,
}

impl Greeks {
    pub fn new(delta: f64, gamma: f64, theta: f64, vega: f64) -> Self {
        Self {
            delta,
            gamma,
            theta,
            vega,
        }
    }

    /// |delta|, used as a proxy for the probability of finishing in the money
    pub fn delta_magnitude(&self) -> f64 {
        self.delta.abs()
    }

    /// Check the Greeks the EV model reads (vega is informational)
    pub fn validate(&self) -> EvResult<()> {
        require_finite("delta", self.delta)?;
        require_finite("gamma", self.gamma)?;
        require_finite("theta", self.theta)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(Greeks::new(-0.3, 0.01, -0.05, 0.2).validate().is_ok());

        let err = Greeks::new(f64::NAN, 0.01, -0.05, 0.2).validate().unwrap_err();
        assert_eq!(err.field(), Some("delta"));

        let err = Greeks::new(0.3, 0.01, f64::INFINITY, 0.2).validate().unwrap_err();
        assert_eq!(err.field(), Some("theta"));
    }

    #[test]
    fn test_delta_magnitude() {
        assert_eq!(Greeks::new(-0.25, 0.0, 0.0, 0.0).delta_magnitude(), 0.25);
    }
}
