//! Option quote data
//!
//! One normalized row of an option chain, plus the market context shared by
//! every row of a batch.

use serde::{Deserialize, Serialize};

use super::error::{require_positive, EvError, EvResult};
use super::greeks::Greeks;
use super::option::{Moneyness, OptionType};

/// Option market quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionQuote {
    /// Call or put
    pub option_type: OptionType,
    /// Strike price
    pub strike: f64,
    /// Mid price, the premium collected by the seller
    pub mid_price: f64,
    /// Bid price
    #[serde(default)]
    pub bid: Option<f64>,
    /// Ask price
    #[serde(default)]
    pub ask: Option<f64>,
    /// Last traded price
    #[serde(default)]
    pub last_price: Option<f64>,
    /// Greeks as quoted
    pub greeks: Greeks,
    /// Implied volatility, either a fraction (0.23) or a percentage (23.0)
    pub implied_volatility: f64,
    /// Externally computed probability of profit, in percent
    pub profit_probability: f64,
    /// Trading volume
    #[serde(default)]
    pub volume: Option<u64>,
    /// Open interest
    #[serde(default)]
    pub open_interest: Option<u64>,
}

impl OptionQuote {
    /// Create a quote with zero Greeks and no IV
    pub fn new(option_type: OptionType, strike: f64, mid_price: f64) -> Self {
        Self {
            option_type,
            strike,
            mid_price,
            bid: None,
            ask: None,
            last_price: None,
            greeks: Greeks::default(),
            implied_volatility: 0.0,
            profit_probability: 0.0,
            volume: None,
            open_interest: None,
        }
    }

    pub fn with_greeks(mut self, greeks: Greeks) -> Self {
        self.greeks = greeks;
        self
    }

    pub fn with_implied_volatility(mut self, iv: f64) -> Self {
        self.implied_volatility = iv;
        self
    }

    pub fn with_profit_probability(mut self, percent: f64) -> Self {
        self.profit_probability = percent;
        self
    }

    /// Premium collected by the seller
    pub fn premium(&self) -> f64 {
        self.mid_price
    }

    pub fn intrinsic_value(&self, spot: f64) -> f64 {
        self.option_type.intrinsic(spot, self.strike)
    }

    /// Premium above intrinsic value. Not clamped: illiquid quotes can go negative.
    pub fn time_value(&self, spot: f64) -> f64 {
        self.mid_price - self.intrinsic_value(spot)
    }

    pub fn moneyness(&self, spot: f64) -> Moneyness {
        Moneyness::classify(self.option_type, spot, self.strike)
    }

    /// Short description for logs, e.g. "Call 350"
    pub fn describe(&self) -> String {
        format!("{} {}", self.option_type, self.strike)
    }
}

/// Market parameters shared by every quote in a batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    /// Underlying spot price
    pub underlying_price: f64,
    /// Days until expiry
    pub days_to_expiry: u32,
}

impl MarketContext {
    /// Validated constructor; both values must be positive
    pub fn new(underlying_price: f64, days_to_expiry: u32) -> EvResult<Self> {
        let ctx = Self {
            underlying_price,
            days_to_expiry,
        };
        ctx.validate()?;
        Ok(ctx)
    }

    pub fn validate(&self) -> EvResult<()> {
        require_positive("underlying price", self.underlying_price)?;
        if self.days_to_expiry == 0 {
            return Err(EvError::invalid_field("days to expiry", "must be at least 1 day"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_values() {
        let quote = OptionQuote::new(OptionType::Call, 330.0, 12.0);

        assert_eq!(quote.intrinsic_value(340.0), 10.0);
        assert!((quote.time_value(340.0) - 2.0).abs() < 1e-12);
        assert_eq!(quote.premium(), 12.0);
        assert_eq!(quote.moneyness(340.0), Moneyness::Itm);
        assert_eq!(quote.describe(), "Call 330");
    }

    #[test]
    fn test_time_value_not_clamped() {
        // Quote below intrinsic
        let quote = OptionQuote::new(OptionType::Put, 360.0, 18.0);
        assert!((quote.time_value(340.0) + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_market_context_validation() {
        assert!(MarketContext::new(340.0, 6).is_ok());

        let err = MarketContext::new(0.0, 6).unwrap_err();
        assert_eq!(err.field(), Some("underlying price"));

        let err = MarketContext::new(340.0, 0).unwrap_err();
        assert_eq!(err.field(), Some("days to expiry"));
    }
}
