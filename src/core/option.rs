//! Option type and moneyness
//!
//! The seller's side of a vanilla option: which way the underlying has to move
//! before the contract costs money, and how far it already has.

use serde::{Deserialize, Serialize};

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    #[serde(alias = "call", alias = "CALL", alias = "C")]
    Call,
    #[serde(alias = "put", alias = "PUT", alias = "P")]
    Put,
}

impl OptionType {
    /// Payoff direction: +1 for call, -1 for put
    pub fn phi(&self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// Intrinsic value at given spot
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }

    /// Strictly in the money at given spot
    pub fn is_itm(&self, spot: f64, strike: f64) -> bool {
        match self {
            OptionType::Call => spot > strike,
            OptionType::Put => spot < strike,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OptionType::Call => "Call",
            OptionType::Put => "Put",
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for OptionType {
    type Err = crate::core::EvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(OptionType::Call),
            "put" | "p" => Ok(OptionType::Put),
            other => Err(crate::core::EvError::invalid_field(
                "option type",
                format!("expected call or put, got {:?}", other),
            )),
        }
    }
}

/// Position of the strike relative to the underlying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Moneyness {
    /// In the money
    Itm,
    /// Strike equals the underlying
    Atm,
    /// Out of the money
    Otm,
}

impl Moneyness {
    /// Classify by exact comparison of strike and underlying
    pub fn classify(option_type: OptionType, spot: f64, strike: f64) -> Self {
        if option_type.is_itm(spot, strike) {
            Moneyness::Itm
        } else if strike == spot {
            Moneyness::Atm
        } else {
            Moneyness::Otm
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Moneyness::Itm => "ITM",
            Moneyness::Atm => "ATM",
            Moneyness::Otm => "OTM",
        }
    }
}
