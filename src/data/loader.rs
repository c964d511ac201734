//! Option chain loading
//!
//! Reads a JSON option chain exported by the data collector and turns it into
//! normalized [`OptionQuote`]s plus one [`MarketContext`]. This is the only
//! place where missing values are defaulted.

use std::path::Path;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{EvError, EvResult, Greeks, MarketContext, OptionQuote, OptionType};

/// Underlying price assumed when the chain does not carry one
pub const FALLBACK_UNDERLYING_PRICE: f64 = 340.0;
/// Days to expiry assumed when the chain carries neither days nor an expiry date
pub const FALLBACK_DAYS_TO_EXPIRY: u32 = 6;
/// Implied volatility assumed for quotes without one
pub const DEFAULT_IMPLIED_VOL: f64 = 0.30;

/// A number, or text such as "30%", "23.5" or "2.5万张"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn as_percent(&self) -> Option<f64> {
        match self {
            NumberOrText::Number(n) => Some(*n),
            NumberOrText::Text(s) => parse_percentage(s),
        }
    }

    fn as_volume(&self) -> Option<u64> {
        match self {
            NumberOrText::Number(n) if *n >= 0.0 => Some(n.round() as u64),
            NumberOrText::Number(_) => None,
            NumberOrText::Text(s) => parse_volume(s),
        }
    }
}

/// One row of the exported chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRecord {
    #[serde(rename = "type", alias = "option_type")]
    pub option_type: OptionType,
    pub strike: f64,
    #[serde(default, alias = "mid")]
    pub mid_price: Option<f64>,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
    #[serde(default, alias = "last")]
    pub last_price: Option<f64>,
    #[serde(default)]
    pub delta: Option<f64>,
    #[serde(default)]
    pub gamma: Option<f64>,
    #[serde(default)]
    pub theta: Option<f64>,
    #[serde(default)]
    pub vega: Option<f64>,
    #[serde(default, alias = "iv")]
    pub implied_volatility: Option<NumberOrText>,
    #[serde(default)]
    pub profit_probability: Option<NumberOrText>,
    #[serde(default)]
    pub volume: Option<NumberOrText>,
    #[serde(default)]
    pub open_interest: Option<NumberOrText>,
}

impl QuoteRecord {
    /// Normalize into an [`OptionQuote`].
    ///
    /// A missing delta or profit probability becomes NaN so the evaluator
    /// reports the quote instead of pricing it with a made-up input.
    pub fn into_quote(self) -> EvResult<OptionQuote> {
        let mid_price = match (self.mid_price, self.bid, self.ask, self.last_price) {
            (Some(mid), _, _, _) => mid,
            (None, Some(bid), Some(ask), _) => (bid + ask) / 2.0,
            (None, _, _, Some(last)) => last,
            _ => {
                return Err(EvError::data(format!(
                    "{} {}: no mid, bid/ask or last price",
                    self.option_type, self.strike
                )))
            }
        };

        let implied_volatility = match &self.implied_volatility {
            None => DEFAULT_IMPLIED_VOL,
            Some(NumberOrText::Number(n)) => *n,
            // "23.5%" is unambiguous, resolve it here
            Some(NumberOrText::Text(s)) if s.trim().ends_with('%') => {
                parse_percentage(s).map(|p| p / 100.0).unwrap_or(f64::NAN)
            }
            Some(NumberOrText::Text(s)) => parse_percentage(s).unwrap_or(f64::NAN),
        };

        let profit_probability = self
            .profit_probability
            .as_ref()
            .and_then(NumberOrText::as_percent)
            .unwrap_or(f64::NAN);

        let greeks = Greeks::new(
            self.delta.unwrap_or(f64::NAN),
            self.gamma.unwrap_or(0.0),
            self.theta.unwrap_or(0.0),
            self.vega.unwrap_or(0.0),
        );

        Ok(OptionQuote {
            option_type: self.option_type,
            strike: self.strike,
            mid_price,
            bid: self.bid,
            ask: self.ask,
            last_price: self.last_price,
            greeks,
            implied_volatility,
            profit_probability,
            volume: self.volume.as_ref().and_then(NumberOrText::as_volume),
            open_interest: self.open_interest.as_ref().and_then(NumberOrText::as_volume),
        })
    }
}

/// Exported option chain for one underlying and one expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainFile {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub underlying_price: Option<f64>,
    #[serde(default)]
    pub days_to_expiry: Option<u32>,
    /// Expiry date, used when `days_to_expiry` is absent
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
    /// Reference date for `expiry`; today when absent
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    pub quotes: Vec<QuoteRecord>,
}

/// Chain ready for evaluation
#[derive(Debug, Clone)]
pub struct LoadedChain {
    pub symbol: Option<String>,
    pub context: MarketContext,
    pub quotes: Vec<OptionQuote>,
    /// Rows that could not be turned into quotes
    pub rejected: Vec<String>,
}

impl ChainFile {
    /// Resolve the market context, applying the fallbacks
    pub fn market_context(&self, today: NaiveDate) -> EvResult<MarketContext> {
        let underlying_price = match self.underlying_price {
            Some(price) => price,
            None => {
                tracing::warn!("No underlying price in chain, using fallback {}", FALLBACK_UNDERLYING_PRICE);
                FALLBACK_UNDERLYING_PRICE
            }
        };

        let days_to_expiry = match (self.days_to_expiry, self.expiry) {
            (Some(days), _) => days,
            (None, Some(expiry)) => days_until(expiry, self.as_of.unwrap_or(today))?,
            (None, None) => {
                tracing::warn!("No expiry in chain, using fallback {} days", FALLBACK_DAYS_TO_EXPIRY);
                FALLBACK_DAYS_TO_EXPIRY
            }
        };

        MarketContext::new(underlying_price, days_to_expiry)
    }

    /// Normalize every row; rows that fail are kept aside, not fatal
    pub fn into_chain(self, today: NaiveDate) -> EvResult<LoadedChain> {
        let context = self.market_context(today)?;

        let mut quotes = Vec::with_capacity(self.quotes.len());
        let mut rejected = Vec::new();
        for record in self.quotes {
            match record.into_quote() {
                Ok(q) => quotes.push(q),
                Err(e) => {
                    tracing::warn!("Rejected chain row: {}", e);
                    rejected.push(e.to_string());
                }
            }
        }

        Ok(LoadedChain {
            symbol: self.symbol,
            context,
            quotes,
            rejected,
        })
    }
}

/// Whole days from `from` to `expiry`; must be at least one
pub fn days_until(expiry: NaiveDate, from: NaiveDate) -> EvResult<u32> {
    let days = (expiry - from).num_days();
    if days < 1 {
        return Err(EvError::invalid_field(
            "expiry",
            format!("{} is not after {}", expiry, from),
        ));
    }
    u32::try_from(days).map_err(|_| EvError::invalid_field("expiry", format!("{} days is out of range", days)))
}

/// Parse "25.0%" or "25" into 25.0
pub fn parse_percentage(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.trim_end_matches('%').trim().parse::<f64>().ok()
}

/// Parse "1200", "1200张" or "2.5万张" (万 = 10,000) into a contract count
pub fn parse_volume(text: &str) -> Option<u64> {
    let trimmed = text.trim().trim_end_matches('张').trim();
    if trimmed.is_empty() {
        return None;
    }

    let (number, multiplier) = match trimmed.strip_suffix('万') {
        Some(n) => (n.trim(), 10_000.0),
        None => (trimmed, 1.0),
    };

    number
        .parse::<f64>()
        .ok()
        .filter(|n| *n >= 0.0)
        .map(|n| (n * multiplier).round() as u64)
}

/// Parse a chain from JSON text
pub fn parse_chain_json(json: &str, today: NaiveDate) -> EvResult<LoadedChain> {
    let file: ChainFile = serde_json::from_str(json).map_err(|e| EvError::Serialization(e.to_string()))?;
    file.into_chain(today)
}

/// Load a chain from a JSON file, resolving expiry dates against today
pub fn load_chain_file(path: impl AsRef<Path>) -> EvResult<LoadedChain> {
    let json = std::fs::read_to_string(path.as_ref())?;
    let chain = parse_chain_json(&json, Utc::now().date_naive())?;

    tracing::info!(
        quotes = chain.quotes.len(),
        rejected = chain.rejected.len(),
        underlying = chain.context.underlying_price,
        days = chain.context.days_to_expiry,
        "Loaded chain from {:?}",
        path.as_ref()
    );
    Ok(chain)
}
