//! # Short Option EV - Expected Value of Selling Options
//!
//! Evaluates short (sold) vanilla options from option-chain quotes: how likely
//! the option is to be exercised, what it costs the seller when it is, and the
//! resulting expected value of collecting the premium.
//!
//! ## Overview
//!
//! For every candidate the evaluator combines:
//! - **Exercise probability**: 80% |delta| blended with 20% quoted profit probability
//! - **Potential payout**: expected loss beyond the premium under a normal price model
//! - **Expected value**: premium kept when not exercised, minus payout when exercised
//!
//! Candidates are ranked by expected value, with a risk/reward ratio and a
//! recommendation tier for each one.
//!
//! ## Key Components
//!
//! - **Core**: quotes, greeks, option type and moneyness, errors
//! - **Models**: normal distribution, exercise probability, payout models, EV
//! - **Evaluation**: batch ranking, single-option calculator, risk guidance
//! - **Data**: JSON option chain loading with fallbacks for missing values
//!
//! ## Usage
//!
//! ```rust,no_run
//! use short_option_ev::prelude::*;
//!
//! let ctx = MarketContext::new(340.0, 6).unwrap();
//! let quotes = vec![
//!     OptionQuote::new(OptionType::Call, 350.0, 2.5)
//!         .with_greeks(Greeks::new(0.25, 0.01, -0.05, 0.1))
//!         .with_implied_volatility(0.30)
//!         .with_profit_probability(30.0),
//! ];
//!
//! let report = BatchEvaluator::new().evaluate(&quotes, &ctx).unwrap();
//! for r in &report.results {
//!     println!("{} {}: EV {:.2}", r.option_type, r.strike, r.expected_value);
//! }
//! ```
//!
//! ## What This Does NOT Do
//!
//! - Price options (premiums and greeks come from the quotes)
//! - Fetch market data
//! - Model early exercise, dividends or interest rates

pub mod core;
pub mod data;
pub mod evaluation;
pub mod models;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{EvError, EvResult, Greeks, MarketContext, Moneyness, OptionQuote, OptionType};

    // Models
    pub use crate::models::{
        break_probability_for_chart, breakout_probability, exercise_probability, normal_cdf, normal_pdf,
        EvBreakdown, ExerciseBreakdown, IntegrationSettings, PayoutDetail, PayoutEstimate, PayoutModel,
        PriceDistribution, SigmaBand, DensityPoint,
    };

    // Evaluation
    pub use crate::evaluation::{
        evaluate_batch, BatchEvaluator, BatchReport, Calculation, CalculatorInput, DeltaFilter,
        EvaluationConfig, EvaluationDiagnostic, EvaluationResult, EvaluationTrace, OptionCalculator,
        Recommendation, RiskGuidance,
    };

    // Data
    pub use crate::data::{load_chain_file, LoadedChain};
}

// Re-export main types at crate root
pub use crate::core::{EvError, EvResult};
pub use crate::evaluation::{BatchEvaluator, OptionCalculator};
