//! Option evaluation
//!
//! Entry points over the pricing models:
//! - **BatchEvaluator**: ranks a whole option chain by expected value,
//!   skipping quotes that cannot be evaluated
//! - **OptionCalculator**: one hand-entered option, strictly validated
//!
//! Both share one pricing path, so a trace always carries the same numbers
//! as its result.

mod advice;
mod calculator;
mod config;
mod evaluator;

pub use advice::*;
pub use calculator::*;
pub use config::*;
pub use evaluator::*;
