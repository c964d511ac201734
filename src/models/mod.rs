//! Pricing models
//!
//! Implements:
//! - Normal primitives (density, A&S erf/CDF, breakout probabilities)
//! - Exercise probability blend
//! - Potential payout (numerical integration and closed-form heuristic)
//! - Expected value aggregation
//! - Terminal price distribution view

pub mod normal;
pub mod exercise;
pub mod payout;
pub mod expected_value;
pub mod distribution;

pub use normal::*;
pub use exercise::*;
pub use payout::*;
pub use expected_value::*;
pub use distribution::*;
