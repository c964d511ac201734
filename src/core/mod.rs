//! Core data types for short option EV evaluation
//!
//! Defines fundamental types:
//! - OptionType / Moneyness: call or put, and where the strike sits
//! - Greeks: quoted sensitivities
//! - OptionQuote: one normalized option-chain row
//! - MarketContext: underlying price and days to expiry

pub mod option;
pub mod quote;
pub mod greeks;
pub mod error;

pub use option::*;
pub use quote::*;
pub use greeks::*;
pub use error::*;
