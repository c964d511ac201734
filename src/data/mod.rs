//! Data ingestion
//!
//! Handles:
//! - JSON option chains exported by the data collector
//! - Percentage and volume text ("30%", "2.5万张")
//! - Market context fallbacks for chains missing price or expiry

pub mod loader;

pub use loader::*;
