//! # Signal Derivation Library
//!
//! This crate contains the trading logic of the bot: the MACD indicator engine,
//! the support/resistance band detector and the signal evaluator, composed by the
//! `MacdBand` strategy behind a universal `Strategy` trait.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** This crate has no knowledge of venues, orders or the clock.
//!   It depends only on `core-types` and `configuration`, and every function here
//!   is synchronous and side-effect free apart from `tracing` output.
//! - **Recompute From Scratch:** Each evaluation rebuilds the full indicator frame
//!   from the series it is given. No state is carried between polls.
//!
//! ## Public API
//!
//! - `Strategy`: The trait the trading loop drives.
//! - `MacdBand`: The concrete strategy.
//! - `compute_indicators`, `detect_band`, `evaluate`: The individual pipeline stages.

// Declare all the modules that constitute this crate.
pub mod band;
pub mod error;
pub mod evaluator;
pub mod indicators;
pub mod macd_band;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the key components to create a clean, public-facing API.
pub use band::{detect_band, Band};
pub use error::StrategyError;
pub use evaluator::evaluate;
pub use indicators::{compute_indicators, Ema, IndicatorFrame, IndicatorRow};
pub use macd_band::MacdBand;

use core_types::{CandleSeries, Signal};
use serde::Serialize;

/// Everything one pass of a strategy produced: the decision plus the values it was based on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub signal: Signal,
    pub row: IndicatorRow,
    pub band: Band,
}

/// The core trait that trading strategies implement.
///
/// Unlike a streaming strategy, `evaluate` takes `&self` and the whole series:
/// the result depends on nothing but its input. The `Send + Sync` bounds let the
/// trading loop hold the strategy behind a shared pointer.
pub trait Strategy: Send + Sync {
    /// The minimum number of bars `evaluate` accepts.
    fn warm_up(&self) -> usize;

    /// Evaluates the strategy on the most recent bar of `series`.
    ///
    /// # Returns
    ///
    /// * `Ok(Evaluation)` - with `Signal::None` when no trade conditions are met.
    /// * `Err(StrategyError::InsufficientData)` - if the series is shorter than `warm_up()`.
    fn evaluate(&self, series: &CandleSeries) -> Result<Evaluation, StrategyError>;
}
