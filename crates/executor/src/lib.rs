//! # Order Execution Crate
//!
//! This crate turns a trading decision into a protected market order. It prices
//! the stop-loss and take-profit legs of a bracket and defines a generic
//! `Executor` trait with two implementations.
//!
//! ## Public API
//!
//! - `Executor`: The order execution sink the trading loop submits to.
//! - `LiveExecutor`: Sends bracket orders to the venue through an `ApiClient`.
//! - `SimulatedExecutor`: Paper trading; fills at the reference price without touching the venue.
//! - `build_bracket_order`: Computes stop-loss/take-profit prices from pip settings.
//! - `ExecutorError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod bracket;
pub mod error;
pub mod exchange;

// Re-export the key components to provide a clean, public-facing API.
pub use bracket::build_bracket_order;
pub use error::ExecutorError;
pub use exchange::{Executor, LiveExecutor, SimulatedExecutor};
