//! Capital calls: per-LP amounts, fees and stamp duty for a quarter.

mod drawdown_calculator;
mod drawdowns_errors;
mod drawdowns_model;
mod drawdowns_service;
mod drawdowns_traits;

#[cfg(test)]
mod drawdowns_service_tests;

pub use drawdown_calculator::*;
pub use drawdowns_errors::DrawdownError;
pub use drawdowns_model::*;
pub use drawdowns_service::{live_drawdown_for_quarter, DrawdownService};
pub use drawdowns_traits::*;
