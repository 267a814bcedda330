//! Domain events module.
//!
//! Provides domain event types and the sink trait for emitting events after
//! successful ledger writes. Runtime adapters implement the sink to turn
//! events into audit records, notifications and rendering jobs.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
