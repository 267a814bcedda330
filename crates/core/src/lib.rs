//! Fundflow Core - Domain entities, services, and traits for LP capital
//! settlement.
//!
//! This crate contains the settlement pipeline: capital calls, bank statement
//! ingestion, reconciliation, unit allotment and regulatory reporting. It is
//! database-agnostic and defines traits that are implemented by the
//! `storage-sqlite` crate.

pub mod allotments;
pub mod constants;
pub mod documents;
pub mod drawdowns;
pub mod errors;
pub mod events;
pub mod funds;
pub mod ledger;
pub mod locks;
pub mod reconciliation;
pub mod reports;
pub mod settings;
pub mod status;
pub mod transactions;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use utils::FiscalQuarter;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
