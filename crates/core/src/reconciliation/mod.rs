//! Matching bank transactions to drawdown line items and deriving each
//! line item's settlement status.

mod matcher;
mod reconciliation_errors;
mod reconciliation_model;
mod reconciliation_service;
mod reconciliation_traits;
mod reminders;


pub use matcher::*;
pub use reconciliation_errors::ReconciliationError;
pub use reconciliation_model::*;
pub use reconciliation_service::ReconciliationService;
pub use reconciliation_traits::*;
pub use reminders::*;
