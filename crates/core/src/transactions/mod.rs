//! Bank statement ingestion. Transactions are append-only and unique per
//! (fund, external reference).

mod transactions_errors;
mod transactions_model;
mod transactions_service;
mod transactions_traits;


pub use transactions_errors::TransactionError;
pub use transactions_model::*;
pub use transactions_service::TransactionService;
pub use transactions_traits::*;
