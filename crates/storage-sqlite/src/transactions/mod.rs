//! SQLite storage for imported bank statement lines.

mod model;
mod repository;

pub use model::BankTransactionDB;
pub use repository::TransactionRepository;

pub use fundflow_core::transactions::TransactionRepositoryTrait;
