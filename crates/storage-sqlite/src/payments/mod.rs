//! SQLite storage for reconciled payments and their transaction links.

mod model;
mod repository;

pub use model::{PaymentDB, PaymentTransactionDB};
pub use repository::PaymentRepository;

pub use fundflow_core::reconciliation::PaymentRepositoryTrait;
