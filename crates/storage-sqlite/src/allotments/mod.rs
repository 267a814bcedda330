//! SQLite storage for unit allotments and their reversals.

mod model;
mod repository;

pub use model::{AllotmentDB, AllotmentReversalDB};
pub use repository::AllotmentRepository;

pub use fundflow_core::allotments::AllotmentRepositoryTrait;
