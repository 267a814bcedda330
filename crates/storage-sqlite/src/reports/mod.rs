//! SQLite storage for versioned report snapshots.

mod model;
mod repository;

pub use model::ReportSnapshotDB;
pub use repository::ReportRepository;

pub use fundflow_core::reports::ReportRepositoryTrait;
