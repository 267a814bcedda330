//! SEBI and inVi quarterly reports, aggregated from the ledger into
//! immutable, versioned snapshots.

mod report_aggregator;
mod reports_errors;
mod reports_model;
mod reports_service;
mod reports_traits;

#[cfg(test)]
mod reports_service_tests;

pub use report_aggregator::*;
pub use reports_errors::ReportError;
pub use reports_model::*;
pub use reports_service::ReportService;
pub use reports_traits::*;
