//! Line-item lifecycle: statuses, allowed transitions and the drawdown rollup.

mod status_errors;
mod status_model;
mod status_service;


pub use status_errors::StatusError;
pub use status_model::*;
pub use status_service::{StatusService, StatusServiceTrait};
