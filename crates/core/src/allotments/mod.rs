//! Unit allotment against fully paid line items.

mod allotment_calculator;
mod allotments_errors;
mod allotments_model;
mod allotments_service;
mod allotments_traits;


pub use allotment_calculator::*;
pub use allotments_errors::AllotmentError;
pub use allotments_model::*;
pub use allotments_service::AllotmentService;
pub use allotments_traits::*;
