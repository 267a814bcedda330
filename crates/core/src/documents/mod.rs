//! Document rendering interface. Runtimes render allotment sheets and report
//! payloads after the core has computed them.

mod documents_model;
mod documents_traits;

pub use documents_model::*;
pub use documents_traits::*;
