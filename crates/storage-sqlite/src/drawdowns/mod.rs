//! SQLite storage for drawdowns and their line items.

mod model;
mod repository;

pub use model::{DrawdownDB, DrawdownLineItemDB};
pub use repository::DrawdownRepository;
pub(crate) use repository::apply_status_updates;

pub use fundflow_core::drawdowns::DrawdownRepositoryTrait;
