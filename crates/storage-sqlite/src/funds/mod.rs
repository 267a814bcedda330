//! SQLite storage for fund and LP profiles.

mod model;
mod repository;

pub use model::{FundDB, LimitedPartnerDB, PortfolioInvestmentDB};
pub use repository::ProfileRepository;

pub use fundflow_core::funds::ProfileReaderTrait;
