pub mod fiscal_quarter;
pub mod money;
pub mod time_utils;

pub use fiscal_quarter::FiscalQuarter;
