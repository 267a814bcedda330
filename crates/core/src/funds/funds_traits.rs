use crate::errors::Result;
use crate::funds::funds_model::{Fund, LimitedPartner, PortfolioInvestment};

/// Read-only source of fund and LP profile data.
///
/// Profiles are maintained outside the settlement pipeline; the pipeline only
/// reads them and copies what it needs into its own records.
pub trait ProfileReaderTrait: Send + Sync {
    fn list_funds(&self) -> Result<Vec<Fund>>;
    fn get_fund(&self, fund_id: &str) -> Result<Fund>;
    fn list_limited_partners(&self, fund_id: &str) -> Result<Vec<LimitedPartner>>;
    fn get_limited_partner(&self, lp_id: &str) -> Result<LimitedPartner>;
    fn list_portfolio_investments(&self, fund_id: &str) -> Result<Vec<PortfolioInvestment>>;
}
