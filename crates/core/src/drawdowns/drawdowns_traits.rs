use async_trait::async_trait;

use crate::drawdowns::drawdowns_model::{
    Drawdown, DrawdownCalculation, DrawdownLineItem, DrawdownRequest, DrawdownSummary,
};
use crate::errors::Result;
use crate::status::StatusUpdate;
use crate::utils::FiscalQuarter;

/// Ledger access for drawdowns and their line items.
///
/// Drawdowns are never deleted. Line items change only through guarded status
/// updates and the expected payment reference.
#[async_trait]
pub trait DrawdownRepositoryTrait: Send + Sync {
    fn get_drawdown(&self, drawdown_id: &str) -> Result<Drawdown>;
    fn list_drawdowns(&self, fund_id: &str) -> Result<Vec<Drawdown>>;
    fn list_drawdowns_for_quarter(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
    ) -> Result<Vec<Drawdown>>;
    fn get_line_item(&self, line_item_id: &str) -> Result<DrawdownLineItem>;
    fn list_line_items(&self, drawdown_id: &str) -> Result<Vec<DrawdownLineItem>>;
    fn list_line_items_for_fund(&self, fund_id: &str) -> Result<Vec<DrawdownLineItem>>;

    /// Persists a drawdown and all its line items in one transaction.
    async fn insert_drawdown(
        &self,
        drawdown: Drawdown,
        line_items: Vec<DrawdownLineItem>,
    ) -> Result<()>;

    /// Applies all updates or none. Fails if any line item is no longer in
    /// its `from` status.
    async fn apply_status_updates(
        &self,
        updates: Vec<StatusUpdate>,
    ) -> Result<Vec<DrawdownLineItem>>;

    async fn set_expected_reference(
        &self,
        line_item_id: String,
        reference: Option<String>,
    ) -> Result<DrawdownLineItem>;
}

#[async_trait]
pub trait DrawdownServiceTrait: Send + Sync {
    /// Computes (and unless `preview` is set, issues) a capital call.
    async fn calculate_drawdown(&self, request: DrawdownRequest) -> Result<DrawdownCalculation>;
    fn get_drawdown_summary(&self, drawdown_id: &str) -> Result<DrawdownSummary>;
    fn list_drawdowns(&self, fund_id: &str) -> Result<Vec<Drawdown>>;
    async fn set_expected_reference(
        &self,
        line_item_id: &str,
        reference: Option<String>,
    ) -> Result<DrawdownLineItem>;
}
