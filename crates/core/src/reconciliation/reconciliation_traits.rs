use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::reconciliation_model::{
    ManualPayment, Payment, ReconciliationResult, ReminderNotice, SettlementBatch,
};
use crate::drawdowns::DrawdownLineItem;
use crate::errors::Result;
use crate::utils::FiscalQuarter;

/// Ledger access for payments.
#[async_trait]
pub trait PaymentRepositoryTrait: Send + Sync {
    fn get_payment(&self, payment_id: &str) -> Result<Payment>;
    fn list_payments_for_fund(&self, fund_id: &str) -> Result<Vec<Payment>>;
    fn list_payments_for_line_items(&self, line_item_ids: &[String]) -> Result<Vec<Payment>>;

    /// Transaction id to the payment it backs, for every linked transaction of the fund.
    fn linked_transactions(&self, fund_id: &str) -> Result<HashMap<String, String>>;

    /// Writes new payments, confirmations and line item status changes in one
    /// transaction. Returns the line items whose status changed.
    async fn apply_settlement(&self, batch: SettlementBatch) -> Result<Vec<DrawdownLineItem>>;
}

#[async_trait]
pub trait ReconciliationServiceTrait: Send + Sync {
    /// Matches unlinked credits to the quarter's line items and reports
    /// per-LP settlement as of `as_of`.
    async fn reconcile(
        &self,
        fund_id: &str,
        quarter: FiscalQuarter,
        as_of: NaiveDate,
        override_window: bool,
    ) -> Result<ReconciliationResult>;

    async fn record_manual_payment(&self, payment: ManualPayment) -> Result<Payment>;

    /// Promotes an advisory candidate to a binding payment.
    async fn confirm_payment(&self, payment_id: &str) -> Result<Payment>;

    /// Reminders falling due on `as_of` across every fund. Emits one
    /// `ReminderDue` event per notice.
    fn reminder_sweep(&self, as_of: NaiveDate) -> Result<Vec<ReminderNotice>>;

    fn list_payments(&self, fund_id: &str) -> Result<Vec<Payment>>;
}
