//! In-memory ledger implementing every repository trait.
//!
//! Enforces the same rules as the SQLite store: unique transaction references
//! per fund, one payment per transaction, guarded status updates, unique
//! report versions and append-only allotments. Used by tests and by
//! embedders that do not need persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::allotments::{Allotment, AllotmentRepositoryTrait, AllotmentReversal};
use crate::drawdowns::{Drawdown, DrawdownLineItem, DrawdownRepositoryTrait};
use crate::errors::{DatabaseError, Error, Result};
use crate::funds::{Fund, LimitedPartner, PortfolioInvestment, ProfileReaderTrait};
use crate::reconciliation::{Payment, PaymentRepositoryTrait, SettlementBatch};
use crate::reports::{ReportKind, ReportRepositoryTrait, ReportSnapshot, ReportStatus};
use crate::settings::SettingsRepositoryTrait;
use crate::status::{StatusError, StatusUpdate};
use crate::transactions::{BankTransaction, InsertOutcome, TransactionRepositoryTrait};
use crate::utils::FiscalQuarter;

#[derive(Default)]
struct LedgerState {
    funds: BTreeMap<String, Fund>,
    limited_partners: BTreeMap<String, LimitedPartner>,
    investments: Vec<PortfolioInvestment>,
    drawdowns: Vec<Drawdown>,
    line_items: Vec<DrawdownLineItem>,
    transactions: Vec<BankTransaction>,
    payments: Vec<Payment>,
    /// Transaction id to payment id.
    payment_links: HashMap<String, String>,
    allotments: Vec<Allotment>,
    reversals: Vec<AllotmentReversal>,
    reports: Vec<ReportSnapshot>,
    settings: HashMap<String, String>,
}

impl LedgerState {
    /// Checks every update against the current statuses, then applies all.
    fn apply_status_updates(&mut self, updates: &[StatusUpdate]) -> Result<Vec<DrawdownLineItem>> {
        for update in updates {
            let item = self
                .line_items
                .iter()
                .find(|i| i.id == update.line_item_id)
                .ok_or_else(|| not_found("line item", &update.line_item_id))?;
            if item.status != update.from {
                return Err(StatusError::StaleStatus {
                    line_item_id: item.id.clone(),
                    expected: update.from,
                    actual: item.status,
                }
                .into());
            }
            item.status.check_transition(update.to, &item.id)?;
        }

        let now = Utc::now().naive_utc();
        let mut changed = Vec::with_capacity(updates.len());
        for update in updates {
            if let Some(item) = self
                .line_items
                .iter_mut()
                .find(|i| i.id == update.line_item_id)
            {
                item.status = update.to;
                item.updated_at = now;
                changed.push(item.clone());
            }
        }
        Ok(changed)
    }
}

fn not_found(entity: &str, id: &str) -> Error {
    DatabaseError::NotFound(format!("{} {}", entity, id)).into()
}

#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|e| DatabaseError::Internal(format!("ledger lock poisoned: {}", e)).into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|e| DatabaseError::Internal(format!("ledger lock poisoned: {}", e)).into())
    }

    pub fn upsert_fund(&self, fund: Fund) -> Result<()> {
        self.write()?.funds.insert(fund.id.clone(), fund);
        Ok(())
    }

    pub fn upsert_limited_partner(&self, lp: LimitedPartner) -> Result<()> {
        self.write()?.limited_partners.insert(lp.id.clone(), lp);
        Ok(())
    }

    pub fn add_portfolio_investment(&self, investment: PortfolioInvestment) -> Result<()> {
        self.write()?.investments.push(investment);
        Ok(())
    }
}

impl ProfileReaderTrait for InMemoryLedger {
    fn list_funds(&self) -> Result<Vec<Fund>> {
        Ok(self.read()?.funds.values().cloned().collect())
    }

    fn get_fund(&self, fund_id: &str) -> Result<Fund> {
        self.read()?
            .funds
            .get(fund_id)
            .cloned()
            .ok_or_else(|| not_found("fund", fund_id))
    }

    fn list_limited_partners(&self, fund_id: &str) -> Result<Vec<LimitedPartner>> {
        Ok(self
            .read()?
            .limited_partners
            .values()
            .filter(|lp| lp.fund_id == fund_id)
            .cloned()
            .collect())
    }

    fn get_limited_partner(&self, lp_id: &str) -> Result<LimitedPartner> {
        self.read()?
            .limited_partners
            .get(lp_id)
            .cloned()
            .ok_or_else(|| not_found("limited partner", lp_id))
    }

    fn list_portfolio_investments(&self, fund_id: &str) -> Result<Vec<PortfolioInvestment>> {
        Ok(self
            .read()?
            .investments
            .iter()
            .filter(|p| p.fund_id == fund_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DrawdownRepositoryTrait for InMemoryLedger {
    fn get_drawdown(&self, drawdown_id: &str) -> Result<Drawdown> {
        self.read()?
            .drawdowns
            .iter()
            .find(|d| d.id == drawdown_id)
            .cloned()
            .ok_or_else(|| not_found("drawdown", drawdown_id))
    }

    fn list_drawdowns(&self, fund_id: &str) -> Result<Vec<Drawdown>> {
        let mut drawdowns: Vec<Drawdown> = self
            .read()?
            .drawdowns
            .iter()
            .filter(|d| d.fund_id == fund_id)
            .cloned()
            .collect();
        drawdowns.sort_by(|a, b| (a.quarter, a.created_at).cmp(&(b.quarter, b.created_at)));
        Ok(drawdowns)
    }

    fn list_drawdowns_for_quarter(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
    ) -> Result<Vec<Drawdown>> {
        Ok(self
            .list_drawdowns(fund_id)?
            .into_iter()
            .filter(|d| d.quarter == *quarter)
            .collect())
    }

    fn get_line_item(&self, line_item_id: &str) -> Result<DrawdownLineItem> {
        self.read()?
            .line_items
            .iter()
            .find(|i| i.id == line_item_id)
            .cloned()
            .ok_or_else(|| not_found("line item", line_item_id))
    }

    fn list_line_items(&self, drawdown_id: &str) -> Result<Vec<DrawdownLineItem>> {
        let mut items: Vec<DrawdownLineItem> = self
            .read()?
            .line_items
            .iter()
            .filter(|i| i.drawdown_id == drawdown_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.lp_id.cmp(&b.lp_id));
        Ok(items)
    }

    fn list_line_items_for_fund(&self, fund_id: &str) -> Result<Vec<DrawdownLineItem>> {
        let mut items: Vec<DrawdownLineItem> = self
            .read()?
            .line_items
            .iter()
            .filter(|i| i.fund_id == fund_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| (a.quarter, &a.lp_id).cmp(&(b.quarter, &b.lp_id)));
        Ok(items)
    }

    async fn insert_drawdown(
        &self,
        drawdown: Drawdown,
        line_items: Vec<DrawdownLineItem>,
    ) -> Result<()> {
        let mut state = self.write()?;
        if state.drawdowns.iter().any(|d| d.id == drawdown.id) {
            return Err(DatabaseError::UniqueViolation(format!("drawdown {}", drawdown.id)).into());
        }
        state.drawdowns.push(drawdown);
        state.line_items.extend(line_items);
        Ok(())
    }

    async fn apply_status_updates(
        &self,
        updates: Vec<StatusUpdate>,
    ) -> Result<Vec<DrawdownLineItem>> {
        self.write()?.apply_status_updates(&updates)
    }

    async fn set_expected_reference(
        &self,
        line_item_id: String,
        reference: Option<String>,
    ) -> Result<DrawdownLineItem> {
        let mut state = self.write()?;
        let item = state
            .line_items
            .iter_mut()
            .find(|i| i.id == line_item_id)
            .ok_or_else(|| not_found("line item", &line_item_id))?;
        item.expected_reference = reference;
        item.updated_at = Utc::now().naive_utc();
        Ok(item.clone())
    }
}

#[async_trait]
impl TransactionRepositoryTrait for InMemoryLedger {
    fn get_transaction(&self, transaction_id: &str) -> Result<BankTransaction> {
        self.read()?
            .transactions
            .iter()
            .find(|t| t.id == transaction_id)
            .cloned()
            .ok_or_else(|| not_found("transaction", transaction_id))
    }

    fn list_transactions(&self, fund_id: &str) -> Result<Vec<BankTransaction>> {
        let mut transactions: Vec<BankTransaction> = self
            .read()?
            .transactions
            .iter()
            .filter(|t| t.fund_id == fund_id)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| {
            (a.transaction_date, a.imported_at, &a.external_reference).cmp(&(
                b.transaction_date,
                b.imported_at,
                &b.external_reference,
            ))
        });
        Ok(transactions)
    }

    async fn insert_transactions(
        &self,
        transactions: Vec<BankTransaction>,
    ) -> Result<Vec<InsertOutcome>> {
        let mut state = self.write()?;
        let mut outcomes = Vec::with_capacity(transactions.len());
        for txn in transactions {
            let exists = state.transactions.iter().any(|t| {
                t.fund_id == txn.fund_id && t.external_reference == txn.external_reference
            });
            if exists {
                outcomes.push(InsertOutcome::Duplicate);
            } else {
                state.transactions.push(txn);
                outcomes.push(InsertOutcome::Inserted);
            }
        }
        Ok(outcomes)
    }
}

#[async_trait]
impl PaymentRepositoryTrait for InMemoryLedger {
    fn get_payment(&self, payment_id: &str) -> Result<Payment> {
        self.read()?
            .payments
            .iter()
            .find(|p| p.id == payment_id)
            .cloned()
            .ok_or_else(|| not_found("payment", payment_id))
    }

    fn list_payments_for_fund(&self, fund_id: &str) -> Result<Vec<Payment>> {
        Ok(self
            .read()?
            .payments
            .iter()
            .filter(|p| p.fund_id == fund_id)
            .cloned()
            .collect())
    }

    fn list_payments_for_line_items(&self, line_item_ids: &[String]) -> Result<Vec<Payment>> {
        Ok(self
            .read()?
            .payments
            .iter()
            .filter(|p| line_item_ids.contains(&p.line_item_id))
            .cloned()
            .collect())
    }

    fn linked_transactions(&self, fund_id: &str) -> Result<HashMap<String, String>> {
        let state = self.read()?;
        Ok(state
            .payments
            .iter()
            .filter(|p| p.fund_id == fund_id)
            .flat_map(|p| p.transaction_ids.iter().map(move |t| (t.clone(), p.id.clone())))
            .collect())
    }

    async fn apply_settlement(&self, batch: SettlementBatch) -> Result<Vec<DrawdownLineItem>> {
        let mut state = self.write()?;

        for payment in &batch.new_payments {
            for txn_id in &payment.transaction_ids {
                if let Some(existing) = state.payment_links.get(txn_id) {
                    return Err(DatabaseError::UniqueViolation(format!(
                        "transaction {} already backs payment {}",
                        txn_id, existing
                    ))
                    .into());
                }
            }
        }
        for confirmation in &batch.confirmations {
            if !state.payments.iter().any(|p| p.id == confirmation.payment_id) {
                return Err(not_found("payment", &confirmation.payment_id));
            }
        }

        let changed = state.apply_status_updates(&batch.status_updates)?;

        for payment in batch.new_payments {
            for txn_id in &payment.transaction_ids {
                state.payment_links.insert(txn_id.clone(), payment.id.clone());
            }
            state.payments.push(payment);
        }
        for confirmation in batch.confirmations {
            if let Some(payment) = state
                .payments
                .iter_mut()
                .find(|p| p.id == confirmation.payment_id)
            {
                payment.method = confirmation.method;
                payment.status = confirmation.status;
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl AllotmentRepositoryTrait for InMemoryLedger {
    fn get_allotment(&self, allotment_id: &str) -> Result<Allotment> {
        self.read()?
            .allotments
            .iter()
            .find(|a| a.id == allotment_id)
            .cloned()
            .ok_or_else(|| not_found("allotment", allotment_id))
    }

    fn list_allotments(&self, fund_id: &str) -> Result<Vec<Allotment>> {
        Ok(self
            .read()?
            .allotments
            .iter()
            .filter(|a| a.fund_id == fund_id)
            .cloned()
            .collect())
    }

    fn list_allotments_for_quarter(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
    ) -> Result<Vec<Allotment>> {
        Ok(self
            .list_allotments(fund_id)?
            .into_iter()
            .filter(|a| a.quarter == *quarter)
            .collect())
    }

    fn list_reversals(&self, fund_id: &str) -> Result<Vec<AllotmentReversal>> {
        let state = self.read()?;
        Ok(state
            .reversals
            .iter()
            .filter(|r| {
                state
                    .allotments
                    .iter()
                    .any(|a| a.id == r.allotment_id && a.fund_id == fund_id)
            })
            .cloned()
            .collect())
    }

    fn get_reversal_for(&self, allotment_id: &str) -> Result<Option<AllotmentReversal>> {
        Ok(self
            .read()?
            .reversals
            .iter()
            .find(|r| r.allotment_id == allotment_id)
            .cloned())
    }

    async fn issue_allotments(
        &self,
        allotments: Vec<Allotment>,
        status_updates: Vec<StatusUpdate>,
    ) -> Result<Vec<Allotment>> {
        let mut state = self.write()?;
        state.apply_status_updates(&status_updates)?;
        state.allotments.extend(allotments.iter().cloned());
        Ok(allotments)
    }

    async fn reverse_and_reissue(
        &self,
        reversal: AllotmentReversal,
        replacement: Allotment,
    ) -> Result<Allotment> {
        let mut state = self.write()?;
        if state
            .reversals
            .iter()
            .any(|r| r.allotment_id == reversal.allotment_id)
        {
            return Err(DatabaseError::UniqueViolation(format!(
                "allotment {} already reversed",
                reversal.allotment_id
            ))
            .into());
        }
        state.allotments.push(replacement.clone());
        state.reversals.push(reversal);
        Ok(replacement)
    }
}

#[async_trait]
impl ReportRepositoryTrait for InMemoryLedger {
    fn get_snapshot(&self, snapshot_id: &str) -> Result<ReportSnapshot> {
        self.read()?
            .reports
            .iter()
            .find(|r| r.id == snapshot_id)
            .cloned()
            .ok_or_else(|| not_found("report", snapshot_id))
    }

    fn list_snapshots(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
    ) -> Result<Vec<ReportSnapshot>> {
        let mut snapshots: Vec<ReportSnapshot> = self
            .read()?
            .reports
            .iter()
            .filter(|r| r.fund_id == fund_id && r.quarter == *quarter)
            .cloned()
            .collect();
        snapshots.sort_by(|a, b| (a.kind, a.version).cmp(&(b.kind, b.version)));
        Ok(snapshots)
    }

    fn latest_version(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
        kind: ReportKind,
    ) -> Result<Option<i32>> {
        Ok(self
            .read()?
            .reports
            .iter()
            .filter(|r| r.fund_id == fund_id && r.quarter == *quarter && r.kind == kind)
            .map(|r| r.version)
            .max())
    }

    async fn insert_snapshot(&self, snapshot: ReportSnapshot) -> Result<ReportSnapshot> {
        let mut state = self.write()?;
        let clash = state.reports.iter().any(|r| {
            r.fund_id == snapshot.fund_id
                && r.quarter == snapshot.quarter
                && r.kind == snapshot.kind
                && r.version == snapshot.version
        });
        if clash {
            return Err(DatabaseError::UniqueViolation(format!(
                "{} report v{} for {} {}",
                snapshot.kind, snapshot.version, snapshot.fund_id, snapshot.quarter
            ))
            .into());
        }
        state.reports.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn update_status(
        &self,
        snapshot_id: String,
        from: ReportStatus,
        to: ReportStatus,
        line_item_updates: Vec<StatusUpdate>,
    ) -> Result<ReportSnapshot> {
        let mut state = self.write()?;
        let current = state
            .reports
            .iter()
            .find(|r| r.id == snapshot_id)
            .ok_or_else(|| not_found("report", &snapshot_id))?;
        if current.status != from {
            return Err(Error::ConstraintViolation(format!(
                "report {} is {}, expected {}",
                snapshot_id, current.status, from
            )));
        }

        state.apply_status_updates(&line_item_updates)?;

        let now = Utc::now().naive_utc();
        let report = state
            .reports
            .iter_mut()
            .find(|r| r.id == snapshot_id)
            .ok_or_else(|| not_found("report", &snapshot_id))?;
        report.status = to;
        report.status_updated_at = now;
        Ok(report.clone())
    }
}

#[async_trait]
impl SettingsRepositoryTrait for InMemoryLedger {
    fn get_setting(&self, setting_key: &str) -> Result<String> {
        self.read()?
            .settings
            .get(setting_key)
            .cloned()
            .ok_or_else(|| not_found("setting", setting_key))
    }

    async fn update_setting(&self, setting_key: &str, setting_value: &str) -> Result<()> {
        self.write()?
            .settings
            .insert(setting_key.to_string(), setting_value.to_string());
        Ok(())
    }
}
