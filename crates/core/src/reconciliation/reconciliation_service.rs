use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::matcher::{MatchCandidate, MatchOutcome, TransactionMatcher};
use super::reconciliation_model::*;
use super::reminders::{reminder_due_on, reminder_status};
use super::{PaymentRepositoryTrait, ReconciliationError, ReconciliationServiceTrait};
use crate::drawdowns::{live_drawdown_for_quarter, DrawdownLineItem, DrawdownRepositoryTrait};
use crate::errors::{Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};
use crate::funds::ProfileReaderTrait;
use crate::locks::QuarterLocks;
use crate::settings::SettingsServiceTrait;
use crate::status::{LineItemStatus, StatusUpdate};
use crate::transactions::{BankTransaction, TransactionError, TransactionRepositoryTrait};
use crate::utils::time_utils::days_between;
use crate::utils::FiscalQuarter;

/// Service for settling line items against bank credits
pub struct ReconciliationService {
    profile_reader: Arc<dyn ProfileReaderTrait>,
    drawdown_repository: Arc<dyn DrawdownRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    payment_repository: Arc<dyn PaymentRepositoryTrait>,
    settings_service: Arc<dyn SettingsServiceTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    locks: Arc<QuarterLocks>,
}

impl ReconciliationService {
    pub fn new(
        profile_reader: Arc<dyn ProfileReaderTrait>,
        drawdown_repository: Arc<dyn DrawdownRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        payment_repository: Arc<dyn PaymentRepositoryTrait>,
        settings_service: Arc<dyn SettingsServiceTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        locks: Arc<QuarterLocks>,
    ) -> Self {
        Self {
            profile_reader,
            drawdown_repository,
            transaction_repository,
            payment_repository,
            settings_service,
            event_sink,
            locks,
        }
    }

    fn lp_names(&self, fund_id: &str) -> Result<HashMap<String, String>> {
        Ok(self
            .profile_reader
            .list_limited_partners(fund_id)?
            .into_iter()
            .map(|lp| (lp.id, lp.display_name))
            .collect())
    }

    /// Line item that can still take money, re-read under the quarter lock.
    fn open_line_item(&self, line_item_id: &str) -> Result<DrawdownLineItem> {
        let item = self.drawdown_repository.get_line_item(line_item_id)?;
        if !item.status.accepts_payments() {
            return Err(ReconciliationError::SettlementClosed {
                line_item_id: item.id,
                status: item.status,
            }
            .into());
        }
        Ok(item)
    }

    fn binding_received(&self, line_item_id: &str) -> Result<Decimal> {
        let payments = self
            .payment_repository
            .list_payments_for_line_items(&[line_item_id.to_string()])?;
        Ok(received_amount(&payments))
    }

    async fn commit(&self, fund_id: &str, batch: SettlementBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let payment_ids: Vec<String> = batch
            .new_payments
            .iter()
            .map(|p| p.id.clone())
            .chain(batch.confirmations.iter().map(|c| c.payment_id.clone()))
            .collect();
        let mut line_item_ids: Vec<String> = batch
            .new_payments
            .iter()
            .map(|p| p.line_item_id.clone())
            .collect();
        line_item_ids.sort();
        line_item_ids.dedup();
        let status_updates = batch.status_updates.clone();

        self.payment_repository.apply_settlement(batch).await?;

        if !payment_ids.is_empty() {
            self.event_sink.emit(DomainEvent::payments_recorded(
                fund_id.to_string(),
                payment_ids,
                line_item_ids,
            ));
        }
        for update in status_updates {
            self.event_sink.emit(DomainEvent::line_item_status_changed(
                update.line_item_id,
                update.from,
                update.to,
            ));
        }
        Ok(())
    }
}

/// Moves a fully paid line item to Allotment Pending unless it is already there.
fn settlement_advance(item: &DrawdownLineItem, status: PaymentStatus) -> Option<StatusUpdate> {
    let target = LineItemStatus::AllotmentPending;
    let behind = matches!((item.status.rank(), target.rank()), (Some(from), Some(to)) if from < to);
    (status.is_fully_paid() && behind).then(|| StatusUpdate {
        line_item_id: item.id.clone(),
        from: item.status,
        to: target,
    })
}

fn new_payment(
    item: &DrawdownLineItem,
    txn: Option<&BankTransaction>,
    amount: Decimal,
    method: MatchMethod,
    status: PaymentStatus,
    paid_on: NaiveDate,
    note: Option<String>,
) -> Payment {
    Payment {
        id: Uuid::new_v4().to_string(),
        fund_id: item.fund_id.clone(),
        lp_id: item.lp_id.clone(),
        line_item_id: item.id.clone(),
        transaction_ids: txn.map(|t| vec![t.id.clone()]).unwrap_or_default(),
        expected_amount: item.amount_due,
        received_amount: amount,
        method,
        status,
        paid_on,
        note,
        matched_at: Utc::now().naive_utc(),
    }
}

#[async_trait]
impl ReconciliationServiceTrait for ReconciliationService {
    async fn reconcile(
        &self,
        fund_id: &str,
        quarter: FiscalQuarter,
        as_of: NaiveDate,
        override_window: bool,
    ) -> Result<ReconciliationResult> {
        let _guard = self.locks.acquire(fund_id, quarter).await;

        let no_outstanding = || ReconciliationError::NoOutstandingDrawdowns {
            fund_id: fund_id.to_string(),
            quarter: quarter.label(),
        };
        let (drawdown, items) =
            live_drawdown_for_quarter(self.drawdown_repository.as_ref(), fund_id, &quarter)?
                .ok_or_else(no_outstanding)?;
        let mut items: Vec<DrawdownLineItem> = items
            .into_iter()
            .filter(|i| !i.status.is_cancelled())
            .collect();
        if items.is_empty() {
            return Err(no_outstanding().into());
        }

        let settings = self.settings_service.get_settlement_settings(fund_id)?;
        let names = self.lp_names(fund_id)?;
        let item_ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
        let existing = self
            .payment_repository
            .list_payments_for_line_items(&item_ids)?;

        let mut received: HashMap<String, Decimal> = HashMap::new();
        for payment in existing.iter().filter(|p| p.is_binding()) {
            *received.entry(payment.line_item_id.clone()).or_default() += payment.received_amount;
        }

        let window_end = drawdown.due_date + Duration::days(i64::from(settings.reconciliation_window_days));
        let window_open = override_window || as_of <= window_end;

        let mut new_payments: Vec<Payment> = Vec::new();
        let mut review_queue: Vec<ReviewItem> = Vec::new();
        let mut unmatched: Vec<String> = Vec::new();

        if window_open {
            let mut linked: HashSet<String> = self
                .payment_repository
                .linked_transactions(fund_id)?
                .into_keys()
                .collect();
            let mut credits: Vec<BankTransaction> = self
                .transaction_repository
                .list_transactions(fund_id)?
                .into_iter()
                .filter(|t| {
                    t.is_credit()
                        && t.transaction_date >= drawdown.notice_date
                        && t.transaction_date <= as_of
                })
                .collect();
            credits.sort_by(|a, b| {
                (a.transaction_date, a.imported_at, &a.external_reference).cmp(&(
                    b.transaction_date,
                    b.imported_at,
                    &b.external_reference,
                ))
            });

            let matcher = TransactionMatcher::new(settings.match_tolerance);
            for txn in &credits {
                let outcome = {
                    let candidates: Vec<MatchCandidate<'_>> = items
                        .iter()
                        .filter(|i| i.status.accepts_payments())
                        .map(|i| MatchCandidate {
                            line_item: i,
                            lp_name: names.get(&i.lp_id).map(String::as_str).unwrap_or(""),
                            outstanding: i.amount_due
                                - received.get(&i.id).copied().unwrap_or_default(),
                        })
                        .collect();
                    matcher.match_transaction(txn, &candidates, &linked)
                };

                match outcome {
                    MatchOutcome::Matched {
                        line_item_id,
                        lp_id,
                        method,
                        binding,
                    } => {
                        let Some(item) = items.iter().find(|i| i.id == line_item_id) else {
                            continue;
                        };
                        let status = if binding {
                            let total = received.entry(line_item_id.clone()).or_default();
                            *total += txn.amount;
                            settlement_status(item.amount_due, *total)
                        } else {
                            PaymentStatus::PendingReview
                        };
                        let payment = new_payment(
                            item,
                            Some(txn),
                            txn.amount,
                            method,
                            status,
                            txn.transaction_date,
                            None,
                        );
                        debug!(
                            "Matched transaction {} to line item {} ({:?}, {})",
                            txn.external_reference, line_item_id, method, status
                        );
                        if !binding {
                            review_queue.push(ReviewItem {
                                transaction_id: txn.id.clone(),
                                external_reference: txn.external_reference.clone(),
                                amount: txn.amount,
                                narration: txn.narration.clone(),
                                reason: ReviewReason::Advisory {
                                    payment_id: payment.id.clone(),
                                    lp_id,
                                    line_item_id,
                                },
                            });
                        }
                        linked.insert(txn.id.clone());
                        new_payments.push(payment);
                    }
                    MatchOutcome::Ambiguous { lp_ids } => {
                        warn!(
                            "Transaction {} names several LPs ({}), queued for review",
                            txn.external_reference,
                            lp_ids.join(", ")
                        );
                        review_queue.push(ReviewItem {
                            transaction_id: txn.id.clone(),
                            external_reference: txn.external_reference.clone(),
                            amount: txn.amount,
                            narration: txn.narration.clone(),
                            reason: ReviewReason::Ambiguous { lp_ids },
                        });
                    }
                    MatchOutcome::NoMatch => unmatched.push(txn.id.clone()),
                    MatchOutcome::AlreadyLinked => {}
                }
            }
        } else {
            info!(
                "Reconciliation window for fund {} {} closed on {}; reporting without matching",
                fund_id, quarter, window_end
            );
        }

        let status_updates: Vec<StatusUpdate> = items
            .iter()
            .filter_map(|item| {
                let total = received.get(&item.id).copied().unwrap_or_default();
                settlement_advance(item, settlement_status(item.amount_due, total))
            })
            .collect();
        let new_payment_ids: Vec<String> = new_payments.iter().map(|p| p.id.clone()).collect();

        let mut all_payments = existing;
        all_payments.extend(new_payments.iter().cloned());

        self.commit(
            fund_id,
            SettlementBatch {
                new_payments,
                confirmations: Vec::new(),
                status_updates: status_updates.clone(),
            },
        )
        .await?;

        for update in &status_updates {
            if let Some(item) = items.iter_mut().find(|i| i.id == update.line_item_id) {
                item.status = update.to;
            }
        }

        let offsets = settings.reminder_offsets();
        let mut per_lp = Vec::with_capacity(items.len());
        for item in &items {
            let total = received.get(&item.id).copied().unwrap_or_default();
            let status = settlement_status(item.amount_due, total);
            let payments: Vec<&Payment> = all_payments
                .iter()
                .filter(|p| p.line_item_id == item.id)
                .collect();
            let settled_on = if status.is_fully_paid() {
                payments
                    .iter()
                    .filter(|p| p.is_binding())
                    .map(|p| p.paid_on)
                    .max()
            } else {
                None
            };
            per_lp.push(LpSettlement {
                line_item_id: item.id.clone(),
                lp_id: item.lp_id.clone(),
                lp_name: names.get(&item.lp_id).cloned().unwrap_or_default(),
                expected: item.amount_due,
                received: total,
                excess: (total - item.amount_due).max(Decimal::ZERO),
                status,
                line_item_status: item.status,
                payment_ids: payments.iter().map(|p| p.id.clone()).collect(),
                reminders: reminder_status(
                    drawdown.due_date,
                    as_of,
                    offsets,
                    settings.reconciliation_window_days,
                    settled_on,
                ),
            });
        }

        let total_expected: Decimal = per_lp.iter().map(|l| l.expected).sum();
        let total_received: Decimal = per_lp.iter().map(|l| l.received).sum();
        let overall_status = if per_lp.iter().all(|l| l.status.is_fully_paid()) {
            OverallStatus::Completed
        } else {
            OverallStatus::InProgress
        };

        info!(
            "Reconciled fund {} {}: {} new payments, {} for review, {} unmatched, {:?}",
            fund_id,
            quarter,
            new_payment_ids.len(),
            review_queue.len(),
            unmatched.len(),
            overall_status
        );

        Ok(ReconciliationResult {
            fund_id: fund_id.to_string(),
            quarter,
            drawdown_id: drawdown.id,
            as_of,
            window_open,
            per_lp,
            total_expected,
            total_received,
            overall_status,
            new_payment_ids,
            review_queue,
            unmatched_transaction_ids: unmatched,
        })
    }

    async fn record_manual_payment(&self, input: ManualPayment) -> Result<Payment> {
        if input.amount <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "payment amount must be positive, got {}",
                input.amount
            ))
            .into());
        }

        let item = self.drawdown_repository.get_line_item(&input.line_item_id)?;
        let _guard = self.locks.acquire(&item.fund_id, item.quarter).await;
        let item = self.open_line_item(&input.line_item_id)?;

        let txn = match input.transaction_id.as_deref() {
            Some(transaction_id) => {
                let txn = self.transaction_repository.get_transaction(transaction_id)?;
                if txn.fund_id != item.fund_id {
                    return Err(TransactionError::ForeignTransaction {
                        transaction_id: txn.id,
                        fund_id: item.fund_id,
                    }
                    .into());
                }
                let linked = self.payment_repository.linked_transactions(&item.fund_id)?;
                if let Some(payment_id) = linked.get(&txn.id) {
                    return Err(TransactionError::AlreadyLinked {
                        transaction_id: txn.id,
                        payment_id: payment_id.clone(),
                    }
                    .into());
                }
                Some(txn)
            }
            None => None,
        };

        let total = self.binding_received(&item.id)? + input.amount;
        let status = settlement_status(item.amount_due, total);
        let payment = new_payment(
            &item,
            txn.as_ref(),
            input.amount,
            MatchMethod::Manual,
            status,
            input.paid_on,
            input.note,
        );

        info!(
            "Recording manual payment of {} for line item {} ({})",
            input.amount, item.id, status
        );
        self.commit(
            &item.fund_id,
            SettlementBatch {
                new_payments: vec![payment.clone()],
                confirmations: Vec::new(),
                status_updates: settlement_advance(&item, status).into_iter().collect(),
            },
        )
        .await?;

        Ok(payment)
    }

    async fn confirm_payment(&self, payment_id: &str) -> Result<Payment> {
        let payment = self.payment_repository.get_payment(payment_id)?;
        let item = self.drawdown_repository.get_line_item(&payment.line_item_id)?;
        let _guard = self.locks.acquire(&item.fund_id, item.quarter).await;

        let payment = self.payment_repository.get_payment(payment_id)?;
        if payment.status != PaymentStatus::PendingReview {
            return Err(ReconciliationError::PaymentNotReviewable {
                payment_id: payment.id,
                status: payment.status,
            }
            .into());
        }
        let item = self.open_line_item(&payment.line_item_id)?;

        let total = self.binding_received(&item.id)? + payment.received_amount;
        let status = settlement_status(item.amount_due, total);

        info!(
            "Confirming payment {} for line item {} ({})",
            payment.id, item.id, status
        );
        self.commit(
            &item.fund_id,
            SettlementBatch {
                new_payments: Vec::new(),
                confirmations: vec![PaymentConfirmation {
                    payment_id: payment.id.clone(),
                    method: MatchMethod::Manual,
                    status,
                }],
                status_updates: settlement_advance(&item, status).into_iter().collect(),
            },
        )
        .await?;

        Ok(Payment {
            method: MatchMethod::Manual,
            status,
            ..payment
        })
    }

    fn reminder_sweep(&self, as_of: NaiveDate) -> Result<Vec<ReminderNotice>> {
        let mut notices = Vec::new();

        for fund in self.profile_reader.list_funds()? {
            let settings = self.settings_service.get_settlement_settings(&fund.id)?;
            let offsets = settings.reminder_offsets();
            let drawdowns: HashMap<String, NaiveDate> = self
                .drawdown_repository
                .list_drawdowns(&fund.id)?
                .into_iter()
                .map(|d| (d.id, d.due_date))
                .collect();

            let mut received: HashMap<String, Decimal> = HashMap::new();
            for payment in self
                .payment_repository
                .list_payments_for_fund(&fund.id)?
                .iter()
                .filter(|p| p.is_binding())
            {
                *received.entry(payment.line_item_id.clone()).or_default() +=
                    payment.received_amount;
            }

            for item in self.drawdown_repository.list_line_items_for_fund(&fund.id)? {
                if !item.status.accepts_payments() {
                    continue;
                }
                let total = received.get(&item.id).copied().unwrap_or_default();
                if settlement_status(item.amount_due, total).is_fully_paid() {
                    continue;
                }
                let Some(&due_date) = drawdowns.get(&item.drawdown_id) else {
                    warn!(
                        "Line item {} refers to unknown drawdown {}",
                        item.id, item.drawdown_id
                    );
                    continue;
                };
                if days_between(due_date, as_of) > i64::from(settings.reconciliation_window_days) {
                    continue;
                }
                if let Some((reminder_number, day_offset)) =
                    reminder_due_on(due_date, as_of, offsets)
                {
                    notices.push(ReminderNotice {
                        fund_id: fund.id.clone(),
                        drawdown_id: item.drawdown_id.clone(),
                        line_item_id: item.id.clone(),
                        lp_id: item.lp_id.clone(),
                        due_date,
                        reminder_number,
                        day_offset,
                    });
                }
            }
        }

        for notice in &notices {
            self.event_sink.emit(DomainEvent::reminder_due(
                notice.fund_id.clone(),
                notice.line_item_id.clone(),
                notice.lp_id.clone(),
                notice.due_date,
                notice.reminder_number,
                notice.day_offset,
            ));
        }
        info!("Reminder sweep for {}: {} reminders due", as_of, notices.len());

        Ok(notices)
    }

    fn list_payments(&self, fund_id: &str) -> Result<Vec<Payment>> {
        self.payment_repository.list_payments_for_fund(fund_id)
    }
}
