use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::allotment_calculator::allotment_figures;
use super::allotments_model::*;
use super::{AllotmentError, AllotmentRepositoryTrait, AllotmentServiceTrait};
use crate::drawdowns::{live_drawdown_for_quarter, DrawdownLineItem, DrawdownRepositoryTrait};
use crate::errors::{Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};
use crate::funds::{LimitedPartner, ProfileReaderTrait};
use crate::locks::QuarterLocks;
use crate::reconciliation::{settlement_status, PaymentRepositoryTrait, Payment};
use crate::settings::SettingsServiceTrait;
use crate::status::{LineItemStatus, StatusUpdate};
use crate::utils::FiscalQuarter;

/// Service for issuing fund units against confirmed payments
pub struct AllotmentService {
    profile_reader: Arc<dyn ProfileReaderTrait>,
    drawdown_repository: Arc<dyn DrawdownRepositoryTrait>,
    payment_repository: Arc<dyn PaymentRepositoryTrait>,
    allotment_repository: Arc<dyn AllotmentRepositoryTrait>,
    settings_service: Arc<dyn SettingsServiceTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    locks: Arc<QuarterLocks>,
}

impl AllotmentService {
    pub fn new(
        profile_reader: Arc<dyn ProfileReaderTrait>,
        drawdown_repository: Arc<dyn DrawdownRepositoryTrait>,
        payment_repository: Arc<dyn PaymentRepositoryTrait>,
        allotment_repository: Arc<dyn AllotmentRepositoryTrait>,
        settings_service: Arc<dyn SettingsServiceTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        locks: Arc<QuarterLocks>,
    ) -> Self {
        Self {
            profile_reader,
            drawdown_repository,
            payment_repository,
            allotment_repository,
            settings_service,
            event_sink,
            locks,
        }
    }

    /// Picks the line items to allot. Explicit requests are checked item by
    /// item; otherwise every fully paid, not yet allotted item is taken.
    fn select_line_items<'a>(
        &self,
        request: &AllotmentRequest,
        items: &'a [DrawdownLineItem],
        received: &HashMap<String, Decimal>,
    ) -> Result<Vec<&'a DrawdownLineItem>> {
        let fully_paid = |item: &DrawdownLineItem| {
            let total = received.get(&item.id).copied().unwrap_or_default();
            settlement_status(item.amount_due, total).is_fully_paid()
        };

        let Some(requested) = request.line_item_ids.as_ref() else {
            let selected: Vec<&DrawdownLineItem> = items
                .iter()
                .filter(|i| i.status.accepts_payments() && fully_paid(i))
                .collect();
            let skipped = items
                .iter()
                .filter(|i| i.status.accepts_payments() && !fully_paid(i))
                .count();
            if skipped > 0 {
                debug!(
                    "Leaving {} line items of fund {} {} unallotted until paid",
                    skipped, request.fund_id, request.quarter
                );
            }
            return Ok(selected);
        };

        let requested: HashSet<&str> = requested.iter().map(String::as_str).collect();
        let known: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
        let mut unknown: Vec<String> = requested
            .iter()
            .filter(|id| !known.contains(*id))
            .map(|id| id.to_string())
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(ValidationError::InvalidInput(format!(
                "line items not part of the {} drawdown: {}",
                request.quarter,
                unknown.join(", ")
            ))
            .into());
        }

        let chosen: Vec<&DrawdownLineItem> = items
            .iter()
            .filter(|i| requested.contains(i.id.as_str()))
            .collect();

        let allotted: Vec<String> = chosen
            .iter()
            .filter(|i| i.status.is_allotted())
            .map(|i| i.id.clone())
            .collect();
        if !allotted.is_empty() {
            return Err(AllotmentError::AlreadyAllotted {
                line_item_ids: allotted,
            }
            .into());
        }

        let unpaid: Vec<String> = chosen
            .iter()
            .filter(|i| i.status.is_cancelled() || !fully_paid(i))
            .map(|i| i.id.clone())
            .collect();
        if !unpaid.is_empty() {
            return Err(AllotmentError::PaymentNotConfirmed {
                line_item_ids: unpaid,
            }
            .into());
        }

        Ok(chosen)
    }
}

fn received_by_line_item(payments: &[Payment]) -> HashMap<String, Decimal> {
    let mut received: HashMap<String, Decimal> = HashMap::new();
    for payment in payments.iter().filter(|p| p.is_binding()) {
        *received.entry(payment.line_item_id.clone()).or_default() += payment.received_amount;
    }
    received
}

#[async_trait]
impl AllotmentServiceTrait for AllotmentService {
    async fn allot_units(&self, request: AllotmentRequest) -> Result<AllotmentBatch> {
        let _guard = self.locks.acquire(&request.fund_id, request.quarter).await;

        let no_paid = || AllotmentError::NoPaidLineItems {
            fund_id: request.fund_id.clone(),
            quarter: request.quarter.label(),
        };

        let fund = self.profile_reader.get_fund(&request.fund_id)?;
        let settings = self
            .settings_service
            .get_settlement_settings(&request.fund_id)?;
        let (_, items) = live_drawdown_for_quarter(
            self.drawdown_repository.as_ref(),
            &request.fund_id,
            &request.quarter,
        )?
        .ok_or_else(no_paid)?;

        let item_ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
        let payments = self
            .payment_repository
            .list_payments_for_line_items(&item_ids)?;
        let received = received_by_line_item(&payments);

        let selected = self.select_line_items(&request, &items, &received)?;
        if selected.is_empty() {
            return Err(no_paid().into());
        }

        let lps: HashMap<String, LimitedPartner> = self
            .profile_reader
            .list_limited_partners(&request.fund_id)?
            .into_iter()
            .map(|lp| (lp.id.clone(), lp))
            .collect();
        let missing: Vec<String> = selected
            .iter()
            .filter(|i| !lps.contains_key(&i.lp_id))
            .map(|i| i.lp_id.clone())
            .collect();
        if !missing.is_empty() {
            return Err(AllotmentError::DataIntegrity {
                message: format!("LP profiles not found: {}", missing.join(", ")),
                entity_ids: missing,
            }
            .into());
        }

        let now = Utc::now().naive_utc();
        let mut allotments = Vec::with_capacity(selected.len());
        let mut status_updates = Vec::with_capacity(selected.len());
        for item in selected {
            let Some(lp) = lps.get(&item.lp_id) else {
                continue;
            };
            let total = received.get(&item.id).copied().unwrap_or_default();
            let figures = allotment_figures(
                &item.id,
                total,
                item.amount_due,
                fund.nav,
                settings.overpayment_policy,
            )?;

            allotments.push(Allotment {
                id: Uuid::new_v4().to_string(),
                fund_id: item.fund_id.clone(),
                drawdown_id: item.drawdown_id.clone(),
                line_item_id: item.id.clone(),
                lp_id: item.lp_id.clone(),
                lp_name: lp.display_name.clone(),
                quarter: item.quarter,
                allotment_date: request.allotment_date,
                committed_amount: lp.commitment,
                amount_due: item.amount_due,
                amount_received: total,
                amount_accepted: figures.amount_accepted,
                excess_amount: figures.excess_amount,
                excess_treatment: settings.overpayment_policy,
                management_fee: item.management_fee,
                stamp_duty: item.stamp_duty,
                nav: fund.nav,
                units: figures.units,
                depository: lp.depository.clone(),
                replaces_allotment_id: None,
                created_at: now,
            });
            status_updates.push(StatusUpdate {
                line_item_id: item.id.clone(),
                from: item.status,
                to: LineItemStatus::AllotmentDone,
            });
        }

        let allotments = self
            .allotment_repository
            .issue_allotments(allotments, status_updates.clone())
            .await?;

        let batch = AllotmentBatch::new(
            request.fund_id.clone(),
            request.quarter,
            request.allotment_date,
            fund.nav,
            allotments,
        );
        info!(
            "Allotted {} units to {} LPs of fund {} {} at NAV {}",
            batch.total_units,
            batch.allotments.len(),
            request.fund_id,
            request.quarter,
            fund.nav
        );

        self.event_sink.emit(DomainEvent::allotments_issued(
            request.fund_id.clone(),
            request.quarter,
            batch.allotments.iter().map(|a| a.id.clone()).collect(),
        ));
        for update in status_updates {
            self.event_sink.emit(DomainEvent::line_item_status_changed(
                update.line_item_id,
                update.from,
                update.to,
            ));
        }

        Ok(batch)
    }

    async fn reissue_allotment(
        &self,
        allotment_id: &str,
        request: ReissueRequest,
    ) -> Result<Allotment> {
        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::MissingField("reason".to_string()).into());
        }

        let original = self.allotment_repository.get_allotment(allotment_id)?;
        let _guard = self.locks.acquire(&original.fund_id, original.quarter).await;

        if self
            .allotment_repository
            .get_reversal_for(allotment_id)?
            .is_some()
        {
            return Err(AllotmentError::AlreadyReversed {
                allotment_id: allotment_id.to_string(),
            }
            .into());
        }

        // Figures carry over; the profile snapshot is taken afresh.
        let lp = self.profile_reader.get_limited_partner(&original.lp_id)?;
        let now = Utc::now().naive_utc();
        let replacement = Allotment {
            id: Uuid::new_v4().to_string(),
            lp_name: lp.display_name,
            depository: lp.depository,
            allotment_date: request.allotment_date,
            replaces_allotment_id: Some(original.id.clone()),
            created_at: now,
            ..original.clone()
        };
        let reversal = AllotmentReversal {
            id: Uuid::new_v4().to_string(),
            allotment_id: original.id.clone(),
            replacement_allotment_id: replacement.id.clone(),
            reason: reason.to_string(),
            reversed_at: now,
        };

        let replacement = self
            .allotment_repository
            .reverse_and_reissue(reversal, replacement)
            .await?;
        info!(
            "Reversed allotment {} and issued {} ({})",
            original.id, replacement.id, reason
        );
        self.event_sink.emit(DomainEvent::allotment_reissued(
            original.id,
            replacement.id.clone(),
            reason.to_string(),
        ));

        Ok(replacement)
    }

    fn list_current_allotments(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
    ) -> Result<Vec<Allotment>> {
        let reversed: HashSet<String> = self
            .allotment_repository
            .list_reversals(fund_id)?
            .into_iter()
            .map(|r| r.allotment_id)
            .collect();
        Ok(self
            .allotment_repository
            .list_allotments_for_quarter(fund_id, quarter)?
            .into_iter()
            .filter(|a| !reversed.contains(&a.id))
            .collect())
    }
}
