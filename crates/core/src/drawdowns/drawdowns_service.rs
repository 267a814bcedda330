use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::drawdown_calculator::{calculate_line_items, is_fee_quarter, CalculationInput};
use super::drawdowns_model::*;
use super::{DrawdownError, DrawdownRepositoryTrait, DrawdownServiceTrait};
use crate::errors::{Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};
use crate::funds::{LimitedPartner, ProfileReaderTrait};
use crate::locks::QuarterLocks;
use crate::status::{rollup_status, LineItemStatus};
use crate::utils::FiscalQuarter;

/// Returns the quarter's drawdown unless every one of its line items is cancelled.
pub fn live_drawdown_for_quarter(
    repository: &dyn DrawdownRepositoryTrait,
    fund_id: &str,
    quarter: &FiscalQuarter,
) -> Result<Option<(Drawdown, Vec<DrawdownLineItem>)>> {
    for drawdown in repository.list_drawdowns_for_quarter(fund_id, quarter)? {
        let items = repository.list_line_items(&drawdown.id)?;
        if items.iter().any(|item| !item.status.is_cancelled()) {
            return Ok(Some((drawdown, items)));
        }
    }
    Ok(None)
}

/// Service for issuing capital calls
pub struct DrawdownService {
    profile_reader: Arc<dyn ProfileReaderTrait>,
    drawdown_repository: Arc<dyn DrawdownRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    locks: Arc<QuarterLocks>,
}

impl DrawdownService {
    pub fn new(
        profile_reader: Arc<dyn ProfileReaderTrait>,
        drawdown_repository: Arc<dyn DrawdownRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        locks: Arc<QuarterLocks>,
    ) -> Self {
        Self {
            profile_reader,
            drawdown_repository,
            event_sink,
            locks,
        }
    }

    fn active_limited_partners(&self, fund_id: &str) -> Result<Vec<LimitedPartner>> {
        let mut lps: Vec<LimitedPartner> = self
            .profile_reader
            .list_limited_partners(fund_id)?
            .into_iter()
            .filter(LimitedPartner::is_active)
            .collect();
        lps.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(lps)
    }

    /// Calls per LP in quarters before `quarter` and the earliest of those
    /// quarters, ignoring cancelled line items.
    fn call_history(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
    ) -> Result<(HashMap<String, Decimal>, Option<FiscalQuarter>)> {
        let mut prior: HashMap<String, Decimal> = HashMap::new();
        let mut first_quarter: Option<FiscalQuarter> = None;

        for item in self.drawdown_repository.list_line_items_for_fund(fund_id)? {
            if item.status.is_cancelled() || item.quarter >= *quarter {
                continue;
            }
            *prior.entry(item.lp_id.clone()).or_insert(Decimal::ZERO) += item.amount_due;
            first_quarter = Some(match first_quarter {
                Some(q) if q <= item.quarter => q,
                _ => item.quarter,
            });
        }

        Ok((prior, first_quarter))
    }

    fn build_calculation(&self, request: &DrawdownRequest) -> Result<DrawdownCalculation> {
        let basis = request.call_spec.resolve()?;
        if request.notice_date > request.due_date {
            return Err(ValidationError::InvalidInput(format!(
                "notice date {} is after due date {}",
                request.notice_date, request.due_date
            ))
            .into());
        }

        let fund = self.profile_reader.get_fund(&request.fund_id)?;

        if let Some((existing, _)) = live_drawdown_for_quarter(
            self.drawdown_repository.as_ref(),
            &request.fund_id,
            &request.quarter,
        )? {
            return Err(DrawdownError::AlreadyIssued {
                fund_id: request.fund_id.clone(),
                quarter: request.quarter.label(),
                drawdown_id: existing.id,
            }
            .into());
        }

        let lps = self.active_limited_partners(&request.fund_id)?;
        let (prior_called, first_quarter) = self.call_history(&request.fund_id, &request.quarter)?;
        let fee_quarter = is_fee_quarter(first_quarter.as_ref(), &request.quarter);

        let figures = calculate_line_items(&CalculationInput {
            fund: &fund,
            limited_partners: &lps,
            prior_called: &prior_called,
            basis,
            fee_quarter,
        })?;

        let now = Utc::now().naive_utc();
        let drawdown_id = Uuid::new_v4().to_string();
        let total_called: Decimal = figures.iter().map(|f| f.amount_due).sum();

        let drawdown = Drawdown {
            id: drawdown_id.clone(),
            fund_id: request.fund_id.clone(),
            quarter: request.quarter,
            notice_date: request.notice_date,
            due_date: request.due_date,
            call_basis: basis,
            total_called,
            forecast_next_quarter: request.forecast_next_quarter.unwrap_or(Decimal::ZERO),
            forecast_period: request.quarter.next(),
            created_at: now,
        };

        let line_items = figures
            .into_iter()
            .map(|f| DrawdownLineItem {
                id: Uuid::new_v4().to_string(),
                drawdown_id: drawdown_id.clone(),
                fund_id: request.fund_id.clone(),
                lp_id: f.lp_id,
                quarter: request.quarter,
                amount_due: f.amount_due,
                amount_called_up: f.amount_called_up,
                remaining_commitment: f.remaining_commitment,
                management_fee: f.management_fee,
                stamp_duty: f.stamp_duty,
                over_committed: f.over_committed,
                expected_reference: None,
                status: LineItemStatus::NoticePending,
                created_at: now,
                updated_at: now,
            })
            .collect();

        Ok(DrawdownCalculation {
            drawdown,
            line_items,
            fee_quarter,
            preview: request.preview,
        })
    }
}

#[async_trait]
impl DrawdownServiceTrait for DrawdownService {
    async fn calculate_drawdown(&self, request: DrawdownRequest) -> Result<DrawdownCalculation> {
        if request.preview {
            debug!(
                "Previewing drawdown for fund {} {}",
                request.fund_id, request.quarter
            );
            return self.build_calculation(&request);
        }

        let _guard = self.locks.acquire(&request.fund_id, request.quarter).await;
        let calculation = self.build_calculation(&request)?;

        for item in calculation.line_items.iter().filter(|i| i.over_committed) {
            warn!(
                "LP {} is called beyond its commitment in {} (remaining {})",
                item.lp_id, request.quarter, item.remaining_commitment
            );
        }

        self.drawdown_repository
            .insert_drawdown(
                calculation.drawdown.clone(),
                calculation.line_items.clone(),
            )
            .await?;

        info!(
            "Issued drawdown {} for fund {} {}: {} line items, total {}",
            calculation.drawdown.id,
            request.fund_id,
            request.quarter,
            calculation.line_items.len(),
            calculation.drawdown.total_called
        );

        self.event_sink.emit(DomainEvent::drawdown_issued(
            request.fund_id.clone(),
            calculation.drawdown.id.clone(),
            request.quarter,
            calculation.line_items.iter().map(|i| i.id.clone()).collect(),
            calculation.drawdown.total_called,
        ));

        Ok(calculation)
    }

    fn get_drawdown_summary(&self, drawdown_id: &str) -> Result<DrawdownSummary> {
        let drawdown = self.drawdown_repository.get_drawdown(drawdown_id)?;
        let line_items = self.drawdown_repository.list_line_items(drawdown_id)?;
        let status = rollup_status(line_items.iter().map(|i| i.status));
        Ok(DrawdownSummary {
            drawdown,
            line_items,
            status,
        })
    }

    fn list_drawdowns(&self, fund_id: &str) -> Result<Vec<Drawdown>> {
        self.drawdown_repository.list_drawdowns(fund_id)
    }

    async fn set_expected_reference(
        &self,
        line_item_id: &str,
        reference: Option<String>,
    ) -> Result<DrawdownLineItem> {
        let reference = reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self.drawdown_repository
            .set_expected_reference(line_item_id.to_string(), reference)
            .await
    }
}
