use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::report_aggregator::{aggregate_report, AggregationInput};
use super::reports_model::*;
use super::{ReportRepositoryTrait, ReportServiceTrait};
use crate::allotments::AllotmentRepositoryTrait;
use crate::drawdowns::{live_drawdown_for_quarter, DrawdownRepositoryTrait};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};
use crate::funds::ProfileReaderTrait;
use crate::locks::QuarterLocks;
use crate::reconciliation::PaymentRepositoryTrait;
use crate::status::{LineItemStatus, StatusUpdate};
use crate::utils::FiscalQuarter;

/// Service for SEBI and inVi report snapshots
pub struct ReportService {
    profile_reader: Arc<dyn ProfileReaderTrait>,
    drawdown_repository: Arc<dyn DrawdownRepositoryTrait>,
    payment_repository: Arc<dyn PaymentRepositoryTrait>,
    allotment_repository: Arc<dyn AllotmentRepositoryTrait>,
    report_repository: Arc<dyn ReportRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    locks: Arc<QuarterLocks>,
}

impl ReportService {
    pub fn new(
        profile_reader: Arc<dyn ProfileReaderTrait>,
        drawdown_repository: Arc<dyn DrawdownRepositoryTrait>,
        payment_repository: Arc<dyn PaymentRepositoryTrait>,
        allotment_repository: Arc<dyn AllotmentRepositoryTrait>,
        report_repository: Arc<dyn ReportRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        locks: Arc<QuarterLocks>,
    ) -> Self {
        Self {
            profile_reader,
            drawdown_repository,
            payment_repository,
            allotment_repository,
            report_repository,
            event_sink,
            locks,
        }
    }

    fn build_figures(&self, request: &ReportRequest) -> Result<ReportFigures> {
        let fund = self.profile_reader.get_fund(&request.fund_id)?;
        let limited_partners = self.profile_reader.list_limited_partners(&request.fund_id)?;
        let investments = self
            .profile_reader
            .list_portfolio_investments(&request.fund_id)?;
        let drawdowns = self.drawdown_repository.list_drawdowns(&request.fund_id)?;
        let line_items = self
            .drawdown_repository
            .list_line_items_for_fund(&request.fund_id)?;
        let payments = self
            .payment_repository
            .list_payments_for_fund(&request.fund_id)?;

        let reversed: HashSet<String> = self
            .allotment_repository
            .list_reversals(&request.fund_id)?
            .into_iter()
            .map(|r| r.allotment_id)
            .collect();
        let allotments: Vec<_> = self
            .allotment_repository
            .list_allotments(&request.fund_id)?
            .into_iter()
            .filter(|a| !reversed.contains(&a.id))
            .collect();

        let figures = aggregate_report(&AggregationInput {
            fund: &fund,
            quarter: request.quarter,
            kind: request.kind,
            limited_partners: &limited_partners,
            drawdowns: &drawdowns,
            line_items: &line_items,
            payments: &payments,
            allotments: &allotments,
            investments: &investments,
        })?;
        Ok(figures)
    }

    /// Foreign LPs' allotted line items in the quarter, moved to the inVi marker.
    fn invi_filing_updates(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
    ) -> Result<Vec<StatusUpdate>> {
        let Some((_, items)) =
            live_drawdown_for_quarter(self.drawdown_repository.as_ref(), fund_id, quarter)?
        else {
            return Ok(Vec::new());
        };
        let fund = self.profile_reader.get_fund(fund_id)?;
        let foreign: HashSet<String> = self
            .profile_reader
            .list_limited_partners(fund_id)?
            .into_iter()
            .filter(|lp| fund.is_foreign(&lp.geography))
            .map(|lp| lp.id)
            .collect();

        Ok(items
            .into_iter()
            .filter(|i| i.status == LineItemStatus::AllotmentDone && foreign.contains(&i.lp_id))
            .map(|i| StatusUpdate {
                line_item_id: i.id,
                from: LineItemStatus::AllotmentDone,
                to: LineItemStatus::InviFiled,
            })
            .collect())
    }
}

/// Hex SHA-256 of the serialized inputs and figures.
pub(crate) fn snapshot_checksum(
    inputs: &OperatorInputs,
    figures: &ReportFigures,
) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(inputs)?);
    hasher.update(serde_json::to_vec(figures)?);
    Ok(hex::encode(hasher.finalize()))
}

#[async_trait]
impl ReportServiceTrait for ReportService {
    async fn generate_report(&self, request: ReportRequest) -> Result<ReportSnapshot> {
        request.inputs.validate()?;
        let _guard = self.locks.acquire(&request.fund_id, request.quarter).await;

        let figures = self.build_figures(&request)?;
        let checksum = snapshot_checksum(&request.inputs, &figures)?;
        let version = self
            .report_repository
            .latest_version(&request.fund_id, &request.quarter, request.kind)?
            .unwrap_or(0)
            + 1;
        let now = Utc::now().naive_utc();

        let snapshot = self
            .report_repository
            .insert_snapshot(ReportSnapshot {
                id: Uuid::new_v4().to_string(),
                fund_id: request.fund_id.clone(),
                quarter: request.quarter,
                kind: request.kind,
                version,
                status: ReportStatus::Draft,
                inputs: request.inputs,
                figures,
                checksum,
                generated_at: now,
                status_updated_at: now,
            })
            .await?;

        info!(
            "Generated {} report v{} for fund {} {}",
            snapshot.kind, snapshot.version, snapshot.fund_id, snapshot.quarter
        );
        self.event_sink.emit(DomainEvent::report_generated(
            snapshot.fund_id.clone(),
            snapshot.quarter,
            snapshot.kind.as_str().to_string(),
            snapshot.id.clone(),
            snapshot.version,
        ));

        Ok(snapshot)
    }

    fn get_report(&self, snapshot_id: &str) -> Result<ReportSnapshot> {
        self.report_repository.get_snapshot(snapshot_id)
    }

    fn list_reports(&self, fund_id: &str, quarter: &FiscalQuarter) -> Result<Vec<ReportSnapshot>> {
        self.report_repository.list_snapshots(fund_id, quarter)
    }

    async fn set_report_status(
        &self,
        snapshot_id: &str,
        status: ReportStatus,
    ) -> Result<ReportSnapshot> {
        let current = self.report_repository.get_snapshot(snapshot_id)?;
        let _guard = self.locks.acquire(&current.fund_id, current.quarter).await;

        let current = self.report_repository.get_snapshot(snapshot_id)?;
        current.status.check_transition(status, snapshot_id)?;

        let line_item_updates = if current.kind == ReportKind::Invi
            && current.status.reaches_filed(status)
        {
            self.invi_filing_updates(&current.fund_id, &current.quarter)?
        } else {
            Vec::new()
        };
        debug!(
            "Report {} {} -> {} with {} line item updates",
            snapshot_id,
            current.status,
            status,
            line_item_updates.len()
        );

        let updated = self
            .report_repository
            .update_status(
                snapshot_id.to_string(),
                current.status,
                status,
                line_item_updates.clone(),
            )
            .await?;

        self.event_sink.emit(DomainEvent::report_status_changed(
            snapshot_id.to_string(),
            current.status.as_str().to_string(),
            status.as_str().to_string(),
        ));
        for update in line_item_updates {
            self.event_sink.emit(DomainEvent::line_item_status_changed(
                update.line_item_id,
                update.from,
                update.to,
            ));
        }

        Ok(updated)
    }
}
