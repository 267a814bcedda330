//! Audit sink for the web server runtime.
//!
//! Writes every domain event as one structured line on the `audit` tracing
//! target. Emission never blocks and never fails the ledger write.

use fundflow_core::events::{DomainEvent, DomainEventSink};

pub const AUDIT_TARGET: &str = "audit";

#[derive(Debug, Default)]
pub struct TracingDomainEventSink;

impl TracingDomainEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn event_name(event: &DomainEvent) -> &'static str {
    match event {
        DomainEvent::DrawdownIssued { .. } => "drawdown_issued",
        DomainEvent::TransactionsImported { .. } => "transactions_imported",
        DomainEvent::DuplicateTransactionSkipped { .. } => "duplicate_transaction_skipped",
        DomainEvent::PaymentsRecorded { .. } => "payments_recorded",
        DomainEvent::LineItemStatusChanged { .. } => "line_item_status_changed",
        DomainEvent::ReminderDue { .. } => "reminder_due",
        DomainEvent::AllotmentsIssued { .. } => "allotments_issued",
        DomainEvent::AllotmentReissued { .. } => "allotment_reissued",
        DomainEvent::ReportGenerated { .. } => "report_generated",
        DomainEvent::ReportStatusChanged { .. } => "report_status_changed",
    }
}

impl DomainEventSink for TracingDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        let name = event_name(&event);
        match serde_json::to_string(&event) {
            Ok(payload) => tracing::info!(target: AUDIT_TARGET, event = name, %payload),
            Err(err) => {
                tracing::warn!(target: AUDIT_TARGET, event = name, "unserializable event: {}", err)
            }
        }
    }
}
