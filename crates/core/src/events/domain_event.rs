//! Domain event types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::status::LineItemStatus;
use crate::utils::FiscalQuarter;

/// Domain events emitted by core services after successful ledger writes.
///
/// These are facts, not commands. Runtime adapters turn them into audit log
/// lines, notifications and document rendering jobs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A capital call was committed to the ledger.
    DrawdownIssued {
        fund_id: String,
        drawdown_id: String,
        quarter: FiscalQuarter,
        line_item_ids: Vec<String>,
        total_called: Decimal,
    },

    /// A statement batch was ingested.
    TransactionsImported {
        fund_id: String,
        imported: usize,
        skipped_duplicates: usize,
        rejected: usize,
    },

    /// A statement row was skipped because its reference was already ingested.
    DuplicateTransactionSkipped {
        fund_id: String,
        external_reference: String,
    },

    /// Payments were linked to line items.
    PaymentsRecorded {
        fund_id: String,
        payment_ids: Vec<String>,
        line_item_ids: Vec<String>,
    },

    LineItemStatusChanged {
        line_item_id: String,
        from: LineItemStatus,
        to: LineItemStatus,
    },

    /// A payment reminder falls due today for an unpaid line item.
    ReminderDue {
        fund_id: String,
        line_item_id: String,
        lp_id: String,
        due_date: NaiveDate,
        /// 1 or 2.
        reminder_number: u8,
        day_offset: u32,
    },

    AllotmentsIssued {
        fund_id: String,
        quarter: FiscalQuarter,
        allotment_ids: Vec<String>,
    },

    /// An allotment was reversed and replaced by a fresh one.
    AllotmentReissued {
        reversed_allotment_id: String,
        replacement_allotment_id: String,
        reason: String,
    },

    ReportGenerated {
        fund_id: String,
        quarter: FiscalQuarter,
        kind: String,
        snapshot_id: String,
        version: i32,
    },

    ReportStatusChanged {
        snapshot_id: String,
        from: String,
        to: String,
    },
}

impl DomainEvent {
    pub fn drawdown_issued(
        fund_id: String,
        drawdown_id: String,
        quarter: FiscalQuarter,
        line_item_ids: Vec<String>,
        total_called: Decimal,
    ) -> Self {
        Self::DrawdownIssued {
            fund_id,
            drawdown_id,
            quarter,
            line_item_ids,
            total_called,
        }
    }

    pub fn transactions_imported(
        fund_id: String,
        imported: usize,
        skipped_duplicates: usize,
        rejected: usize,
    ) -> Self {
        Self::TransactionsImported {
            fund_id,
            imported,
            skipped_duplicates,
            rejected,
        }
    }

    pub fn duplicate_transaction_skipped(fund_id: String, external_reference: String) -> Self {
        Self::DuplicateTransactionSkipped {
            fund_id,
            external_reference,
        }
    }

    pub fn payments_recorded(
        fund_id: String,
        payment_ids: Vec<String>,
        line_item_ids: Vec<String>,
    ) -> Self {
        Self::PaymentsRecorded {
            fund_id,
            payment_ids,
            line_item_ids,
        }
    }

    pub fn line_item_status_changed(
        line_item_id: String,
        from: LineItemStatus,
        to: LineItemStatus,
    ) -> Self {
        Self::LineItemStatusChanged {
            line_item_id,
            from,
            to,
        }
    }

    pub fn reminder_due(
        fund_id: String,
        line_item_id: String,
        lp_id: String,
        due_date: NaiveDate,
        reminder_number: u8,
        day_offset: u32,
    ) -> Self {
        Self::ReminderDue {
            fund_id,
            line_item_id,
            lp_id,
            due_date,
            reminder_number,
            day_offset,
        }
    }

    pub fn allotments_issued(
        fund_id: String,
        quarter: FiscalQuarter,
        allotment_ids: Vec<String>,
    ) -> Self {
        Self::AllotmentsIssued {
            fund_id,
            quarter,
            allotment_ids,
        }
    }

    pub fn allotment_reissued(
        reversed_allotment_id: String,
        replacement_allotment_id: String,
        reason: String,
    ) -> Self {
        Self::AllotmentReissued {
            reversed_allotment_id,
            replacement_allotment_id,
            reason,
        }
    }

    pub fn report_generated(
        fund_id: String,
        quarter: FiscalQuarter,
        kind: String,
        snapshot_id: String,
        version: i32,
    ) -> Self {
        Self::ReportGenerated {
            fund_id,
            quarter,
            kind,
            snapshot_id,
            version,
        }
    }

    pub fn report_status_changed(snapshot_id: String, from: String, to: String) -> Self {
        Self::ReportStatusChanged {
            snapshot_id,
            from,
            to,
        }
    }

    /// Audit events are kept in the audit trail but trigger no follow-up work.
    pub fn is_audit_only(&self) -> bool {
        matches!(
            self,
            DomainEvent::DuplicateTransactionSkipped { .. }
                | DomainEvent::LineItemStatusChanged { .. }
                | DomainEvent::ReportStatusChanged { .. }
        )
    }
}
