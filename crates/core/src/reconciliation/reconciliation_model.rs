//! Payment and reconciliation models.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::status::{LineItemStatus, StatusUpdate};
use crate::utils::FiscalQuarter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchMethod {
    ExactReference,
    NameAndAmount,
    /// Name found but amount outside tolerance. Never binding on its own.
    NameOnly,
    Manual,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::ExactReference => "EXACT_REFERENCE",
            MatchMethod::NameAndAmount => "NAME_AND_AMOUNT",
            MatchMethod::NameOnly => "NAME_ONLY",
            MatchMethod::Manual => "MANUAL",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "EXACT_REFERENCE" => Some(MatchMethod::ExactReference),
            "NAME_AND_AMOUNT" => Some(MatchMethod::NameAndAmount),
            "NAME_ONLY" => Some(MatchMethod::NameOnly),
            "MANUAL" => Some(MatchMethod::Manual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Shortfall,
    Overpayment,
    Pending,
    /// Advisory candidate waiting for an operator to confirm it.
    PendingReview,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Shortfall => "SHORTFALL",
            PaymentStatus::Overpayment => "OVERPAYMENT",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::PendingReview => "PENDING_REVIEW",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PAID" => Some(PaymentStatus::Paid),
            "SHORTFALL" => Some(PaymentStatus::Shortfall),
            "OVERPAYMENT" => Some(PaymentStatus::Overpayment),
            "PENDING" => Some(PaymentStatus::Pending),
            "PENDING_REVIEW" => Some(PaymentStatus::PendingReview),
            _ => None,
        }
    }

    /// The full amount called has been received.
    pub fn is_fully_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Overpayment)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement status of a line item from what it expects and what arrived.
pub fn settlement_status(expected: Decimal, received: Decimal) -> PaymentStatus {
    if received.is_zero() || received < Decimal::ZERO {
        PaymentStatus::Pending
    } else if received == expected {
        PaymentStatus::Paid
    } else if received < expected {
        PaymentStatus::Shortfall
    } else {
        PaymentStatus::Overpayment
    }
}

/// Money linked to one line item. A line item paid in installments has one
/// payment per installment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub fund_id: String,
    pub lp_id: String,
    pub line_item_id: String,
    /// Each transaction backs at most one payment.
    pub transaction_ids: Vec<String>,
    pub expected_amount: Decimal,
    pub received_amount: Decimal,
    pub method: MatchMethod,
    /// Line item settlement status once this payment was applied, or
    /// `PendingReview` for advisory candidates.
    pub status: PaymentStatus,
    pub paid_on: NaiveDate,
    pub note: Option<String>,
    pub matched_at: NaiveDateTime,
}

impl Payment {
    /// Binding payments count toward the amount received.
    pub fn is_binding(&self) -> bool {
        self.status != PaymentStatus::PendingReview
    }
}

/// Sum of binding payments for one line item.
pub fn received_amount<'a, I>(payments: I) -> Decimal
where
    I: IntoIterator<Item = &'a Payment>,
{
    payments
        .into_iter()
        .filter(|p| p.is_binding())
        .map(|p| p.received_amount)
        .sum()
}

/// An advisory candidate promoted to a binding manual payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub payment_id: String,
    pub method: MatchMethod,
    pub status: PaymentStatus,
}

/// Everything one settlement step writes, applied atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettlementBatch {
    pub new_payments: Vec<Payment>,
    pub confirmations: Vec<PaymentConfirmation>,
    pub status_updates: Vec<StatusUpdate>,
}

impl SettlementBatch {
    pub fn is_empty(&self) -> bool {
        self.new_payments.is_empty()
            && self.confirmations.is_empty()
            && self.status_updates.is_empty()
    }
}

/// Reminder progress for one line item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderStatus {
    /// Day offsets whose reminders have gone out.
    pub fired_days: Vec<u32>,
    pub next_day: Option<u32>,
    pub next_date: Option<NaiveDate>,
}

/// Settlement view of one LP in a reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LpSettlement {
    pub line_item_id: String,
    pub lp_id: String,
    pub lp_name: String,
    pub expected: Decimal,
    pub received: Decimal,
    pub excess: Decimal,
    pub status: PaymentStatus,
    pub line_item_status: LineItemStatus,
    pub payment_ids: Vec<String>,
    pub reminders: ReminderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Completed,
    InProgress,
}

/// Why a transaction needs an operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewReason {
    /// Several LP names appear in the narration.
    Ambiguous { lp_ids: Vec<String> },
    /// Name matched, amount outside tolerance. Confirm the payment to bind it.
    Advisory {
        payment_id: String,
        lp_id: String,
        line_item_id: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub transaction_id: String,
    pub external_reference: String,
    pub amount: Decimal,
    pub narration: String,
    #[serde(flatten)]
    pub reason: ReviewReason,
}

/// Outcome of `reconcile`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub fund_id: String,
    pub quarter: FiscalQuarter,
    pub drawdown_id: String,
    pub as_of: NaiveDate,
    /// False when the reconciliation window had closed and no override was given.
    pub window_open: bool,
    pub per_lp: Vec<LpSettlement>,
    pub total_expected: Decimal,
    pub total_received: Decimal,
    pub overall_status: OverallStatus,
    pub new_payment_ids: Vec<String>,
    pub review_queue: Vec<ReviewItem>,
    pub unmatched_transaction_ids: Vec<String>,
}

/// Operator-entered payment for a line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualPayment {
    pub line_item_id: String,
    pub amount: Decimal,
    pub paid_on: NaiveDate,
    pub transaction_id: Option<String>,
    pub note: Option<String>,
}

/// A reminder the scheduler should hand to the notification layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderNotice {
    pub fund_id: String,
    pub drawdown_id: String,
    pub line_item_id: String,
    pub lp_id: String,
    pub due_date: NaiveDate,
    pub reminder_number: u8,
    pub day_offset: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_settlement_status_derivation() {
        assert_eq!(settlement_status(dec!(100), dec!(0)), PaymentStatus::Pending);
        assert_eq!(settlement_status(dec!(100), dec!(40)), PaymentStatus::Shortfall);
        assert_eq!(settlement_status(dec!(100), dec!(100.00)), PaymentStatus::Paid);
        assert_eq!(
            settlement_status(dec!(100), dec!(100.01)),
            PaymentStatus::Overpayment
        );
    }

    #[test]
    fn test_advisory_payments_do_not_count() {
        let base = Payment {
            id: "p1".to_string(),
            fund_id: "f".to_string(),
            lp_id: "lp".to_string(),
            line_item_id: "li".to_string(),
            transaction_ids: vec![],
            expected_amount: dec!(100),
            received_amount: dec!(60),
            method: MatchMethod::NameAndAmount,
            status: PaymentStatus::Shortfall,
            paid_on: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            note: None,
            matched_at: NaiveDate::from_ymd_opt(2025, 7, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        };
        let advisory = Payment {
            id: "p2".to_string(),
            method: MatchMethod::NameOnly,
            status: PaymentStatus::PendingReview,
            received_amount: dec!(500),
            ..base.clone()
        };
        assert_eq!(received_amount([&base, &advisory]), dec!(60));
    }
}
