use thiserror::Error;

use crate::status::LineItemStatus;

use super::PaymentStatus;

#[derive(Error, Debug)]
pub enum ReconciliationError {
    #[error("Fund {fund_id} has no outstanding drawdown for {quarter}")]
    NoOutstandingDrawdowns { fund_id: String, quarter: String },

    #[error("Payment {payment_id} is {status}, only payments pending review can be confirmed")]
    PaymentNotReviewable {
        payment_id: String,
        status: PaymentStatus,
    },

    #[error("Line item {line_item_id} is {status} and no longer accepts payments")]
    SettlementClosed {
        line_item_id: String,
        status: LineItemStatus,
    },
}

impl ReconciliationError {
    pub fn kind(&self) -> &'static str {
        match self {
            ReconciliationError::NoOutstandingDrawdowns { .. } => "NoOutstandingDrawdowns",
            ReconciliationError::PaymentNotReviewable { .. } => "PaymentNotReviewable",
            ReconciliationError::SettlementClosed { .. } => "SettlementClosed",
        }
    }

    pub fn entity_ids(&self) -> Vec<String> {
        match self {
            ReconciliationError::NoOutstandingDrawdowns { fund_id, .. } => vec![fund_id.clone()],
            ReconciliationError::PaymentNotReviewable { payment_id, .. } => {
                vec![payment_id.clone()]
            }
            ReconciliationError::SettlementClosed { line_item_id, .. } => {
                vec![line_item_id.clone()]
            }
        }
    }
}
