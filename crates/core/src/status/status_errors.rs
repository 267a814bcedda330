use thiserror::Error;

use super::LineItemStatus;

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("Line item {line_item_id} cannot move from {from} to {to}")]
    InvalidTransition {
        line_item_id: String,
        from: LineItemStatus,
        to: LineItemStatus,
    },

    /// Allotment Done and inVi Filed are set by allotment and filing only.
    #[error("Line item {line_item_id} cannot be moved to {target} by hand")]
    ManualTargetNotAllowed {
        line_item_id: String,
        target: LineItemStatus,
    },

    #[error("Drawdown {drawdown_id} has allotted line items and cannot be cancelled")]
    CancelAfterAllotment {
        drawdown_id: String,
        line_item_ids: Vec<String>,
    },

    /// The line item changed between read and write.
    #[error("Line item {line_item_id} is {actual}, expected {expected}")]
    StaleStatus {
        line_item_id: String,
        expected: LineItemStatus,
        actual: LineItemStatus,
    },
}

impl StatusError {
    pub fn kind(&self) -> &'static str {
        match self {
            StatusError::StaleStatus { .. } => "ConcurrentModification",
            _ => "InvalidTransition",
        }
    }

    pub fn entity_ids(&self) -> Vec<String> {
        match self {
            StatusError::InvalidTransition { line_item_id, .. }
            | StatusError::ManualTargetNotAllowed { line_item_id, .. }
            | StatusError::StaleStatus { line_item_id, .. } => vec![line_item_id.clone()],
            StatusError::CancelAfterAllotment { line_item_ids, .. } => line_item_ids.clone(),
        }
    }
}
