use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllotmentError {
    #[error("Payment not confirmed for line items: {}", line_item_ids.join(", "))]
    PaymentNotConfirmed { line_item_ids: Vec<String> },

    #[error("Line items already allotted: {}", line_item_ids.join(", "))]
    AlreadyAllotted { line_item_ids: Vec<String> },

    #[error("Fund {fund_id} has no fully paid line items to allot for {quarter}")]
    NoPaidLineItems { fund_id: String, quarter: String },

    #[error("Allotment {allotment_id} has already been reversed")]
    AlreadyReversed { allotment_id: String },

    #[error("Data integrity error: {message}")]
    DataIntegrity {
        message: String,
        entity_ids: Vec<String>,
    },
}

impl AllotmentError {
    pub fn kind(&self) -> &'static str {
        match self {
            AllotmentError::PaymentNotConfirmed { .. } => "PaymentNotConfirmed",
            AllotmentError::AlreadyAllotted { .. } => "AlreadyAllotted",
            AllotmentError::NoPaidLineItems { .. } => "NoPaidLineItems",
            AllotmentError::AlreadyReversed { .. } => "AlreadyReversed",
            AllotmentError::DataIntegrity { .. } => "DataIntegrityError",
        }
    }

    pub fn entity_ids(&self) -> Vec<String> {
        match self {
            AllotmentError::PaymentNotConfirmed { line_item_ids }
            | AllotmentError::AlreadyAllotted { line_item_ids } => line_item_ids.clone(),
            AllotmentError::NoPaidLineItems { fund_id, .. } => vec![fund_id.clone()],
            AllotmentError::AlreadyReversed { allotment_id } => vec![allotment_id.clone()],
            AllotmentError::DataIntegrity { entity_ids, .. } => entity_ids.clone(),
        }
    }
}
