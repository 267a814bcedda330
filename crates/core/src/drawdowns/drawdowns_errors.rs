use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrawdownError {
    #[error("Invalid call specification: {0}")]
    InvalidCallSpec(String),

    #[error("Fund {fund_id} has no active limited partners")]
    NoActiveLps { fund_id: String },

    #[error("{message}")]
    DataIntegrity {
        message: String,
        entity_ids: Vec<String>,
    },

    #[error("Fund {fund_id} already has drawdown {drawdown_id} for {quarter}")]
    AlreadyIssued {
        fund_id: String,
        quarter: String,
        drawdown_id: String,
    },
}

impl DrawdownError {
    pub fn kind(&self) -> &'static str {
        match self {
            DrawdownError::InvalidCallSpec(_) => "InvalidCallSpec",
            DrawdownError::NoActiveLps { .. } => "NoActiveLPs",
            DrawdownError::DataIntegrity { .. } => "DataIntegrityError",
            DrawdownError::AlreadyIssued { .. } => "DrawdownAlreadyIssued",
        }
    }

    pub fn entity_ids(&self) -> Vec<String> {
        match self {
            DrawdownError::InvalidCallSpec(_) => Vec::new(),
            DrawdownError::NoActiveLps { fund_id } => vec![fund_id.clone()],
            DrawdownError::DataIntegrity { entity_ids, .. } => entity_ids.clone(),
            DrawdownError::AlreadyIssued { drawdown_id, .. } => vec![drawdown_id.clone()],
        }
    }
}
