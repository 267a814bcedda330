use thiserror::Error;

use super::ReportStatus;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report {snapshot_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        snapshot_id: String,
        from: ReportStatus,
        to: ReportStatus,
    },

    #[error("Invalid operator input {field}: {reason}")]
    InvalidInputs { field: String, reason: String },

    #[error("Data integrity error: {message}")]
    DataIntegrity {
        message: String,
        entity_ids: Vec<String>,
    },
}

impl ReportError {
    pub fn kind(&self) -> &'static str {
        match self {
            ReportError::InvalidStatusTransition { .. } => "InvalidTransition",
            ReportError::InvalidInputs { .. } => "ValidationError",
            ReportError::DataIntegrity { .. } => "DataIntegrityError",
        }
    }

    pub fn entity_ids(&self) -> Vec<String> {
        match self {
            ReportError::InvalidStatusTransition { snapshot_id, .. } => vec![snapshot_id.clone()],
            ReportError::InvalidInputs { .. } => Vec::new(),
            ReportError::DataIntegrity { entity_ids, .. } => entity_ids.clone(),
        }
    }
}
