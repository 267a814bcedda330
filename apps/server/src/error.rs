use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fundflow_core::errors::Error as CoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    code: u16,
    kind: String,
    message: String,
    entity_ids: Vec<String>,
}

/// HTTP status for a core error kind.
pub fn status_for_kind(kind: &str) -> StatusCode {
    match kind {
        "NotFound" => StatusCode::NOT_FOUND,
        "InvalidTransition"
        | "ConcurrentModification"
        | "ConstraintViolation"
        | "DrawdownAlreadyIssued"
        | "DuplicateTransactionReference"
        | "TransactionAlreadyLinked"
        | "AlreadyAllotted"
        | "AlreadyReversed"
        | "SettlementClosed"
        | "PaymentNotReviewable" => StatusCode::CONFLICT,
        "DataIntegrityError"
        | "PaymentNotConfirmed"
        | "NoPaidLineItems"
        | "NoActiveLPs"
        | "NoOutstandingDrawdowns" => StatusCode::UNPROCESSABLE_ENTITY,
        "ValidationError" | "InvalidCallSpec" | "MalformedStatementRow" | "InvalidConfigValue" => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, entity_ids) = match &self {
            ApiError::Core(e) => (status_for_kind(e.kind()), e.kind(), e.entity_ids()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "ValidationError", Vec::new()),
            ApiError::Anyhow(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected", Vec::new())
            }
        };
        if status.is_server_error() {
            tracing::error!(kind, "request failed: {}", self);
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            kind: kind.to_string(),
            message: self.to_string(),
            entity_ids,
        });
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use fundflow_core::errors::DatabaseError;
    use fundflow_core::status::{LineItemStatus, StatusError};

    #[test]
    fn test_invalid_transition_is_conflict() {
        let err = ApiError::from(CoreError::from(StatusError::InvalidTransition {
            line_item_id: "li-1".to_string(),
            from: LineItemStatus::Sent,
            to: LineItemStatus::AllotmentDone,
        }));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let err = ApiError::from(CoreError::from(DatabaseError::NotFound(
            "drawdown dd-9".to_string(),
        )));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_storage_failure_is_internal() {
        let err = ApiError::from(CoreError::from(DatabaseError::QueryFailed(
            "disk I/O error".to_string(),
        )));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
