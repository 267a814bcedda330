use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use fundflow_core::transactions::{BankTransaction, ImportSummary, StatementRow};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportBody {
    rows: Vec<StatementRow>,
}

/// Rows failing validation are reported in the summary, not as an error.
async fn import_transactions(
    Path(fund_id): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ImportBody>, JsonRejection>,
) -> ApiResult<Json<ImportSummary>> {
    let Json(body) = payload?;
    let summary = state
        .transaction_service
        .import_transactions(&fund_id, body.rows)
        .await?;
    Ok(Json(summary))
}

async fn list_transactions(
    Path(fund_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<BankTransaction>>> {
    let transactions = state.transaction_service.list_transactions(&fund_id)?;
    Ok(Json(transactions))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/funds/{fund_id}/transactions", get(list_transactions))
        .route(
            "/funds/{fund_id}/transactions/import",
            post(import_transactions),
        )
}
