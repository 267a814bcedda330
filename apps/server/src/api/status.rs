use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::put,
    Json, Router,
};
use fundflow_core::drawdowns::DrawdownLineItem;
use fundflow_core::status::LineItemStatus;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransitionBody {
    status: LineItemStatus,
}

async fn transition_status(
    Path(line_item_id): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TransitionBody>, JsonRejection>,
) -> ApiResult<Json<DrawdownLineItem>> {
    let Json(body) = payload?;
    let item = state
        .status_service
        .transition_status(&line_item_id, body.status)
        .await?;
    Ok(Json(item))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/line-items/{id}/status", put(transition_status))
}
