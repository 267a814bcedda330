use std::sync::Arc;

use crate::{api::parse_quarter, error::ApiResult, main_lib::AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use fundflow_core::drawdowns::{
    CallSpec, Drawdown, DrawdownCalculation, DrawdownLineItem, DrawdownRequest, DrawdownSummary,
};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrawdownBody {
    quarter: String,
    notice_date: NaiveDate,
    due_date: NaiveDate,
    call_spec: CallSpec,
    #[serde(default)]
    forecast_next_quarter: Option<Decimal>,
    #[serde(default)]
    preview: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpectedReferenceBody {
    reference: Option<String>,
}

async fn calculate_drawdown(
    Path(fund_id): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DrawdownBody>, JsonRejection>,
) -> ApiResult<Json<DrawdownCalculation>> {
    let Json(body) = payload?;
    let request = DrawdownRequest {
        fund_id,
        quarter: parse_quarter(&body.quarter)?,
        notice_date: body.notice_date,
        due_date: body.due_date,
        call_spec: body.call_spec,
        forecast_next_quarter: body.forecast_next_quarter,
        preview: body.preview,
    };
    let calculation = state.drawdown_service.calculate_drawdown(request).await?;
    Ok(Json(calculation))
}

async fn list_drawdowns(
    Path(fund_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Drawdown>>> {
    let drawdowns = state.drawdown_service.list_drawdowns(&fund_id)?;
    Ok(Json(drawdowns))
}

async fn get_drawdown(
    Path(drawdown_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DrawdownSummary>> {
    let summary = state.drawdown_service.get_drawdown_summary(&drawdown_id)?;
    Ok(Json(summary))
}

async fn cancel_drawdown(
    Path(drawdown_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<DrawdownLineItem>>> {
    let cancelled = state.status_service.cancel_drawdown(&drawdown_id).await?;
    Ok(Json(cancelled))
}

async fn set_expected_reference(
    Path(line_item_id): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExpectedReferenceBody>, JsonRejection>,
) -> ApiResult<Json<DrawdownLineItem>> {
    let Json(body) = payload?;
    let item = state
        .drawdown_service
        .set_expected_reference(&line_item_id, body.reference)
        .await?;
    Ok(Json(item))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/funds/{fund_id}/drawdowns",
            get(list_drawdowns).post(calculate_drawdown),
        )
        .route("/drawdowns/{drawdown_id}", get(get_drawdown))
        .route("/drawdowns/{drawdown_id}/cancel", post(cancel_drawdown))
        .route(
            "/line-items/{id}/expected-reference",
            put(set_expected_reference),
        )
}
