use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Json, Router,
};
use fundflow_core::settings::SettlementSettings;

async fn get_settlement_settings(
    Path(fund_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SettlementSettings>> {
    let settings = state.settings_service.get_settlement_settings(&fund_id)?;
    Ok(Json(settings))
}

async fn update_settlement_settings(
    Path(fund_id): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SettlementSettings>, JsonRejection>,
) -> ApiResult<Json<SettlementSettings>> {
    let Json(settings) = payload?;
    let saved = state
        .settings_service
        .update_settlement_settings(&fund_id, settings)
        .await?;
    Ok(Json(saved))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/funds/{fund_id}/settings",
        get(get_settlement_settings).put(update_settlement_settings),
    )
}
