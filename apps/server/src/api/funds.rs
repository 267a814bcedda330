use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use fundflow_core::funds::{Fund, LimitedPartner, PortfolioInvestment, ProfileReaderTrait};

fn id_mismatch(path_id: &str, body_id: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "path id {} does not match body id {}",
        path_id, body_id
    ))
}

async fn list_funds(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Fund>>> {
    let funds = state.profile_repository.list_funds()?;
    Ok(Json(funds))
}

async fn get_fund(
    Path(fund_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Fund>> {
    let fund = state.profile_repository.get_fund(&fund_id)?;
    Ok(Json(fund))
}

async fn upsert_fund(
    Path(fund_id): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Fund>, JsonRejection>,
) -> ApiResult<Json<Fund>> {
    let Json(fund) = payload?;
    if fund.id != fund_id {
        return Err(id_mismatch(&fund_id, &fund.id));
    }
    state.profile_repository.upsert_fund(fund.clone()).await?;
    Ok(Json(fund))
}

async fn list_limited_partners(
    Path(fund_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<LimitedPartner>>> {
    let lps = state.profile_repository.list_limited_partners(&fund_id)?;
    Ok(Json(lps))
}

async fn upsert_limited_partner(
    Path((fund_id, lp_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LimitedPartner>, JsonRejection>,
) -> ApiResult<Json<LimitedPartner>> {
    let Json(lp) = payload?;
    if lp.id != lp_id {
        return Err(id_mismatch(&lp_id, &lp.id));
    }
    if lp.fund_id != fund_id {
        return Err(id_mismatch(&fund_id, &lp.fund_id));
    }
    state
        .profile_repository
        .upsert_limited_partner(lp.clone())
        .await?;
    Ok(Json(lp))
}

async fn add_portfolio_investment(
    Path(fund_id): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PortfolioInvestment>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(investment) = payload?;
    if investment.fund_id != fund_id {
        return Err(id_mismatch(&fund_id, &investment.fund_id));
    }
    state
        .profile_repository
        .add_portfolio_investment(investment)
        .await?;
    Ok(StatusCode::CREATED)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/funds", get(list_funds))
        .route("/funds/{fund_id}", get(get_fund).put(upsert_fund))
        .route(
            "/funds/{fund_id}/limited-partners",
            get(list_limited_partners),
        )
        .route(
            "/funds/{fund_id}/limited-partners/{lp_id}",
            put(upsert_limited_partner),
        )
        .route(
            "/funds/{fund_id}/portfolio-investments",
            post(add_portfolio_investment),
        )
}
