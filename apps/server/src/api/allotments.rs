use std::sync::Arc;

use crate::{api::parse_quarter, error::ApiResult, main_lib::AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::post,
    Json, Router,
};
use chrono::NaiveDate;
use fundflow_core::allotments::{Allotment, AllotmentBatch, AllotmentRequest, ReissueRequest};
use fundflow_core::documents::{render_document, DocumentRef};
use serde::{Deserialize, Serialize};

const ALLOTMENT_SHEET_TEMPLATE: &str = "allotment_sheet";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllotBody {
    allotment_date: NaiveDate,
    #[serde(default)]
    line_item_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AllotmentBatchResponse {
    #[serde(flatten)]
    batch: AllotmentBatch,
    document: Option<DocumentRef>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReissueResponse {
    allotment: Allotment,
    document: Option<DocumentRef>,
}

/// Renders the allotment sheet. The allotments are already committed, so a
/// rendering failure is logged and the document left out.
async fn render_sheet<T: Serialize>(state: &AppState, payload: &T) -> Option<DocumentRef> {
    match render_document(
        state.document_store.as_ref(),
        ALLOTMENT_SHEET_TEMPLATE,
        payload,
    )
    .await
    {
        Ok(doc) => Some(doc),
        Err(err) => {
            tracing::warn!("Allotment sheet rendering failed: {}", err);
            None
        }
    }
}

async fn allot_units(
    Path((fund_id, quarter)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AllotBody>, JsonRejection>,
) -> ApiResult<Json<AllotmentBatchResponse>> {
    let Json(body) = payload?;
    let request = AllotmentRequest {
        fund_id,
        quarter: parse_quarter(&quarter)?,
        allotment_date: body.allotment_date,
        line_item_ids: body.line_item_ids,
    };
    let batch = state.allotment_service.allot_units(request).await?;
    let document = render_sheet(&state, &batch).await;
    Ok(Json(AllotmentBatchResponse { batch, document }))
}

async fn list_allotments(
    Path((fund_id, quarter)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Allotment>>> {
    let quarter = parse_quarter(&quarter)?;
    let allotments = state
        .allotment_service
        .list_current_allotments(&fund_id, &quarter)?;
    Ok(Json(allotments))
}

async fn reissue_allotment(
    Path(allotment_id): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReissueRequest>, JsonRejection>,
) -> ApiResult<Json<ReissueResponse>> {
    let Json(request) = payload?;
    let allotment = state
        .allotment_service
        .reissue_allotment(&allotment_id, request)
        .await?;
    let document = render_sheet(&state, &allotment).await;
    Ok(Json(ReissueResponse {
        allotment,
        document,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/funds/{fund_id}/quarters/{quarter}/allotments",
            post(allot_units).get(list_allotments),
        )
        .route("/allotments/{id}/reissue", post(reissue_allotment))
}
