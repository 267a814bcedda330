use std::sync::Arc;

use crate::{api::parse_quarter, error::ApiResult, main_lib::AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post, put},
    Json, Router,
};
use fundflow_core::documents::{render_document, DocumentRef};
use fundflow_core::reports::{
    OperatorInputs, ReportKind, ReportRequest, ReportSnapshot, ReportStatus,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    kind: ReportKind,
    #[serde(default)]
    inputs: OperatorInputs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    status: ReportStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedReport {
    snapshot: ReportSnapshot,
    document: Option<DocumentRef>,
}

fn template_for(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Sebi => "sebi_report",
        ReportKind::Invi => "invi_report",
    }
}

async fn generate_report(
    Path((fund_id, quarter)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> ApiResult<Json<GeneratedReport>> {
    let Json(body) = payload?;
    let request = ReportRequest {
        fund_id,
        quarter: parse_quarter(&quarter)?,
        kind: body.kind,
        inputs: body.inputs,
    };
    let snapshot = state.report_service.generate_report(request).await?;
    let document = match render_document(
        state.document_store.as_ref(),
        template_for(snapshot.kind),
        &snapshot,
    )
    .await
    {
        Ok(doc) => Some(doc),
        Err(err) => {
            tracing::warn!("Report {} rendering failed: {}", snapshot.id, err);
            None
        }
    };
    Ok(Json(GeneratedReport { snapshot, document }))
}

async fn list_reports(
    Path((fund_id, quarter)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ReportSnapshot>>> {
    let quarter = parse_quarter(&quarter)?;
    let reports = state.report_service.list_reports(&fund_id, &quarter)?;
    Ok(Json(reports))
}

async fn get_report(
    Path(snapshot_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ReportSnapshot>> {
    let report = state.report_service.get_report(&snapshot_id)?;
    Ok(Json(report))
}

async fn set_report_status(
    Path(snapshot_id): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StatusBody>, JsonRejection>,
) -> ApiResult<Json<ReportSnapshot>> {
    let Json(body) = payload?;
    let report = state
        .report_service
        .set_report_status(&snapshot_id, body.status)
        .await?;
    Ok(Json(report))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/funds/{fund_id}/quarters/{quarter}/reports",
            get(list_reports).post(generate_report),
        )
        .route("/reports/{id}", get(get_report))
        .route("/reports/{id}/status", put(set_report_status))
}
