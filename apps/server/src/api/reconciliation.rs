use std::sync::Arc;

use crate::{api::parse_quarter, error::ApiResult, main_lib::AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use fundflow_core::reconciliation::{ManualPayment, Payment, ReconciliationResult, ReminderNotice};
use fundflow_core::utils::time_utils::settlement_date_today;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ReconcileBody {
    /// Defaults to today in the settlement time zone.
    as_of: Option<NaiveDate>,
    override_window: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManualPaymentBody {
    amount: Decimal,
    paid_on: NaiveDate,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SweepBody {
    as_of: Option<NaiveDate>,
}

async fn reconcile(
    Path((fund_id, quarter)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    payload: Option<Json<ReconcileBody>>,
) -> ApiResult<Json<ReconciliationResult>> {
    let quarter = parse_quarter(&quarter)?;
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let as_of = body.as_of.unwrap_or_else(settlement_date_today);
    let result = state
        .reconciliation_service
        .reconcile(&fund_id, quarter, as_of, body.override_window)
        .await?;
    Ok(Json(result))
}

async fn record_manual_payment(
    Path(line_item_id): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ManualPaymentBody>, JsonRejection>,
) -> ApiResult<Json<Payment>> {
    let Json(body) = payload?;
    let payment = state
        .reconciliation_service
        .record_manual_payment(ManualPayment {
            line_item_id,
            amount: body.amount,
            paid_on: body.paid_on,
            transaction_id: body.transaction_id,
            note: body.note,
        })
        .await?;
    Ok(Json(payment))
}

async fn confirm_payment(
    Path(payment_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Payment>> {
    let payment = state
        .reconciliation_service
        .confirm_payment(&payment_id)
        .await?;
    Ok(Json(payment))
}

async fn list_payments(
    Path(fund_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Payment>>> {
    let payments = state.reconciliation_service.list_payments(&fund_id)?;
    Ok(Json(payments))
}

async fn sweep_reminders(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<SweepBody>>,
) -> ApiResult<Json<Vec<ReminderNotice>>> {
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let as_of = body.as_of.unwrap_or_else(settlement_date_today);
    let notices = state.reconciliation_service.reminder_sweep(as_of)?;
    Ok(Json(notices))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/funds/{fund_id}/quarters/{quarter}/reconcile",
            post(reconcile),
        )
        .route("/funds/{fund_id}/payments", get(list_payments))
        .route("/line-items/{id}/payments", post(record_manual_payment))
        .route("/payments/{id}/confirm", post(confirm_payment))
        .route("/reminders/sweep", post(sweep_reminders))
}
