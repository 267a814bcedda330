use std::sync::Arc;

use axum::{http::HeaderName, routing::get, Router};
use fundflow_core::FiscalQuarter;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

mod allotments;
mod drawdowns;
mod funds;
mod reconciliation;
mod reports;
mod settings;
mod status;
mod transactions;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn healthz() -> &'static str {
    "ok"
}

/// Parses the `{quarter}` path segment (`FY26Q2`, or the legacy `Q2'26`).
pub(crate) fn parse_quarter(label: &str) -> ApiResult<FiscalQuarter> {
    label.parse::<FiscalQuarter>().map_err(ApiError::from)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allow.iter().any(|o| o == "*") {
        return CorsLayer::new().allow_origin(Any);
    }
    let origins = config
        .cors_allow
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", o);
                None
            }
        })
        .collect::<Vec<_>>();
    CorsLayer::new().allow_origin(origins)
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let api = Router::new()
        .route("/healthz", get(healthz))
        .merge(funds::router())
        .merge(settings::router())
        .merge(drawdowns::router())
        .merge(status::router())
        .merge(transactions::router())
        .merge(reconciliation::router())
        .merge(allotments::router())
        .merge(reports::router())
        .with_state(state);

    Router::new()
        .nest("/api/v1", api)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(cors_layer(config))
}
