use std::sync::Arc;

use crate::{config::Config, documents::LocalDocumentStore, domain_events::TracingDomainEventSink};
use fundflow_core::{
    allotments::{AllotmentService, AllotmentServiceTrait},
    documents::DocumentStoreTrait,
    drawdowns::{DrawdownService, DrawdownServiceTrait},
    events::DomainEventSink,
    locks::QuarterLocks,
    reconciliation::{ReconciliationService, ReconciliationServiceTrait},
    reports::{ReportService, ReportServiceTrait},
    settings::{SettingsService, SettingsServiceTrait},
    status::{StatusService, StatusServiceTrait},
    transactions::{TransactionService, TransactionServiceTrait},
};
use fundflow_storage_sqlite::{
    db::{self, write_actor},
    AllotmentRepository, DrawdownRepository, PaymentRepository, ProfileRepository,
    ReportRepository, SettingsRepository, TransactionRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub domain_event_sink: Arc<dyn DomainEventSink>,
    pub profile_repository: Arc<ProfileRepository>,
    pub settings_service: Arc<dyn SettingsServiceTrait>,
    pub drawdown_service: Arc<dyn DrawdownServiceTrait>,
    pub status_service: Arc<dyn StatusServiceTrait>,
    pub transaction_service: Arc<dyn TransactionServiceTrait>,
    pub reconciliation_service: Arc<dyn ReconciliationServiceTrait>,
    pub allotment_service: Arc<dyn AllotmentServiceTrait>,
    pub report_service: Arc<dyn ReportServiceTrait>,
    pub document_store: Arc<dyn DocumentStoreTrait>,
}

pub fn init_tracing() {
    let log_format = std::env::var("FF_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    // Ensure DATABASE_URL aligns with FF_DB_PATH so storage picks the right file
    std::env::set_var("DATABASE_URL", &config.db_path);
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let profile_repository = Arc::new(ProfileRepository::new(pool.clone(), writer.clone()));
    let drawdown_repository = Arc::new(DrawdownRepository::new(pool.clone(), writer.clone()));
    let transaction_repository =
        Arc::new(TransactionRepository::new(pool.clone(), writer.clone()));
    let payment_repository = Arc::new(PaymentRepository::new(pool.clone(), writer.clone()));
    let allotment_repository = Arc::new(AllotmentRepository::new(pool.clone(), writer.clone()));
    let report_repository = Arc::new(ReportRepository::new(pool.clone(), writer.clone()));
    let settings_repository = Arc::new(SettingsRepository::new(pool.clone(), writer.clone()));

    let domain_event_sink: Arc<dyn DomainEventSink> = Arc::new(TracingDomainEventSink::new());
    let locks = Arc::new(QuarterLocks::new());

    let settings_service = Arc::new(SettingsService::new(settings_repository));
    let drawdown_service = Arc::new(DrawdownService::new(
        profile_repository.clone(),
        drawdown_repository.clone(),
        domain_event_sink.clone(),
        locks.clone(),
    ));
    let status_service = Arc::new(StatusService::new(
        drawdown_repository.clone(),
        domain_event_sink.clone(),
    ));
    let transaction_service = Arc::new(TransactionService::new(
        profile_repository.clone(),
        transaction_repository.clone(),
        domain_event_sink.clone(),
    ));
    let reconciliation_service = Arc::new(ReconciliationService::new(
        profile_repository.clone(),
        drawdown_repository.clone(),
        transaction_repository,
        payment_repository.clone(),
        settings_service.clone(),
        domain_event_sink.clone(),
        locks.clone(),
    ));
    let allotment_service = Arc::new(AllotmentService::new(
        profile_repository.clone(),
        drawdown_repository.clone(),
        payment_repository.clone(),
        allotment_repository.clone(),
        settings_service.clone(),
        domain_event_sink.clone(),
        locks.clone(),
    ));
    let report_service = Arc::new(ReportService::new(
        profile_repository.clone(),
        drawdown_repository,
        payment_repository,
        allotment_repository,
        report_repository,
        domain_event_sink.clone(),
        locks,
    ));
    let document_store = Arc::new(LocalDocumentStore::new(&config.documents_dir));

    Ok(Arc::new(AppState {
        domain_event_sink,
        profile_repository,
        settings_service,
        drawdown_service,
        status_service,
        transaction_service,
        reconciliation_service,
        allotment_service,
        report_service,
        document_store,
    }))
}
