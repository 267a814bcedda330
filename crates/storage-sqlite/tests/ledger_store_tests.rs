//! Runs the settlement services against a real SQLite file.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

use fundflow_core::allotments::{AllotmentRequest, AllotmentService, AllotmentServiceTrait};
use fundflow_core::drawdowns::{
    CallSpec, DrawdownCalculation, DrawdownRepositoryTrait, DrawdownRequest, DrawdownService,
    DrawdownServiceTrait,
};
use fundflow_core::events::MockDomainEventSink;
use fundflow_core::funds::{
    DepositoryDetails, Fund, Holder, LimitedPartner, LpStatus, ProfileReaderTrait,
};
use fundflow_core::locks::QuarterLocks;
use fundflow_core::reconciliation::{
    MatchMethod, Payment, PaymentRepositoryTrait, PaymentStatus, ReconciliationService,
    ReconciliationServiceTrait, SettlementBatch,
};
use fundflow_core::reports::{
    OperatorInputs, ReportKind, ReportRepositoryTrait, ReportRequest, ReportService,
    ReportServiceTrait, ReportStatus,
};
use fundflow_core::settings::{SettingsRepositoryTrait, SettingsService};
use fundflow_core::status::{LineItemStatus, StatusUpdate};
use fundflow_core::transactions::{
    StatementRow, TransactionDirection, TransactionService, TransactionServiceTrait,
};
use fundflow_core::FiscalQuarter;
use fundflow_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, AllotmentRepository, DrawdownRepository,
    PaymentRepository, ProfileRepository, ReportRepository, SettingsRepository,
    TransactionRepository,
};

const FUND_ID: &str = "fund-1";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn quarter() -> FiscalQuarter {
    "FY26Q2".parse().unwrap()
}

fn limited_partner(id: &str, name: &str, commitment: Decimal, geography: &str) -> LimitedPartner {
    LimitedPartner {
        id: id.to_string(),
        fund_id: FUND_ID.to_string(),
        display_name: name.to_string(),
        email: None,
        commitment,
        currency: "INR".to_string(),
        geography: geography.to_string(),
        investor_type: "Corporate".to_string(),
        status: LpStatus::Active,
        depository: DepositoryDetails {
            client_id: Some(format!("CL-{id}")),
            dp_id: Some(format!("IN30{id}")),
            depository: Some("NSDL".to_string()),
            holders: vec![
                Holder {
                    name: name.to_string(),
                    pan: Some("ABCDE1234F".to_string()),
                },
                Holder {
                    name: format!("{name} Trustee"),
                    pan: None,
                },
            ],
        },
    }
}

fn credit(reference: &str, narration: &str, amount: Decimal, on: NaiveDate) -> StatementRow {
    StatementRow {
        external_reference: Some(reference.to_string()),
        transaction_date: Some(on),
        value_date: None,
        narration: Some(narration.to_string()),
        amount: Some(amount),
        direction: Some(TransactionDirection::Credit),
        currency: None,
        raw: None,
    }
}

struct Store {
    _dir: TempDir,
    profiles: Arc<ProfileRepository>,
    drawdown_repo: Arc<DrawdownRepository>,
    payment_repo: Arc<PaymentRepository>,
    report_repo: Arc<ReportRepository>,
    settings_repo: Arc<SettingsRepository>,
    drawdowns: DrawdownService,
    transactions: TransactionService,
    reconciliation: ReconciliationService,
    allotments: AllotmentService,
    reports: ReportService,
}

impl Store {
    async fn open() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = init(dir.path().to_str().unwrap()).unwrap();
        let pool = create_pool(&db_path).unwrap();
        run_migrations(&pool).unwrap();
        let writer = spawn_writer((*pool).clone());

        let profiles = Arc::new(ProfileRepository::new(pool.clone(), writer.clone()));
        let drawdown_repo = Arc::new(DrawdownRepository::new(pool.clone(), writer.clone()));
        let transaction_repo = Arc::new(TransactionRepository::new(pool.clone(), writer.clone()));
        let payment_repo = Arc::new(PaymentRepository::new(pool.clone(), writer.clone()));
        let allotment_repo = Arc::new(AllotmentRepository::new(pool.clone(), writer.clone()));
        let report_repo = Arc::new(ReportRepository::new(pool.clone(), writer.clone()));
        let settings_repo = Arc::new(SettingsRepository::new(pool.clone(), writer));
        let settings = Arc::new(SettingsService::new(settings_repo.clone()));
        let events = Arc::new(MockDomainEventSink::new());
        let locks = Arc::new(QuarterLocks::new());

        let mut fund = Fund::with_defaults(FUND_ID, "Fund One");
        fund.initial_close_date = Some(date(2025, 9, 1));
        profiles.upsert_fund(fund).await.unwrap();
        for lp in [
            limited_partner("lp-a", "Main Street Capital", dec!(10000000), "India"),
            limited_partner("lp-b", "Harbor Family Office", dec!(5000000), "India"),
            limited_partner("lp-c", "Lion City Ventures", dec!(2000000), "Singapore"),
        ] {
            profiles.upsert_limited_partner(lp).await.unwrap();
        }

        Self {
            drawdowns: DrawdownService::new(
                profiles.clone(),
                drawdown_repo.clone(),
                events.clone(),
                locks.clone(),
            ),
            transactions: TransactionService::new(
                profiles.clone(),
                transaction_repo.clone(),
                events.clone(),
            ),
            reconciliation: ReconciliationService::new(
                profiles.clone(),
                drawdown_repo.clone(),
                transaction_repo,
                payment_repo.clone(),
                settings.clone(),
                events.clone(),
                locks.clone(),
            ),
            allotments: AllotmentService::new(
                profiles.clone(),
                drawdown_repo.clone(),
                payment_repo.clone(),
                allotment_repo.clone(),
                settings,
                events.clone(),
                locks.clone(),
            ),
            reports: ReportService::new(
                profiles.clone(),
                drawdown_repo.clone(),
                payment_repo.clone(),
                allotment_repo,
                report_repo.clone(),
                events,
                locks,
            ),
            _dir: dir,
            profiles,
            drawdown_repo,
            payment_repo,
            report_repo,
            settings_repo,
        }
    }

    async fn issue_ten_percent(&self) -> DrawdownCalculation {
        self.drawdowns
            .calculate_drawdown(DrawdownRequest {
                fund_id: FUND_ID.to_string(),
                quarter: quarter(),
                notice_date: date(2025, 6, 15),
                due_date: date(2025, 6, 30),
                call_spec: CallSpec::percentage(dec!(10)),
                forecast_next_quarter: None,
                preview: false,
            })
            .await
            .unwrap()
    }
}

fn item_id(calc: &DrawdownCalculation, lp_id: &str) -> String {
    calc.line_items
        .iter()
        .find(|i| i.lp_id == lp_id)
        .map(|i| i.id.clone())
        .unwrap()
}

#[tokio::test]
async fn test_profiles_round_trip() {
    let store = Store::open().await;

    let fund = store.profiles.get_fund(FUND_ID).unwrap();
    assert_eq!(fund.stamp_duty_rate, dec!(0.00005));
    assert_eq!(fund.initial_close_date, Some(date(2025, 9, 1)));

    let lps = store.profiles.list_limited_partners(FUND_ID).unwrap();
    assert_eq!(lps.len(), 3);
    let c = store.profiles.get_limited_partner("lp-c").unwrap();
    assert_eq!(c.commitment, dec!(2000000));
    assert_eq!(c.depository.holders.len(), 2);
    assert_eq!(c.depository.holders[0].pan.as_deref(), Some("ABCDE1234F"));

    let mut renamed = c.clone();
    renamed.display_name = "Lion City Ventures Pte".to_string();
    renamed.status = LpStatus::Inactive;
    store.profiles.upsert_limited_partner(renamed).await.unwrap();
    let c = store.profiles.get_limited_partner("lp-c").unwrap();
    assert_eq!(c.display_name, "Lion City Ventures Pte");
    assert_eq!(c.status, LpStatus::Inactive);

    assert!(store.profiles.get_fund("fund-x").unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_drawdown_persists_exact_amounts() {
    let store = Store::open().await;
    let calc = store.issue_ten_percent().await;

    let stored = store.drawdown_repo.get_drawdown(&calc.drawdown.id).unwrap();
    assert_eq!(stored.total_called, dec!(1700000));
    assert_eq!(stored.call_basis, calc.drawdown.call_basis);
    assert_eq!(stored.quarter, quarter());

    let items = store.drawdown_repo.list_line_items(&calc.drawdown.id).unwrap();
    let lp_ids: Vec<&str> = items.iter().map(|i| i.lp_id.as_str()).collect();
    assert_eq!(lp_ids, vec!["lp-a", "lp-b", "lp-c"]);
    assert_eq!(items[0].management_fee, dec!(118000));
    assert_eq!(items[0].stamp_duty, dec!(50));
    assert_eq!(items[0].status, LineItemStatus::NoticePending);
}

#[tokio::test]
async fn test_full_quarter_on_sqlite() {
    let store = Store::open().await;
    let calc = store.issue_ten_percent().await;

    let statement = vec![
        credit("UTR100", "NEFT/MAIN STREET CAPITAL/DRAWDOWN", dec!(1000000), date(2025, 6, 25)),
        credit("UTR102", "SWIFT LION CITY VENTURES PTE", dec!(200000), date(2025, 6, 28)),
    ];
    let summary = store
        .transactions
        .import_transactions(FUND_ID, statement.clone())
        .await
        .unwrap();
    assert_eq!(summary.imported, 2);
    let again = store
        .transactions
        .import_transactions(FUND_ID, statement)
        .await
        .unwrap();
    assert_eq!(again.imported, 0);
    assert_eq!(again.skipped_duplicates, 2);

    let result = store
        .reconciliation
        .reconcile(FUND_ID, quarter(), date(2025, 7, 3), false)
        .await
        .unwrap();
    assert_eq!(result.total_received, dec!(1200000));
    let links = store.payment_repo.linked_transactions(FUND_ID).unwrap();
    assert_eq!(links.len(), 2);

    let a = store.drawdown_repo.get_line_item(&item_id(&calc, "lp-a")).unwrap();
    assert_eq!(a.status, LineItemStatus::AllotmentPending);

    let batch = store
        .allotments
        .allot_units(AllotmentRequest {
            fund_id: FUND_ID.to_string(),
            quarter: quarter(),
            allotment_date: date(2025, 7, 15),
            line_item_ids: None,
        })
        .await
        .unwrap();
    assert_eq!(batch.total_units, 12000);
    let current = store
        .allotments
        .list_current_allotments(FUND_ID, &quarter())
        .unwrap();
    assert_eq!(current.len(), 2);
    assert_eq!(current[0].depository.holders.len(), 2);

    let snapshot = store
        .reports
        .generate_report(ReportRequest {
            fund_id: FUND_ID.to_string(),
            quarter: quarter(),
            kind: ReportKind::Invi,
            inputs: OperatorInputs::default(),
        })
        .await
        .unwrap();
    let stored = store.reports.get_report(&snapshot.id).unwrap();
    assert_eq!(stored.figures, snapshot.figures);
    assert_eq!(stored.checksum, snapshot.checksum);

    store
        .reports
        .set_report_status(&snapshot.id, ReportStatus::Filed)
        .await
        .unwrap();
    let c = store.drawdown_repo.get_line_item(&item_id(&calc, "lp-c")).unwrap();
    assert_eq!(c.status, LineItemStatus::InviFiled);
    assert_eq!(
        store.report_repo.latest_version(FUND_ID, &quarter(), ReportKind::Invi).unwrap(),
        Some(1)
    );
}

#[tokio::test]
async fn test_stale_status_rolls_back_the_whole_batch() {
    let store = Store::open().await;
    let calc = store.issue_ten_percent().await;
    let a_id = item_id(&calc, "lp-a");

    let payment = Payment {
        id: "pay-1".to_string(),
        fund_id: FUND_ID.to_string(),
        lp_id: "lp-a".to_string(),
        line_item_id: a_id.clone(),
        transaction_ids: vec![],
        expected_amount: dec!(1000000),
        received_amount: dec!(1000000),
        method: MatchMethod::Manual,
        status: PaymentStatus::Paid,
        paid_on: date(2025, 6, 28),
        note: None,
        matched_at: Utc::now().naive_utc(),
    };
    let err = store
        .payment_repo
        .apply_settlement(SettlementBatch {
            new_payments: vec![payment],
            confirmations: vec![],
            status_updates: vec![StatusUpdate {
                line_item_id: a_id.clone(),
                from: LineItemStatus::Sent,
                to: LineItemStatus::AllotmentPending,
            }],
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ConcurrentModification");
    assert_eq!(err.entity_ids(), vec![a_id.clone()]);

    assert!(store.payment_repo.list_payments_for_fund(FUND_ID).unwrap().is_empty());
    let a = store.drawdown_repo.get_line_item(&a_id).unwrap();
    assert_eq!(a.status, LineItemStatus::NoticePending);
}

#[tokio::test]
async fn test_report_versions_are_unique() {
    let store = Store::open().await;
    let request = ReportRequest {
        fund_id: FUND_ID.to_string(),
        quarter: quarter(),
        kind: ReportKind::Sebi,
        inputs: OperatorInputs::default(),
    };
    let first = store.reports.generate_report(request).await.unwrap();

    let mut clash = first.clone();
    clash.id = "another-id".to_string();
    let err = store.report_repo.insert_snapshot(clash).await.unwrap_err();
    assert_eq!(err.kind(), "ConstraintViolation");

    let err = store
        .report_repo
        .update_status(
            first.id.clone(),
            ReportStatus::Reviewed,
            ReportStatus::Filed,
            vec![],
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ConstraintViolation");
}

#[tokio::test]
async fn test_settings_are_replaced_in_place() {
    let store = Store::open().await;
    assert!(store
        .settings_repo
        .get_setting("settlement:fund-1")
        .unwrap_err()
        .is_not_found());

    store
        .settings_repo
        .update_setting("settlement:fund-1", "{\"matchTolerance\":50}")
        .await
        .unwrap();
    store
        .settings_repo
        .update_setting("settlement:fund-1", "{\"matchTolerance\":100}")
        .await
        .unwrap();
    assert_eq!(
        store.settings_repo.get_setting("settlement:fund-1").unwrap(),
        "{\"matchTolerance\":100}"
    );
}
