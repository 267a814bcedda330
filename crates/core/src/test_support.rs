//! Fixtures shared by the service tests.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::allotments::AllotmentService;
use crate::drawdowns::{
    CallSpec, DrawdownCalculation, DrawdownRequest, DrawdownService, DrawdownServiceTrait,
};
use crate::events::MockDomainEventSink;
use crate::funds::{DepositoryDetails, Fund, Holder, LimitedPartner, LpStatus};
use crate::ledger::InMemoryLedger;
use crate::locks::QuarterLocks;
use crate::reconciliation::ReconciliationService;
use crate::reports::ReportService;
use crate::settings::SettingsService;
use crate::status::StatusService;
use crate::transactions::{StatementRow, TransactionDirection, TransactionService};
use crate::utils::FiscalQuarter;

pub const FUND_ID: &str = "fund-1";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// FY26Q2 (Jul-Sep 2025).
pub fn quarter() -> FiscalQuarter {
    "FY26Q2".parse().unwrap()
}

pub fn limited_partner(id: &str, name: &str, commitment: Decimal, geography: &str) -> LimitedPartner {
    LimitedPartner {
        id: id.to_string(),
        fund_id: FUND_ID.to_string(),
        display_name: name.to_string(),
        email: Some(format!("{id}@example.com")),
        commitment,
        currency: "INR".to_string(),
        geography: geography.to_string(),
        investor_type: "Corporate".to_string(),
        status: LpStatus::Active,
        depository: DepositoryDetails {
            client_id: Some(format!("CL-{id}")),
            dp_id: Some(format!("IN30{id}")),
            depository: Some("NSDL".to_string()),
            holders: vec![Holder {
                name: name.to_string(),
                pan: None,
            }],
        },
    }
}

pub fn credit(reference: &str, narration: &str, amount: Decimal, on: NaiveDate) -> StatementRow {
    StatementRow {
        external_reference: Some(reference.to_string()),
        transaction_date: Some(on),
        value_date: Some(on),
        narration: Some(narration.to_string()),
        amount: Some(amount),
        direction: Some(TransactionDirection::Credit),
        currency: None,
        raw: None,
    }
}

/// Every service wired to one in-memory ledger.
pub struct Harness {
    pub ledger: Arc<InMemoryLedger>,
    pub events: Arc<MockDomainEventSink>,
    pub drawdowns: DrawdownService,
    pub status: StatusService,
    pub transactions: TransactionService,
    pub settings: Arc<SettingsService>,
    pub reconciliation: ReconciliationService,
    pub allotments: AllotmentService,
    pub reports: ReportService,
}

impl Harness {
    /// Fund with three LPs: two domestic, one from Singapore.
    pub fn new() -> Self {
        let ledger = Arc::new(InMemoryLedger::new());
        let events = Arc::new(MockDomainEventSink::new());
        let locks = Arc::new(QuarterLocks::new());
        let settings = Arc::new(SettingsService::new(ledger.clone()));

        let mut fund = Fund::with_defaults(FUND_ID, "Fund One");
        fund.initial_close_date = Some(date(2025, 9, 1));
        ledger.upsert_fund(fund).unwrap();
        for lp in [
            limited_partner("lp-a", "Main Street Capital", dec!(10000000), "India"),
            limited_partner("lp-b", "Harbor Family Office", dec!(5000000), "India"),
            limited_partner("lp-c", "Lion City Ventures", dec!(2000000), "Singapore"),
        ] {
            ledger.upsert_limited_partner(lp).unwrap();
        }

        Self {
            drawdowns: DrawdownService::new(
                ledger.clone(),
                ledger.clone(),
                events.clone(),
                locks.clone(),
            ),
            status: StatusService::new(ledger.clone(), events.clone()),
            transactions: TransactionService::new(ledger.clone(), ledger.clone(), events.clone()),
            reconciliation: ReconciliationService::new(
                ledger.clone(),
                ledger.clone(),
                ledger.clone(),
                ledger.clone(),
                settings.clone(),
                events.clone(),
                locks.clone(),
            ),
            allotments: AllotmentService::new(
                ledger.clone(),
                ledger.clone(),
                ledger.clone(),
                ledger.clone(),
                settings.clone(),
                events.clone(),
                locks.clone(),
            ),
            reports: ReportService::new(
                ledger.clone(),
                ledger.clone(),
                ledger.clone(),
                ledger.clone(),
                ledger.clone(),
                events.clone(),
                locks,
            ),
            settings,
            ledger,
            events,
        }
    }

    pub fn request(&self, quarter: FiscalQuarter, call_spec: CallSpec) -> DrawdownRequest {
        DrawdownRequest {
            fund_id: FUND_ID.to_string(),
            quarter,
            notice_date: date(2025, 6, 15),
            due_date: date(2025, 6, 30),
            call_spec,
            forecast_next_quarter: None,
            preview: false,
        }
    }

    /// Issues a 10% call for FY26Q2, due 2025-06-30.
    pub async fn issue_ten_percent(&self) -> DrawdownCalculation {
        self.drawdowns
            .calculate_drawdown(self.request(quarter(), CallSpec::percentage(dec!(10))))
            .await
            .unwrap()
    }
}
