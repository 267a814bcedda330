//! Allotment models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::funds::DepositoryDetails;
use crate::settings::OverpaymentPolicy;
use crate::utils::FiscalQuarter;

/// Units issued to an LP against a fully paid line item.
///
/// Never modified after insert. A correction reverses it and issues a
/// replacement that points back through `replaces_allotment_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Allotment {
    pub id: String,
    pub fund_id: String,
    pub drawdown_id: String,
    pub line_item_id: String,
    pub lp_id: String,
    pub lp_name: String,
    pub quarter: FiscalQuarter,
    pub allotment_date: NaiveDate,
    pub committed_amount: Decimal,
    pub amount_due: Decimal,
    pub amount_received: Decimal,
    pub amount_accepted: Decimal,
    pub excess_amount: Decimal,
    pub excess_treatment: OverpaymentPolicy,
    pub management_fee: Decimal,
    pub stamp_duty: Decimal,
    pub nav: Decimal,
    pub units: i64,
    /// Copied from the LP profile when the allotment was made.
    pub depository: DepositoryDetails,
    pub replaces_allotment_id: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Marks an allotment as superseded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllotmentReversal {
    pub id: String,
    pub allotment_id: String,
    pub replacement_allotment_id: String,
    pub reason: String,
    pub reversed_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllotmentRequest {
    pub fund_id: String,
    pub quarter: FiscalQuarter,
    pub allotment_date: NaiveDate,
    /// Restrict to these line items. Every one must be fully paid.
    #[serde(default)]
    pub line_item_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReissueRequest {
    pub reason: String,
    pub allotment_date: NaiveDate,
}

/// Allotments issued together, as rendered on the allotment sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllotmentBatch {
    pub fund_id: String,
    pub quarter: FiscalQuarter,
    pub allotment_date: NaiveDate,
    pub nav: Decimal,
    pub allotments: Vec<Allotment>,
    pub total_units: i64,
    pub total_accepted: Decimal,
}

impl AllotmentBatch {
    pub fn new(
        fund_id: String,
        quarter: FiscalQuarter,
        allotment_date: NaiveDate,
        nav: Decimal,
        allotments: Vec<Allotment>,
    ) -> Self {
        let total_units = allotments.iter().map(|a| a.units).sum();
        let total_accepted = allotments.iter().map(|a| a.amount_accepted).sum();
        Self {
            fund_id,
            quarter,
            allotment_date,
            nav,
            allotments,
            total_units,
            total_accepted,
        }
    }
}
