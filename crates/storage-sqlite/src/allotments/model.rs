//! Database models for allotments.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use fundflow_core::allotments::{Allotment, AllotmentReversal};
use fundflow_core::funds::{DepositoryDetails, Holder};
use fundflow_core::settings::OverpaymentPolicy;
use fundflow_core::Result;

use crate::errors::StorageError;
use crate::utils::{format_date, parse_date, parse_decimal, parse_enum, parse_quarter};

#[derive(Queryable, Insertable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::allotments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AllotmentDB {
    pub id: String,
    pub fund_id: String,
    pub drawdown_id: String,
    pub line_item_id: String,
    pub lp_id: String,
    pub lp_name: String,
    pub quarter: String,
    pub allotment_date: String,
    pub committed_amount: String,
    pub amount_due: String,
    pub amount_received: String,
    pub amount_accepted: String,
    pub excess_amount: String,
    pub excess_treatment: String,
    pub management_fee: String,
    pub stamp_duty: String,
    pub nav: String,
    pub units: i64,
    pub client_id: Option<String>,
    pub dp_id: Option<String>,
    pub depository: Option<String>,
    pub holders: String,
    pub replaces_allotment_id: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Insertable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::allotment_reversals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AllotmentReversalDB {
    pub id: String,
    pub allotment_id: String,
    pub replacement_allotment_id: String,
    pub reason: String,
    pub reversed_at: NaiveDateTime,
}

impl TryFrom<&Allotment> for AllotmentDB {
    type Error = StorageError;

    fn try_from(a: &Allotment) -> std::result::Result<Self, StorageError> {
        Ok(Self {
            id: a.id.clone(),
            fund_id: a.fund_id.clone(),
            drawdown_id: a.drawdown_id.clone(),
            line_item_id: a.line_item_id.clone(),
            lp_id: a.lp_id.clone(),
            lp_name: a.lp_name.clone(),
            quarter: a.quarter.label(),
            allotment_date: format_date(a.allotment_date),
            committed_amount: a.committed_amount.to_string(),
            amount_due: a.amount_due.to_string(),
            amount_received: a.amount_received.to_string(),
            amount_accepted: a.amount_accepted.to_string(),
            excess_amount: a.excess_amount.to_string(),
            excess_treatment: a.excess_treatment.as_str().to_string(),
            management_fee: a.management_fee.to_string(),
            stamp_duty: a.stamp_duty.to_string(),
            nav: a.nav.to_string(),
            units: a.units,
            client_id: a.depository.client_id.clone(),
            dp_id: a.depository.dp_id.clone(),
            depository: a.depository.depository.clone(),
            holders: serde_json::to_string(&a.depository.holders)?,
            replaces_allotment_id: a.replaces_allotment_id.clone(),
            created_at: a.created_at,
        })
    }
}

impl TryFrom<AllotmentDB> for Allotment {
    type Error = fundflow_core::Error;

    fn try_from(db: AllotmentDB) -> Result<Self> {
        let holders: Vec<Holder> =
            serde_json::from_str(&db.holders).map_err(StorageError::from)?;
        Ok(Self {
            quarter: parse_quarter("allotments.quarter", &db.quarter)?,
            allotment_date: parse_date("allotments.allotment_date", &db.allotment_date)?,
            committed_amount: parse_decimal("allotments.committed_amount", &db.committed_amount)?,
            amount_due: parse_decimal("allotments.amount_due", &db.amount_due)?,
            amount_received: parse_decimal("allotments.amount_received", &db.amount_received)?,
            amount_accepted: parse_decimal("allotments.amount_accepted", &db.amount_accepted)?,
            excess_amount: parse_decimal("allotments.excess_amount", &db.excess_amount)?,
            excess_treatment: parse_enum(
                "allotments.excess_treatment",
                &db.excess_treatment,
                OverpaymentPolicy::parse,
            )?,
            management_fee: parse_decimal("allotments.management_fee", &db.management_fee)?,
            stamp_duty: parse_decimal("allotments.stamp_duty", &db.stamp_duty)?,
            nav: parse_decimal("allotments.nav", &db.nav)?,
            depository: DepositoryDetails {
                client_id: db.client_id,
                dp_id: db.dp_id,
                depository: db.depository,
                holders,
            },
            id: db.id,
            fund_id: db.fund_id,
            drawdown_id: db.drawdown_id,
            line_item_id: db.line_item_id,
            lp_id: db.lp_id,
            lp_name: db.lp_name,
            units: db.units,
            replaces_allotment_id: db.replaces_allotment_id,
            created_at: db.created_at,
        })
    }
}

impl From<&AllotmentReversal> for AllotmentReversalDB {
    fn from(r: &AllotmentReversal) -> Self {
        Self {
            id: r.id.clone(),
            allotment_id: r.allotment_id.clone(),
            replacement_allotment_id: r.replacement_allotment_id.clone(),
            reason: r.reason.clone(),
            reversed_at: r.reversed_at,
        }
    }
}

impl From<AllotmentReversalDB> for AllotmentReversal {
    fn from(db: AllotmentReversalDB) -> Self {
        Self {
            id: db.id,
            allotment_id: db.allotment_id,
            replacement_allotment_id: db.replacement_allotment_id,
            reason: db.reason,
            reversed_at: db.reversed_at,
        }
    }
}
