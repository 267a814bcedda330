//! Database models for payments.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use fundflow_core::reconciliation::{MatchMethod, Payment, PaymentStatus};
use fundflow_core::Result;

use crate::utils::{format_date, parse_date, parse_decimal, parse_enum};

#[derive(Queryable, Insertable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PaymentDB {
    pub id: String,
    pub fund_id: String,
    pub lp_id: String,
    pub line_item_id: String,
    pub expected_amount: String,
    pub received_amount: String,
    pub method: String,
    pub status: String,
    pub paid_on: String,
    pub note: Option<String>,
    pub matched_at: NaiveDateTime,
}

/// Link from a bank transaction to the payment it backs.
#[derive(Queryable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::payment_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PaymentTransactionDB {
    pub transaction_id: String,
    pub payment_id: String,
}

impl From<&Payment> for PaymentDB {
    fn from(p: &Payment) -> Self {
        Self {
            id: p.id.clone(),
            fund_id: p.fund_id.clone(),
            lp_id: p.lp_id.clone(),
            line_item_id: p.line_item_id.clone(),
            expected_amount: p.expected_amount.to_string(),
            received_amount: p.received_amount.to_string(),
            method: p.method.as_str().to_string(),
            status: p.status.as_str().to_string(),
            paid_on: format_date(p.paid_on),
            note: p.note.clone(),
            matched_at: p.matched_at,
        }
    }
}

impl PaymentDB {
    pub fn into_domain(self, transaction_ids: Vec<String>) -> Result<Payment> {
        Ok(Payment {
            expected_amount: parse_decimal("payments.expected_amount", &self.expected_amount)?,
            received_amount: parse_decimal("payments.received_amount", &self.received_amount)?,
            method: parse_enum("payments.method", &self.method, MatchMethod::parse)?,
            status: parse_enum("payments.status", &self.status, PaymentStatus::parse)?,
            paid_on: parse_date("payments.paid_on", &self.paid_on)?,
            id: self.id,
            fund_id: self.fund_id,
            lp_id: self.lp_id,
            line_item_id: self.line_item_id,
            transaction_ids,
            note: self.note,
            matched_at: self.matched_at,
        })
    }
}
