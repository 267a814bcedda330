//! Database models for drawdowns.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use fundflow_core::drawdowns::{CallBasis, Drawdown, DrawdownLineItem};
use fundflow_core::status::LineItemStatus;
use fundflow_core::Result;

use crate::utils::{format_date, parse_date, parse_decimal, parse_enum, parse_quarter};

#[derive(Queryable, Insertable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::drawdowns)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DrawdownDB {
    pub id: String,
    pub fund_id: String,
    pub quarter: String,
    pub notice_date: String,
    pub due_date: String,
    pub call_mode: String,
    pub call_value: String,
    pub total_called: String,
    pub forecast_next_quarter: String,
    pub forecast_period: String,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Insertable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::drawdown_line_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DrawdownLineItemDB {
    pub id: String,
    pub drawdown_id: String,
    pub fund_id: String,
    pub lp_id: String,
    pub quarter: String,
    pub amount_due: String,
    pub amount_called_up: String,
    pub remaining_commitment: String,
    pub management_fee: String,
    pub stamp_duty: String,
    pub over_committed: bool,
    pub expected_reference: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<&Drawdown> for DrawdownDB {
    fn from(d: &Drawdown) -> Self {
        Self {
            id: d.id.clone(),
            fund_id: d.fund_id.clone(),
            quarter: d.quarter.label(),
            notice_date: format_date(d.notice_date),
            due_date: format_date(d.due_date),
            call_mode: d.call_basis.mode().to_string(),
            call_value: d.call_basis.value().to_string(),
            total_called: d.total_called.to_string(),
            forecast_next_quarter: d.forecast_next_quarter.to_string(),
            forecast_period: d.forecast_period.label(),
            created_at: d.created_at,
        }
    }
}

impl TryFrom<DrawdownDB> for Drawdown {
    type Error = fundflow_core::Error;

    fn try_from(db: DrawdownDB) -> Result<Self> {
        let call_value = parse_decimal("drawdowns.call_value", &db.call_value)?;
        let call_basis = parse_enum("drawdowns.call_mode", &db.call_mode, |mode| {
            CallBasis::from_parts(mode, call_value)
        })?;
        Ok(Self {
            quarter: parse_quarter("drawdowns.quarter", &db.quarter)?,
            notice_date: parse_date("drawdowns.notice_date", &db.notice_date)?,
            due_date: parse_date("drawdowns.due_date", &db.due_date)?,
            call_basis,
            total_called: parse_decimal("drawdowns.total_called", &db.total_called)?,
            forecast_next_quarter: parse_decimal(
                "drawdowns.forecast_next_quarter",
                &db.forecast_next_quarter,
            )?,
            forecast_period: parse_quarter("drawdowns.forecast_period", &db.forecast_period)?,
            id: db.id,
            fund_id: db.fund_id,
            created_at: db.created_at,
        })
    }
}

impl From<&DrawdownLineItem> for DrawdownLineItemDB {
    fn from(item: &DrawdownLineItem) -> Self {
        Self {
            id: item.id.clone(),
            drawdown_id: item.drawdown_id.clone(),
            fund_id: item.fund_id.clone(),
            lp_id: item.lp_id.clone(),
            quarter: item.quarter.label(),
            amount_due: item.amount_due.to_string(),
            amount_called_up: item.amount_called_up.to_string(),
            remaining_commitment: item.remaining_commitment.to_string(),
            management_fee: item.management_fee.to_string(),
            stamp_duty: item.stamp_duty.to_string(),
            over_committed: item.over_committed,
            expected_reference: item.expected_reference.clone(),
            status: item.status.as_str().to_string(),
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

impl TryFrom<DrawdownLineItemDB> for DrawdownLineItem {
    type Error = fundflow_core::Error;

    fn try_from(db: DrawdownLineItemDB) -> Result<Self> {
        Ok(Self {
            quarter: parse_quarter("drawdown_line_items.quarter", &db.quarter)?,
            amount_due: parse_decimal("drawdown_line_items.amount_due", &db.amount_due)?,
            amount_called_up: parse_decimal(
                "drawdown_line_items.amount_called_up",
                &db.amount_called_up,
            )?,
            remaining_commitment: parse_decimal(
                "drawdown_line_items.remaining_commitment",
                &db.remaining_commitment,
            )?,
            management_fee: parse_decimal(
                "drawdown_line_items.management_fee",
                &db.management_fee,
            )?,
            stamp_duty: parse_decimal("drawdown_line_items.stamp_duty", &db.stamp_duty)?,
            status: parse_enum(
                "drawdown_line_items.status",
                &db.status,
                LineItemStatus::parse,
            )?,
            id: db.id,
            drawdown_id: db.drawdown_id,
            fund_id: db.fund_id,
            lp_id: db.lp_id,
            over_committed: db.over_committed,
            expected_reference: db.expected_reference,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
