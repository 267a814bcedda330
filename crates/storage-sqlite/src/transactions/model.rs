//! Database model for bank transactions.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use fundflow_core::transactions::{BankTransaction, TransactionDirection};
use fundflow_core::Result;

use crate::utils::{format_date, parse_date, parse_decimal, parse_enum, parse_optional_date};

#[derive(Queryable, Insertable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::bank_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BankTransactionDB {
    pub id: String,
    pub fund_id: String,
    pub transaction_date: String,
    pub value_date: Option<String>,
    pub narration: String,
    pub amount: String,
    pub direction: String,
    pub currency: String,
    pub external_reference: String,
    pub raw_payload: Option<String>,
    pub imported_at: NaiveDateTime,
}

impl From<&BankTransaction> for BankTransactionDB {
    fn from(txn: &BankTransaction) -> Self {
        Self {
            id: txn.id.clone(),
            fund_id: txn.fund_id.clone(),
            transaction_date: format_date(txn.transaction_date),
            value_date: txn.value_date.map(format_date),
            narration: txn.narration.clone(),
            amount: txn.amount.to_string(),
            direction: txn.direction.as_str().to_string(),
            currency: txn.currency.clone(),
            external_reference: txn.external_reference.clone(),
            raw_payload: txn.raw_payload.clone(),
            imported_at: txn.imported_at,
        }
    }
}

impl TryFrom<BankTransactionDB> for BankTransaction {
    type Error = fundflow_core::Error;

    fn try_from(db: BankTransactionDB) -> Result<Self> {
        Ok(Self {
            transaction_date: parse_date(
                "bank_transactions.transaction_date",
                &db.transaction_date,
            )?,
            value_date: parse_optional_date(
                "bank_transactions.value_date",
                db.value_date.as_deref(),
            )?,
            amount: parse_decimal("bank_transactions.amount", &db.amount)?,
            direction: parse_enum(
                "bank_transactions.direction",
                &db.direction,
                TransactionDirection::parse,
            )?,
            id: db.id,
            fund_id: db.fund_id,
            narration: db.narration,
            currency: db.currency,
            external_reference: db.external_reference,
            raw_payload: db.raw_payload,
            imported_at: db.imported_at,
        })
    }
}
