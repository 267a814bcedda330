use async_trait::async_trait;
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use fundflow_core::errors::Result;
use fundflow_core::transactions::{BankTransaction, InsertOutcome, TransactionRepositoryTrait};

use super::model::BankTransactionDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{not_found_or, StorageError};
use crate::schema::bank_transactions;

pub struct TransactionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        TransactionRepository { pool, writer }
    }
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    fn get_transaction(&self, transaction_id: &str) -> Result<BankTransaction> {
        let mut conn = get_connection(&self.pool)?;
        let row = bank_transactions::table
            .find(transaction_id)
            .select(BankTransactionDB::as_select())
            .first::<BankTransactionDB>(&mut conn)
            .map_err(|e| not_found_or("transaction", transaction_id, e))?;
        BankTransaction::try_from(row)
    }

    fn list_transactions(&self, fund_id: &str) -> Result<Vec<BankTransaction>> {
        let mut conn = get_connection(&self.pool)?;
        bank_transactions::table
            .filter(bank_transactions::fund_id.eq(fund_id))
            .order((
                bank_transactions::transaction_date.asc(),
                bank_transactions::imported_at.asc(),
                bank_transactions::external_reference.asc(),
            ))
            .select(BankTransactionDB::as_select())
            .load::<BankTransactionDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(BankTransaction::try_from)
            .collect()
    }

    /// Inserts each row unless its reference is already on the ledger for the
    /// fund. The unique index makes the skip safe under concurrent imports.
    async fn insert_transactions(
        &self,
        transactions: Vec<BankTransaction>,
    ) -> Result<Vec<InsertOutcome>> {
        let rows: Vec<BankTransactionDB> =
            transactions.iter().map(BankTransactionDB::from).collect();
        self.writer
            .exec(move |conn| {
                let mut outcomes = Vec::with_capacity(rows.len());
                for row in &rows {
                    let inserted = diesel::insert_into(bank_transactions::table)
                        .values(row)
                        .on_conflict((
                            bank_transactions::fund_id,
                            bank_transactions::external_reference,
                        ))
                        .do_nothing()
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    if inserted == 0 {
                        debug!(
                            "Skipping duplicate reference {} for fund {}",
                            row.external_reference, row.fund_id
                        );
                        outcomes.push(InsertOutcome::Duplicate);
                    } else {
                        outcomes.push(InsertOutcome::Inserted);
                    }
                }
                Ok(outcomes)
            })
            .await
    }
}
