use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;

use fundflow_core::drawdowns::DrawdownLineItem;
use fundflow_core::errors::{DatabaseError, Result};
use fundflow_core::reconciliation::{Payment, PaymentRepositoryTrait, SettlementBatch};

use super::model::{PaymentDB, PaymentTransactionDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::drawdowns::apply_status_updates;
use crate::errors::{not_found_or, StorageError};
use crate::schema::{payment_transactions, payments};
use crate::utils::chunk_for_sqlite;

pub struct PaymentRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PaymentRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        PaymentRepository { pool, writer }
    }
}

/// Attaches transaction ids to loaded payment rows.
fn hydrate(conn: &mut SqliteConnection, rows: Vec<PaymentDB>) -> Result<Vec<Payment>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut links: HashMap<String, Vec<String>> = HashMap::new();
    for chunk in chunk_for_sqlite(&ids) {
        let chunk_links = payment_transactions::table
            .filter(payment_transactions::payment_id.eq_any(chunk))
            .order(payment_transactions::transaction_id.asc())
            .select(PaymentTransactionDB::as_select())
            .load::<PaymentTransactionDB>(conn)
            .map_err(StorageError::from)?;
        for link in chunk_links {
            links
                .entry(link.payment_id)
                .or_default()
                .push(link.transaction_id);
        }
    }
    rows.into_iter()
        .map(|row| {
            let txn_ids = links.remove(&row.id).unwrap_or_default();
            row.into_domain(txn_ids)
        })
        .collect()
}

#[async_trait]
impl PaymentRepositoryTrait for PaymentRepository {
    fn get_payment(&self, payment_id: &str) -> Result<Payment> {
        let mut conn = get_connection(&self.pool)?;
        let row = payments::table
            .find(payment_id)
            .select(PaymentDB::as_select())
            .first::<PaymentDB>(&mut conn)
            .map_err(|e| not_found_or("payment", payment_id, e))?;
        let mut hydrated = hydrate(&mut conn, vec![row])?;
        hydrated.pop().ok_or_else(|| {
            DatabaseError::NotFound(format!("payment {}", payment_id)).into()
        })
    }

    fn list_payments_for_fund(&self, fund_id: &str) -> Result<Vec<Payment>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = payments::table
            .filter(payments::fund_id.eq(fund_id))
            .order((payments::matched_at.asc(), payments::id.asc()))
            .select(PaymentDB::as_select())
            .load::<PaymentDB>(&mut conn)
            .map_err(StorageError::from)?;
        hydrate(&mut conn, rows)
    }

    fn list_payments_for_line_items(&self, line_item_ids: &[String]) -> Result<Vec<Payment>> {
        let mut conn = get_connection(&self.pool)?;
        let mut rows = Vec::new();
        for chunk in chunk_for_sqlite(line_item_ids) {
            rows.extend(
                payments::table
                    .filter(payments::line_item_id.eq_any(chunk))
                    .select(PaymentDB::as_select())
                    .load::<PaymentDB>(&mut conn)
                    .map_err(StorageError::from)?,
            );
        }
        rows.sort_by(|a, b| (a.matched_at, &a.id).cmp(&(b.matched_at, &b.id)));
        hydrate(&mut conn, rows)
    }

    fn linked_transactions(&self, fund_id: &str) -> Result<HashMap<String, String>> {
        let mut conn = get_connection(&self.pool)?;
        let links = payment_transactions::table
            .inner_join(payments::table)
            .filter(payments::fund_id.eq(fund_id))
            .select((
                payment_transactions::transaction_id,
                payment_transactions::payment_id,
            ))
            .load::<(String, String)>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(links.into_iter().collect())
    }

    /// Writes payments, links, confirmations and status moves in one
    /// transaction. A transaction already backing a payment fails the batch.
    async fn apply_settlement(&self, batch: SettlementBatch) -> Result<Vec<DrawdownLineItem>> {
        self.writer
            .exec(move |conn| {
                for payment in &batch.new_payments {
                    for txn_id in &payment.transaction_ids {
                        let existing = payment_transactions::table
                            .find(txn_id)
                            .select(payment_transactions::payment_id)
                            .first::<String>(conn)
                            .optional()
                            .map_err(StorageError::from)?;
                        if let Some(existing) = existing {
                            return Err(DatabaseError::UniqueViolation(format!(
                                "transaction {} already backs payment {}",
                                txn_id, existing
                            ))
                            .into());
                        }
                    }
                }

                let changed = apply_status_updates(conn, &batch.status_updates)?;

                for payment in &batch.new_payments {
                    diesel::insert_into(payments::table)
                        .values(PaymentDB::from(payment))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    let links: Vec<PaymentTransactionDB> = payment
                        .transaction_ids
                        .iter()
                        .map(|txn_id| PaymentTransactionDB {
                            transaction_id: txn_id.clone(),
                            payment_id: payment.id.clone(),
                        })
                        .collect();
                    if !links.is_empty() {
                        diesel::insert_into(payment_transactions::table)
                            .values(&links)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                    }
                }

                for confirmation in &batch.confirmations {
                    let updated = diesel::update(payments::table.find(&confirmation.payment_id))
                        .set((
                            payments::method.eq(confirmation.method.as_str()),
                            payments::status.eq(confirmation.status.as_str()),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    if updated == 0 {
                        return Err(DatabaseError::NotFound(format!(
                            "payment {}",
                            confirmation.payment_id
                        ))
                        .into());
                    }
                }

                Ok(changed)
            })
            .await
    }
}
