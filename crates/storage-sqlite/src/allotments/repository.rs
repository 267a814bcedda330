use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use fundflow_core::allotments::{Allotment, AllotmentRepositoryTrait, AllotmentReversal};
use fundflow_core::errors::{DatabaseError, Result};
use fundflow_core::status::StatusUpdate;
use fundflow_core::FiscalQuarter;

use super::model::{AllotmentDB, AllotmentReversalDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::drawdowns::apply_status_updates;
use crate::errors::{not_found_or, StorageError};
use crate::schema::{allotment_reversals, allotments};

/// Allotments are append-only: a correction inserts a replacement row and a
/// reversal record, never an update.
pub struct AllotmentRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AllotmentRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        AllotmentRepository { pool, writer }
    }
}

#[async_trait]
impl AllotmentRepositoryTrait for AllotmentRepository {
    fn get_allotment(&self, allotment_id: &str) -> Result<Allotment> {
        let mut conn = get_connection(&self.pool)?;
        let row = allotments::table
            .find(allotment_id)
            .select(AllotmentDB::as_select())
            .first::<AllotmentDB>(&mut conn)
            .map_err(|e| not_found_or("allotment", allotment_id, e))?;
        Allotment::try_from(row)
    }

    fn list_allotments(&self, fund_id: &str) -> Result<Vec<Allotment>> {
        let mut conn = get_connection(&self.pool)?;
        allotments::table
            .filter(allotments::fund_id.eq(fund_id))
            .order((allotments::created_at.asc(), allotments::id.asc()))
            .select(AllotmentDB::as_select())
            .load::<AllotmentDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(Allotment::try_from)
            .collect()
    }

    fn list_allotments_for_quarter(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
    ) -> Result<Vec<Allotment>> {
        let mut conn = get_connection(&self.pool)?;
        allotments::table
            .filter(allotments::fund_id.eq(fund_id))
            .filter(allotments::quarter.eq(quarter.label()))
            .order((allotments::created_at.asc(), allotments::id.asc()))
            .select(AllotmentDB::as_select())
            .load::<AllotmentDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(Allotment::try_from)
            .collect()
    }

    fn list_reversals(&self, fund_id: &str) -> Result<Vec<AllotmentReversal>> {
        let mut conn = get_connection(&self.pool)?;
        let fund_allotments = allotments::table
            .filter(allotments::fund_id.eq(fund_id))
            .select(allotments::id);
        let rows = allotment_reversals::table
            .filter(allotment_reversals::allotment_id.eq_any(fund_allotments))
            .order(allotment_reversals::reversed_at.asc())
            .select(AllotmentReversalDB::as_select())
            .load::<AllotmentReversalDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(AllotmentReversal::from).collect())
    }

    fn get_reversal_for(&self, allotment_id: &str) -> Result<Option<AllotmentReversal>> {
        let mut conn = get_connection(&self.pool)?;
        let row = allotment_reversals::table
            .filter(allotment_reversals::allotment_id.eq(allotment_id))
            .select(AllotmentReversalDB::as_select())
            .first::<AllotmentReversalDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(AllotmentReversal::from))
    }

    async fn issue_allotments(
        &self,
        new_allotments: Vec<Allotment>,
        status_updates: Vec<StatusUpdate>,
    ) -> Result<Vec<Allotment>> {
        let rows = new_allotments
            .iter()
            .map(AllotmentDB::try_from)
            .collect::<std::result::Result<Vec<_>, StorageError>>()?;
        self.writer
            .exec(move |conn| {
                apply_status_updates(conn, &status_updates)?;
                diesel::insert_into(allotments::table)
                    .values(&rows)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(new_allotments)
            })
            .await
    }

    async fn reverse_and_reissue(
        &self,
        reversal: AllotmentReversal,
        replacement: Allotment,
    ) -> Result<Allotment> {
        let replacement_row = AllotmentDB::try_from(&replacement)?;
        let reversal_row = AllotmentReversalDB::from(&reversal);
        self.writer
            .exec(move |conn| {
                let already = allotment_reversals::table
                    .filter(allotment_reversals::allotment_id.eq(&reversal_row.allotment_id))
                    .count()
                    .get_result::<i64>(conn)
                    .map_err(StorageError::from)?;
                if already > 0 {
                    return Err(DatabaseError::UniqueViolation(format!(
                        "allotment {} already reversed",
                        reversal_row.allotment_id
                    ))
                    .into());
                }
                diesel::insert_into(allotments::table)
                    .values(&replacement_row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                diesel::insert_into(allotment_reversals::table)
                    .values(&reversal_row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(replacement)
            })
            .await
    }
}
