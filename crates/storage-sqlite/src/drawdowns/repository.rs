use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;

use fundflow_core::drawdowns::{Drawdown, DrawdownLineItem, DrawdownRepositoryTrait};
use fundflow_core::errors::Result;
use fundflow_core::status::{StatusError, StatusUpdate};
use fundflow_core::FiscalQuarter;

use super::model::{DrawdownDB, DrawdownLineItemDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{not_found_or, StorageError};
use crate::schema::{drawdown_line_items, drawdowns};

pub struct DrawdownRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl DrawdownRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        DrawdownRepository { pool, writer }
    }
}

fn load_line_item(conn: &mut SqliteConnection, line_item_id: &str) -> Result<DrawdownLineItem> {
    let row = drawdown_line_items::table
        .find(line_item_id)
        .select(DrawdownLineItemDB::as_select())
        .first::<DrawdownLineItemDB>(conn)
        .map_err(|e| not_found_or("line item", line_item_id, e))?;
    DrawdownLineItem::try_from(row)
}

/// Guarded status write used by every multi-table job.
///
/// Each update is checked against the stored status before anything is
/// written; the caller's transaction discards partial work on failure.
pub(crate) fn apply_status_updates(
    conn: &mut SqliteConnection,
    updates: &[StatusUpdate],
) -> Result<Vec<DrawdownLineItem>> {
    for update in updates {
        let item = load_line_item(conn, &update.line_item_id)?;
        if item.status != update.from {
            return Err(StatusError::StaleStatus {
                line_item_id: item.id,
                expected: update.from,
                actual: item.status,
            }
            .into());
        }
        item.status.check_transition(update.to, &item.id)?;
    }

    let now = Utc::now().naive_utc();
    let mut changed = Vec::with_capacity(updates.len());
    for update in updates {
        diesel::update(
            drawdown_line_items::table
                .find(&update.line_item_id)
                .filter(drawdown_line_items::status.eq(update.from.as_str())),
        )
        .set((
            drawdown_line_items::status.eq(update.to.as_str()),
            drawdown_line_items::updated_at.eq(now),
        ))
        .execute(conn)
        .map_err(StorageError::from)?;
        changed.push(load_line_item(conn, &update.line_item_id)?);
    }
    Ok(changed)
}

#[async_trait]
impl DrawdownRepositoryTrait for DrawdownRepository {
    fn get_drawdown(&self, drawdown_id: &str) -> Result<Drawdown> {
        let mut conn = get_connection(&self.pool)?;
        let row = drawdowns::table
            .find(drawdown_id)
            .select(DrawdownDB::as_select())
            .first::<DrawdownDB>(&mut conn)
            .map_err(|e| not_found_or("drawdown", drawdown_id, e))?;
        Drawdown::try_from(row)
    }

    fn list_drawdowns(&self, fund_id: &str) -> Result<Vec<Drawdown>> {
        let mut conn = get_connection(&self.pool)?;
        let mut result = drawdowns::table
            .filter(drawdowns::fund_id.eq(fund_id))
            .select(DrawdownDB::as_select())
            .load::<DrawdownDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(Drawdown::try_from)
            .collect::<Result<Vec<_>>>()?;
        result.sort_by(|a, b| (a.quarter, a.created_at).cmp(&(b.quarter, b.created_at)));
        Ok(result)
    }

    fn list_drawdowns_for_quarter(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
    ) -> Result<Vec<Drawdown>> {
        let mut conn = get_connection(&self.pool)?;
        let mut result = drawdowns::table
            .filter(drawdowns::fund_id.eq(fund_id))
            .filter(drawdowns::quarter.eq(quarter.label()))
            .select(DrawdownDB::as_select())
            .load::<DrawdownDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(Drawdown::try_from)
            .collect::<Result<Vec<_>>>()?;
        result.sort_by_key(|d| d.created_at);
        Ok(result)
    }

    fn get_line_item(&self, line_item_id: &str) -> Result<DrawdownLineItem> {
        let mut conn = get_connection(&self.pool)?;
        load_line_item(&mut conn, line_item_id)
    }

    fn list_line_items(&self, drawdown_id: &str) -> Result<Vec<DrawdownLineItem>> {
        let mut conn = get_connection(&self.pool)?;
        drawdown_line_items::table
            .filter(drawdown_line_items::drawdown_id.eq(drawdown_id))
            .order(drawdown_line_items::lp_id.asc())
            .select(DrawdownLineItemDB::as_select())
            .load::<DrawdownLineItemDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(DrawdownLineItem::try_from)
            .collect()
    }

    fn list_line_items_for_fund(&self, fund_id: &str) -> Result<Vec<DrawdownLineItem>> {
        let mut conn = get_connection(&self.pool)?;
        let mut items = drawdown_line_items::table
            .filter(drawdown_line_items::fund_id.eq(fund_id))
            .select(DrawdownLineItemDB::as_select())
            .load::<DrawdownLineItemDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(DrawdownLineItem::try_from)
            .collect::<Result<Vec<_>>>()?;
        items.sort_by(|a, b| (a.quarter, &a.lp_id).cmp(&(b.quarter, &b.lp_id)));
        Ok(items)
    }

    async fn insert_drawdown(
        &self,
        drawdown: Drawdown,
        line_items: Vec<DrawdownLineItem>,
    ) -> Result<()> {
        let drawdown_row = DrawdownDB::from(&drawdown);
        let item_rows: Vec<DrawdownLineItemDB> =
            line_items.iter().map(DrawdownLineItemDB::from).collect();
        self.writer
            .exec(move |conn| {
                diesel::insert_into(drawdowns::table)
                    .values(&drawdown_row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                diesel::insert_into(drawdown_line_items::table)
                    .values(&item_rows)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn apply_status_updates(
        &self,
        updates: Vec<StatusUpdate>,
    ) -> Result<Vec<DrawdownLineItem>> {
        self.writer
            .exec(move |conn| apply_status_updates(conn, &updates))
            .await
    }

    async fn set_expected_reference(
        &self,
        line_item_id: String,
        reference: Option<String>,
    ) -> Result<DrawdownLineItem> {
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(drawdown_line_items::table.find(&line_item_id))
                    .set((
                        drawdown_line_items::expected_reference.eq(reference),
                        drawdown_line_items::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(not_found_or(
                        "line item",
                        &line_item_id,
                        diesel::result::Error::NotFound,
                    ));
                }
                load_line_item(conn, &line_item_id)
            })
            .await
    }
}
