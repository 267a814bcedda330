use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;

use fundflow_core::errors::{Error, Result};
use fundflow_core::reports::{ReportKind, ReportRepositoryTrait, ReportSnapshot, ReportStatus};
use fundflow_core::status::StatusUpdate;
use fundflow_core::FiscalQuarter;

use super::model::ReportSnapshotDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::drawdowns::apply_status_updates;
use crate::errors::{not_found_or, StorageError};
use crate::schema::report_snapshots;

pub struct ReportRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ReportRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ReportRepository { pool, writer }
    }
}

#[async_trait]
impl ReportRepositoryTrait for ReportRepository {
    fn get_snapshot(&self, snapshot_id: &str) -> Result<ReportSnapshot> {
        let mut conn = get_connection(&self.pool)?;
        let row = report_snapshots::table
            .find(snapshot_id)
            .select(ReportSnapshotDB::as_select())
            .first::<ReportSnapshotDB>(&mut conn)
            .map_err(|e| not_found_or("report", snapshot_id, e))?;
        ReportSnapshot::try_from(row)
    }

    fn list_snapshots(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
    ) -> Result<Vec<ReportSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let mut snapshots = report_snapshots::table
            .filter(report_snapshots::fund_id.eq(fund_id))
            .filter(report_snapshots::quarter.eq(quarter.label()))
            .select(ReportSnapshotDB::as_select())
            .load::<ReportSnapshotDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(ReportSnapshot::try_from)
            .collect::<Result<Vec<_>>>()?;
        snapshots.sort_by(|a, b| (a.kind, a.version).cmp(&(b.kind, b.version)));
        Ok(snapshots)
    }

    fn latest_version(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
        kind: ReportKind,
    ) -> Result<Option<i32>> {
        let mut conn = get_connection(&self.pool)?;
        report_snapshots::table
            .filter(report_snapshots::fund_id.eq(fund_id))
            .filter(report_snapshots::quarter.eq(quarter.label()))
            .filter(report_snapshots::kind.eq(kind.as_str()))
            .select(diesel::dsl::max(report_snapshots::version))
            .first::<Option<i32>>(&mut conn)
            .map_err(|e| StorageError::from(e).into())
    }

    /// The unique (fund, quarter, kind, version) index rejects a second
    /// writer that raced to the same version.
    async fn insert_snapshot(&self, snapshot: ReportSnapshot) -> Result<ReportSnapshot> {
        let row = ReportSnapshotDB::try_from(&snapshot)?;
        self.writer
            .exec(move |conn| {
                diesel::insert_into(report_snapshots::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(snapshot)
            })
            .await
    }

    async fn update_status(
        &self,
        snapshot_id: String,
        from: ReportStatus,
        to: ReportStatus,
        line_item_updates: Vec<StatusUpdate>,
    ) -> Result<ReportSnapshot> {
        self.writer
            .exec(move |conn| {
                let current = report_snapshots::table
                    .find(&snapshot_id)
                    .select(report_snapshots::status)
                    .first::<String>(conn)
                    .map_err(|e| not_found_or("report", &snapshot_id, e))?;
                if current != from.as_str() {
                    return Err(Error::ConstraintViolation(format!(
                        "report {} is {}, expected {}",
                        snapshot_id, current, from
                    )));
                }

                apply_status_updates(conn, &line_item_updates)?;

                diesel::update(report_snapshots::table.find(&snapshot_id))
                    .set((
                        report_snapshots::status.eq(to.as_str()),
                        report_snapshots::status_updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let row = report_snapshots::table
                    .find(&snapshot_id)
                    .select(ReportSnapshotDB::as_select())
                    .first::<ReportSnapshotDB>(conn)
                    .map_err(StorageError::from)?;
                ReportSnapshot::try_from(row)
            })
            .await
    }
}
