//! Database model for report snapshots.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use fundflow_core::reports::{ReportKind, ReportSnapshot, ReportStatus};
use fundflow_core::Result;

use crate::errors::StorageError;
use crate::utils::{parse_enum, parse_quarter};

/// Inputs and figures are frozen as JSON when the snapshot is generated.
#[derive(Queryable, Insertable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::report_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReportSnapshotDB {
    pub id: String,
    pub fund_id: String,
    pub quarter: String,
    pub kind: String,
    pub version: i32,
    pub status: String,
    pub inputs: String,
    pub figures: String,
    pub checksum: String,
    pub generated_at: NaiveDateTime,
    pub status_updated_at: NaiveDateTime,
}

impl TryFrom<&ReportSnapshot> for ReportSnapshotDB {
    type Error = StorageError;

    fn try_from(s: &ReportSnapshot) -> std::result::Result<Self, StorageError> {
        Ok(Self {
            id: s.id.clone(),
            fund_id: s.fund_id.clone(),
            quarter: s.quarter.label(),
            kind: s.kind.as_str().to_string(),
            version: s.version,
            status: s.status.as_str().to_string(),
            inputs: serde_json::to_string(&s.inputs)?,
            figures: serde_json::to_string(&s.figures)?,
            checksum: s.checksum.clone(),
            generated_at: s.generated_at,
            status_updated_at: s.status_updated_at,
        })
    }
}

impl TryFrom<ReportSnapshotDB> for ReportSnapshot {
    type Error = fundflow_core::Error;

    fn try_from(db: ReportSnapshotDB) -> Result<Self> {
        Ok(Self {
            quarter: parse_quarter("report_snapshots.quarter", &db.quarter)?,
            kind: parse_enum("report_snapshots.kind", &db.kind, ReportKind::parse)?,
            status: parse_enum("report_snapshots.status", &db.status, ReportStatus::parse)?,
            inputs: serde_json::from_str(&db.inputs).map_err(StorageError::from)?,
            figures: serde_json::from_str(&db.figures).map_err(StorageError::from)?,
            id: db.id,
            fund_id: db.fund_id,
            version: db.version,
            checksum: db.checksum,
            generated_at: db.generated_at,
            status_updated_at: db.status_updated_at,
        })
    }
}
