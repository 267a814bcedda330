use async_trait::async_trait;

use super::reports_model::{ReportKind, ReportRequest, ReportSnapshot, ReportStatus};
use crate::errors::Result;
use crate::status::StatusUpdate;
use crate::utils::FiscalQuarter;

/// Ledger access for report snapshots. Figures are never updated; only the
/// status dimension moves.
#[async_trait]
pub trait ReportRepositoryTrait: Send + Sync {
    fn get_snapshot(&self, snapshot_id: &str) -> Result<ReportSnapshot>;

    /// Snapshots for the quarter, by kind then version.
    fn list_snapshots(&self, fund_id: &str, quarter: &FiscalQuarter)
        -> Result<Vec<ReportSnapshot>>;

    fn latest_version(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
        kind: ReportKind,
    ) -> Result<Option<i32>>;

    /// Fails with a unique violation if the version already exists.
    async fn insert_snapshot(&self, snapshot: ReportSnapshot) -> Result<ReportSnapshot>;

    /// Moves the snapshot from `from` to `to` and applies the line item
    /// updates in the same transaction.
    async fn update_status(
        &self,
        snapshot_id: String,
        from: ReportStatus,
        to: ReportStatus,
        line_item_updates: Vec<StatusUpdate>,
    ) -> Result<ReportSnapshot>;
}

#[async_trait]
pub trait ReportServiceTrait: Send + Sync {
    /// Aggregates a new snapshot version. Earlier versions are untouched.
    async fn generate_report(&self, request: ReportRequest) -> Result<ReportSnapshot>;
    fn get_report(&self, snapshot_id: &str) -> Result<ReportSnapshot>;
    fn list_reports(&self, fund_id: &str, quarter: &FiscalQuarter) -> Result<Vec<ReportSnapshot>>;
    async fn set_report_status(
        &self,
        snapshot_id: &str,
        status: ReportStatus,
    ) -> Result<ReportSnapshot>;
}
