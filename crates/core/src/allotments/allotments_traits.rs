use async_trait::async_trait;

use super::allotments_model::{
    Allotment, AllotmentBatch, AllotmentRequest, AllotmentReversal, ReissueRequest,
};
use crate::errors::Result;
use crate::status::StatusUpdate;
use crate::utils::FiscalQuarter;

/// Append-only ledger access for allotments.
#[async_trait]
pub trait AllotmentRepositoryTrait: Send + Sync {
    fn get_allotment(&self, allotment_id: &str) -> Result<Allotment>;
    fn list_allotments(&self, fund_id: &str) -> Result<Vec<Allotment>>;
    fn list_allotments_for_quarter(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
    ) -> Result<Vec<Allotment>>;
    fn list_reversals(&self, fund_id: &str) -> Result<Vec<AllotmentReversal>>;
    fn get_reversal_for(&self, allotment_id: &str) -> Result<Option<AllotmentReversal>>;

    /// Inserts the allotments and moves their line items, all or nothing.
    async fn issue_allotments(
        &self,
        allotments: Vec<Allotment>,
        status_updates: Vec<StatusUpdate>,
    ) -> Result<Vec<Allotment>>;

    /// Records the reversal and its replacement in one transaction.
    async fn reverse_and_reissue(
        &self,
        reversal: AllotmentReversal,
        replacement: Allotment,
    ) -> Result<Allotment>;
}

#[async_trait]
pub trait AllotmentServiceTrait: Send + Sync {
    async fn allot_units(&self, request: AllotmentRequest) -> Result<AllotmentBatch>;

    async fn reissue_allotment(
        &self,
        allotment_id: &str,
        request: ReissueRequest,
    ) -> Result<Allotment>;

    /// Allotments for the quarter that have not been reversed.
    fn list_current_allotments(
        &self,
        fund_id: &str,
        quarter: &FiscalQuarter,
    ) -> Result<Vec<Allotment>>;
}
