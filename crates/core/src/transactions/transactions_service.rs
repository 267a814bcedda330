use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use super::transactions_model::*;
use super::{TransactionError, TransactionRepositoryTrait, TransactionServiceTrait};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};
use crate::funds::ProfileReaderTrait;

/// Service for ingesting bank statements
pub struct TransactionService {
    profile_reader: Arc<dyn ProfileReaderTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl TransactionService {
    pub fn new(
        profile_reader: Arc<dyn ProfileReaderTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            profile_reader,
            transaction_repository,
            event_sink,
        }
    }

    fn record_duplicate(&self, fund_id: &str, reference: &str, summary: &mut ImportSummary) {
        let skipped = TransactionError::DuplicateReference {
            fund_id: fund_id.to_string(),
            external_reference: reference.to_string(),
        };
        warn!("Skipping statement row: {}", skipped);
        summary.skipped_duplicates += 1;
        summary.duplicate_references.push(reference.to_string());
        self.event_sink.emit(DomainEvent::duplicate_transaction_skipped(
            fund_id.to_string(),
            reference.to_string(),
        ));
    }
}

#[async_trait]
impl TransactionServiceTrait for TransactionService {
    async fn import_transactions(
        &self,
        fund_id: &str,
        rows: Vec<StatementRow>,
    ) -> Result<ImportSummary> {
        let fund = self.profile_reader.get_fund(fund_id)?;
        let mut summary = ImportSummary::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut pending: Vec<BankTransaction> = Vec::new();
        let now = Utc::now().naive_utc();

        for (row_index, row) in rows.iter().enumerate() {
            let valid = match row.validate(row_index, &fund.currency) {
                Ok(valid) => valid,
                Err(e) => {
                    warn!("Rejecting statement row for fund {}: {}", fund_id, e);
                    let reason = match e {
                        TransactionError::MalformedRow { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    summary.rejected.push(RejectedRow {
                        row_index,
                        external_reference: row.external_reference.clone(),
                        reason,
                    });
                    continue;
                }
            };

            // Repeats inside one statement are duplicates too.
            if !seen.insert(valid.external_reference.clone()) {
                self.record_duplicate(fund_id, &valid.external_reference, &mut summary);
                continue;
            }

            pending.push(BankTransaction {
                id: Uuid::new_v4().to_string(),
                fund_id: fund_id.to_string(),
                transaction_date: valid.transaction_date,
                value_date: valid.value_date,
                narration: valid.narration,
                amount: valid.amount,
                direction: valid.direction,
                currency: valid.currency,
                external_reference: valid.external_reference,
                raw_payload: valid.raw_payload,
                imported_at: now,
            });
        }

        let outcomes = self
            .transaction_repository
            .insert_transactions(pending.clone())
            .await?;

        for (txn, outcome) in pending.iter().zip(outcomes) {
            match outcome {
                InsertOutcome::Inserted => {
                    summary.imported += 1;
                    summary.transaction_ids.push(txn.id.clone());
                }
                InsertOutcome::Duplicate => {
                    self.record_duplicate(fund_id, &txn.external_reference, &mut summary)
                }
            }
        }

        info!(
            "Imported statement for fund {}: {} new, {} duplicate, {} rejected",
            fund_id,
            summary.imported,
            summary.skipped_duplicates,
            summary.rejected.len()
        );
        self.event_sink.emit(DomainEvent::transactions_imported(
            fund_id.to_string(),
            summary.imported,
            summary.skipped_duplicates,
            summary.rejected.len(),
        ));

        Ok(summary)
    }

    fn list_transactions(&self, fund_id: &str) -> Result<Vec<BankTransaction>> {
        self.transaction_repository.list_transactions(fund_id)
    }
}
