use async_trait::async_trait;

use crate::errors::Result;
use crate::transactions::transactions_model::{
    BankTransaction, ImportSummary, InsertOutcome, StatementRow,
};

/// Append-only ledger of ingested bank transactions.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    fn get_transaction(&self, transaction_id: &str) -> Result<BankTransaction>;
    fn list_transactions(&self, fund_id: &str) -> Result<Vec<BankTransaction>>;

    /// Inserts each transaction unless its (fund, external reference) already
    /// exists. Returns one outcome per input, in order.
    async fn insert_transactions(
        &self,
        transactions: Vec<BankTransaction>,
    ) -> Result<Vec<InsertOutcome>>;
}

#[async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    async fn import_transactions(
        &self,
        fund_id: &str,
        rows: Vec<StatementRow>,
    ) -> Result<ImportSummary>;
    fn list_transactions(&self, fund_id: &str) -> Result<Vec<BankTransaction>>;
}
