use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Transaction reference {external_reference} already exists for fund {fund_id}")]
    DuplicateReference {
        fund_id: String,
        external_reference: String,
    },

    #[error("Statement row {row_index} is malformed: {reason}")]
    MalformedRow { row_index: usize, reason: String },

    #[error("Transaction {transaction_id} is already linked to payment {payment_id}")]
    AlreadyLinked {
        transaction_id: String,
        payment_id: String,
    },

    #[error("Transaction {transaction_id} does not belong to fund {fund_id}")]
    ForeignTransaction {
        transaction_id: String,
        fund_id: String,
    },
}

impl TransactionError {
    pub fn kind(&self) -> &'static str {
        match self {
            TransactionError::DuplicateReference { .. } => "DuplicateTransactionReference",
            TransactionError::MalformedRow { .. } => "MalformedStatementRow",
            TransactionError::AlreadyLinked { .. } => "TransactionAlreadyLinked",
            TransactionError::ForeignTransaction { .. } => "DataIntegrityError",
        }
    }

    pub fn entity_ids(&self) -> Vec<String> {
        match self {
            TransactionError::DuplicateReference {
                external_reference,
                ..
            } => vec![external_reference.clone()],
            TransactionError::MalformedRow { row_index, .. } => vec![row_index.to_string()],
            TransactionError::AlreadyLinked {
                transaction_id,
                payment_id,
            } => vec![transaction_id.clone(), payment_id.clone()],
            TransactionError::ForeignTransaction { transaction_id, .. } => {
                vec![transaction_id.clone()]
            }
        }
    }
}
