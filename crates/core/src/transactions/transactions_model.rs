//! Bank transaction models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TransactionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionDirection {
    Credit,
    Debit,
}

impl TransactionDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionDirection::Credit => "CREDIT",
            TransactionDirection::Debit => "DEBIT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CREDIT" | "CR" => Some(TransactionDirection::Credit),
            "DEBIT" | "DR" => Some(TransactionDirection::Debit),
            _ => None,
        }
    }
}

/// A single ingested statement line. Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BankTransaction {
    pub id: String,
    pub fund_id: String,
    pub transaction_date: NaiveDate,
    pub value_date: Option<NaiveDate>,
    pub narration: String,
    /// Always positive; see `direction`.
    pub amount: Decimal,
    pub direction: TransactionDirection,
    pub currency: String,
    /// Bank-assigned transaction id, unique per fund.
    pub external_reference: String,
    /// The row exactly as received, kept for audit.
    pub raw_payload: Option<String>,
    pub imported_at: NaiveDateTime,
}

impl BankTransaction {
    pub fn is_credit(&self) -> bool {
        self.direction == TransactionDirection::Credit
    }
}

/// One row of an incoming statement, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatementRow {
    pub external_reference: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub value_date: Option<NaiveDate>,
    pub narration: Option<String>,
    /// Signed when `direction` is absent: negative amounts are debits.
    pub amount: Option<Decimal>,
    pub direction: Option<TransactionDirection>,
    pub currency: Option<String>,
    pub raw: Option<serde_json::Value>,
}

/// Parts of a statement row that survived validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRow {
    pub external_reference: String,
    pub transaction_date: NaiveDate,
    pub value_date: Option<NaiveDate>,
    pub narration: String,
    pub amount: Decimal,
    pub direction: TransactionDirection,
    pub currency: String,
    pub raw_payload: Option<String>,
}

impl StatementRow {
    /// Checks one row. Problems are scoped to the row and never abort an import.
    pub fn validate(
        &self,
        row_index: usize,
        fund_currency: &str,
    ) -> Result<ValidatedRow, TransactionError> {
        let malformed = |reason: &str| TransactionError::MalformedRow {
            row_index,
            reason: reason.to_string(),
        };

        let external_reference = self
            .external_reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| malformed("missing external reference"))?
            .to_string();
        let transaction_date = self
            .transaction_date
            .ok_or_else(|| malformed("missing transaction date"))?;
        let narration = self
            .narration
            .as_deref()
            .map(|n| n.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|n| !n.is_empty())
            .ok_or_else(|| malformed("missing narration"))?;
        let signed = self.amount.ok_or_else(|| malformed("missing amount"))?;
        if signed.is_zero() {
            return Err(malformed("zero amount"));
        }

        let direction = match self.direction {
            Some(direction) => direction,
            None if signed < Decimal::ZERO => TransactionDirection::Debit,
            None => TransactionDirection::Credit,
        };

        let currency = self
            .currency
            .as_deref()
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| fund_currency.to_string());
        if !currency.eq_ignore_ascii_case(fund_currency) {
            return Err(malformed(&format!(
                "currency {} differs from fund currency {}",
                currency, fund_currency
            )));
        }

        Ok(ValidatedRow {
            external_reference,
            transaction_date,
            value_date: self.value_date,
            narration,
            amount: signed.abs(),
            direction,
            currency,
            raw_payload: self.raw.as_ref().map(|v| v.to_string()),
        })
    }
}

/// Per-row result of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRow {
    pub row_index: usize,
    pub external_reference: Option<String>,
    pub reason: String,
}

/// Outcome of `import_transactions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped_duplicates: usize,
    pub rejected: Vec<RejectedRow>,
    pub transaction_ids: Vec<String>,
    pub duplicate_references: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row() -> StatementRow {
        StatementRow {
            external_reference: Some(" UTR001 ".to_string()),
            transaction_date: NaiveDate::from_ymd_opt(2025, 7, 1),
            value_date: None,
            narration: Some("NEFT/MAIN   STREET CAPITAL".to_string()),
            amount: Some(dec!(1000000)),
            direction: None,
            currency: None,
            raw: None,
        }
    }

    #[test]
    fn test_validate_normalizes_fields() {
        let v = row().validate(0, "INR").unwrap();
        assert_eq!(v.external_reference, "UTR001");
        assert_eq!(v.narration, "NEFT/MAIN STREET CAPITAL");
        assert_eq!(v.direction, TransactionDirection::Credit);
        assert_eq!(v.currency, "INR");
    }

    #[test]
    fn test_negative_amount_is_debit() {
        let mut r = row();
        r.amount = Some(dec!(-500));
        let v = r.validate(0, "INR").unwrap();
        assert_eq!(v.direction, TransactionDirection::Debit);
        assert_eq!(v.amount, dec!(500));
    }

    #[test]
    fn test_malformed_rows() {
        let mut no_ref = row();
        no_ref.external_reference = Some("   ".to_string());
        assert!(no_ref.validate(3, "INR").is_err());

        let mut blank_narration = row();
        blank_narration.narration = Some(" ".to_string());
        assert!(blank_narration.validate(3, "INR").is_err());

        let mut zero = row();
        zero.amount = Some(dec!(0));
        assert!(zero.validate(3, "INR").is_err());

        let mut usd = row();
        usd.currency = Some("usd".to_string());
        match usd.validate(3, "INR").unwrap_err() {
            TransactionError::MalformedRow { row_index, reason } => {
                assert_eq!(row_index, 3);
                assert!(reason.contains("USD"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
