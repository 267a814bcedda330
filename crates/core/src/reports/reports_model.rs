//! Report snapshot models.

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ReportError;
use crate::constants::{TEMPLATE_INVI_REPORT, TEMPLATE_SEBI_REPORT};
use crate::utils::FiscalQuarter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportKind {
    /// SEBI quarterly activity report.
    Sebi,
    /// Foreign investment filing on the inVi portal.
    Invi,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Sebi => "SEBI",
            ReportKind::Invi => "INVI",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SEBI" => Some(ReportKind::Sebi),
            "INVI" => Some(ReportKind::Invi),
            _ => None,
        }
    }

    /// Document template the report payload is rendered with.
    pub fn template_id(&self) -> &'static str {
        match self {
            ReportKind::Sebi => TEMPLATE_SEBI_REPORT,
            ReportKind::Invi => TEMPLATE_INVI_REPORT,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review state of a snapshot. Independent of its version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    #[default]
    Draft,
    Reviewed,
    Filed,
    Submitted,
}

impl ReportStatus {
    fn rank(&self) -> u8 {
        match self {
            ReportStatus::Draft => 0,
            ReportStatus::Reviewed => 1,
            ReportStatus::Filed => 2,
            ReportStatus::Submitted => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Draft => "DRAFT",
            ReportStatus::Reviewed => "REVIEWED",
            ReportStatus::Filed => "FILED",
            ReportStatus::Submitted => "SUBMITTED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Some(ReportStatus::Draft),
            "REVIEWED" => Some(ReportStatus::Reviewed),
            "FILED" => Some(ReportStatus::Filed),
            "SUBMITTED" => Some(ReportStatus::Submitted),
            _ => None,
        }
    }

    /// True when moving from `self` to `target` passes through Filed,
    /// including skips straight to Submitted.
    pub fn reaches_filed(&self, target: ReportStatus) -> bool {
        self.rank() < ReportStatus::Filed.rank() && ReportStatus::Filed.rank() <= target.rank()
    }

    /// Forward-only; steps may be skipped.
    pub fn check_transition(
        &self,
        target: ReportStatus,
        snapshot_id: &str,
    ) -> Result<(), ReportError> {
        if target.rank() > self.rank() {
            Ok(())
        } else {
            Err(ReportError::InvalidStatusTransition {
                snapshot_id: snapshot_id.to_string(),
                from: *self,
                to: target,
            })
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Figures the operator supplies; everything else is computed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatorInputs {
    pub temporary_investments: Decimal,
    pub cash_in_hand: Decimal,
    pub estimated_expenses: Decimal,
}

impl OperatorInputs {
    pub fn validate(&self) -> Result<(), ReportError> {
        let fields = [
            ("temporaryInvestments", self.temporary_investments),
            ("cashInHand", self.cash_in_hand),
            ("estimatedExpenses", self.estimated_expenses),
        ];
        for (field, value) in fields {
            if value < Decimal::ZERO {
                return Err(ReportError::InvalidInputs {
                    field: field.to_string(),
                    reason: format!("cannot be negative, got {}", value),
                });
            }
        }
        Ok(())
    }
}

/// LPs grouped by geography and investor type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvestorCategory {
    pub geography: String,
    pub investor_type: String,
    pub investor_count: usize,
    pub total_commitment: Decimal,
}

/// One foreign LP on the inVi filing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InviInvestor {
    pub lp_id: String,
    pub lp_name: String,
    pub geography: String,
    pub investor_type: String,
    pub commitment: Decimal,
    pub dp_id: Option<String>,
    pub client_id: Option<String>,
    pub depository: Option<String>,
    pub quarter_amount: Decimal,
    pub cumulative_amount: Decimal,
    pub units_allotted: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountryAmounts {
    pub country: String,
    pub investor_count: usize,
    pub quarter_amount: Decimal,
    pub cumulative_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InviDetails {
    pub investors: Vec<InviInvestor>,
    pub countries: Vec<CountryAmounts>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportFigures {
    pub total_commitment_received_initial_close: Decimal,
    pub total_commitment_received_quarter_end: Decimal,
    pub gross_cumulative_funds_raised: Decimal,
    pub cumulative_portfolio_investment_count: usize,
    pub cumulative_portfolio_investment_amount: Decimal,
    pub investable_funds: Decimal,
    pub investor_categories: Vec<InvestorCategory>,
    /// Present on inVi reports only.
    pub invi: Option<InviDetails>,
}

/// One immutable generation of a report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSnapshot {
    pub id: String,
    pub fund_id: String,
    pub quarter: FiscalQuarter,
    pub kind: ReportKind,
    /// Starts at 1 and increases by one per regeneration of the same kind.
    pub version: i32,
    pub status: ReportStatus,
    pub inputs: OperatorInputs,
    pub figures: ReportFigures,
    /// SHA-256 over the serialized inputs and figures.
    pub checksum: String,
    pub generated_at: NaiveDateTime,
    pub status_updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub fund_id: String,
    pub quarter: FiscalQuarter,
    pub kind: ReportKind,
    #[serde(default)]
    pub inputs: OperatorInputs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_report_status_moves_forward_only() {
        assert!(ReportStatus::Draft
            .check_transition(ReportStatus::Reviewed, "r")
            .is_ok());
        assert!(ReportStatus::Draft
            .check_transition(ReportStatus::Filed, "r")
            .is_ok());
        assert!(ReportStatus::Filed
            .check_transition(ReportStatus::Reviewed, "r")
            .is_err());
        assert!(ReportStatus::Submitted
            .check_transition(ReportStatus::Submitted, "r")
            .is_err());
    }

    #[test]
    fn test_reaches_filed_covers_skips() {
        assert!(ReportStatus::Reviewed.reaches_filed(ReportStatus::Filed));
        assert!(ReportStatus::Draft.reaches_filed(ReportStatus::Submitted));
        assert!(!ReportStatus::Draft.reaches_filed(ReportStatus::Reviewed));
        assert!(!ReportStatus::Filed.reaches_filed(ReportStatus::Submitted));
    }

    #[test]
    fn test_negative_inputs_rejected() {
        let inputs = OperatorInputs {
            cash_in_hand: dec!(-1),
            ..OperatorInputs::default()
        };
        match inputs.validate().unwrap_err() {
            ReportError::InvalidInputs { field, .. } => assert_eq!(field, "cashInHand"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ReportKind::parse("invi"), Some(ReportKind::Invi));
        assert_eq!(ReportKind::parse("SEBI"), Some(ReportKind::Sebi));
        assert_eq!(ReportKind::parse("fema"), None);
    }
}
