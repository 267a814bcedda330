//! Drawdown domain models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::DrawdownError;
use crate::status::LineItemStatus;
use crate::utils::FiscalQuarter;

/// Call specification as supplied by the caller. Exactly one of the two
/// fields must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallSpec {
    /// Percentage of each LP's commitment, in percent (10 means 10%).
    pub percentage: Option<Decimal>,
    /// Amount to spread across LPs pro rata to commitment.
    pub absolute_total: Option<Decimal>,
}

impl CallSpec {
    pub fn percentage(percentage: Decimal) -> Self {
        Self {
            percentage: Some(percentage),
            absolute_total: None,
        }
    }

    pub fn absolute_total(total: Decimal) -> Self {
        Self {
            percentage: None,
            absolute_total: Some(total),
        }
    }

    pub fn resolve(&self) -> Result<CallBasis, DrawdownError> {
        match (self.percentage, self.absolute_total) {
            (Some(_), Some(_)) => Err(DrawdownError::InvalidCallSpec(
                "percentage and absolute total are mutually exclusive".to_string(),
            )),
            (None, None) => Err(DrawdownError::InvalidCallSpec(
                "either a percentage or an absolute total is required".to_string(),
            )),
            (Some(pct), None) => {
                if pct <= Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                    return Err(DrawdownError::InvalidCallSpec(format!(
                        "percentage must be in (0, 100], got {}",
                        pct
                    )));
                }
                Ok(CallBasis::Percentage(pct))
            }
            (None, Some(total)) => {
                if total <= Decimal::ZERO {
                    return Err(DrawdownError::InvalidCallSpec(format!(
                        "absolute total must be positive, got {}",
                        total
                    )));
                }
                Ok(CallBasis::AbsoluteTotal(total))
            }
        }
    }
}

/// Validated call basis stored on the drawdown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallBasis {
    Percentage(Decimal),
    AbsoluteTotal(Decimal),
}

impl CallBasis {
    pub fn mode(&self) -> &'static str {
        match self {
            CallBasis::Percentage(_) => "PERCENTAGE",
            CallBasis::AbsoluteTotal(_) => "ABSOLUTE_TOTAL",
        }
    }

    pub fn value(&self) -> Decimal {
        match self {
            CallBasis::Percentage(v) | CallBasis::AbsoluteTotal(v) => *v,
        }
    }

    pub fn from_parts(mode: &str, value: Decimal) -> Option<Self> {
        match mode {
            "PERCENTAGE" => Some(CallBasis::Percentage(value)),
            "ABSOLUTE_TOTAL" => Some(CallBasis::AbsoluteTotal(value)),
            _ => None,
        }
    }
}

/// A capital call issued against a fund for one quarter.
///
/// Drawdowns carry no status of their own; see [`crate::status::rollup_status`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Drawdown {
    pub id: String,
    pub fund_id: String,
    pub quarter: FiscalQuarter,
    pub notice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub call_basis: CallBasis,
    pub total_called: Decimal,
    pub forecast_next_quarter: Decimal,
    pub forecast_period: FiscalQuarter,
    pub created_at: NaiveDateTime,
}

/// One LP's share of a drawdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownLineItem {
    pub id: String,
    pub drawdown_id: String,
    pub fund_id: String,
    pub lp_id: String,
    pub quarter: FiscalQuarter,
    pub amount_due: Decimal,
    /// Cumulative amount called from this LP, this call included.
    pub amount_called_up: Decimal,
    pub remaining_commitment: Decimal,
    pub management_fee: Decimal,
    pub stamp_duty: Decimal,
    /// Cumulative calls exceed the commitment. Flagged, never rejected.
    pub over_committed: bool,
    /// Payment reference the LP told us to expect, matched exactly against
    /// the bank's transaction reference.
    pub expected_reference: Option<String>,
    pub status: LineItemStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input for `calculate_drawdown`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownRequest {
    pub fund_id: String,
    pub quarter: FiscalQuarter,
    pub notice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub call_spec: CallSpec,
    #[serde(default)]
    pub forecast_next_quarter: Option<Decimal>,
    /// When true nothing is persisted.
    #[serde(default)]
    pub preview: bool,
}

/// Result of `calculate_drawdown`, identical for preview and commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownCalculation {
    pub drawdown: Drawdown,
    pub line_items: Vec<DrawdownLineItem>,
    /// Management fee is levied in this quarter.
    pub fee_quarter: bool,
    pub preview: bool,
}

/// A drawdown with its line items and derived status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownSummary {
    pub drawdown: Drawdown,
    pub line_items: Vec<DrawdownLineItem>,
    pub status: Option<LineItemStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_call_spec_requires_exactly_one_mode() {
        let both = CallSpec {
            percentage: Some(dec!(10)),
            absolute_total: Some(dec!(1000)),
        };
        assert!(matches!(
            both.resolve(),
            Err(DrawdownError::InvalidCallSpec(_))
        ));
        assert!(matches!(
            CallSpec::default().resolve(),
            Err(DrawdownError::InvalidCallSpec(_))
        ));
    }

    #[test]
    fn test_call_spec_bounds() {
        assert!(CallSpec::percentage(dec!(0)).resolve().is_err());
        assert!(CallSpec::percentage(dec!(100.01)).resolve().is_err());
        assert!(CallSpec::absolute_total(dec!(-1)).resolve().is_err());
        assert_eq!(
            CallSpec::percentage(dec!(100)).resolve().unwrap(),
            CallBasis::Percentage(dec!(100))
        );
    }

    #[test]
    fn test_call_basis_parts() {
        let basis = CallBasis::AbsoluteTotal(dec!(500));
        assert_eq!(
            CallBasis::from_parts(basis.mode(), basis.value()),
            Some(basis)
        );
        assert_eq!(CallBasis::from_parts("OTHER", dec!(1)), None);
    }
}
