//! Fund and LP profile models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DOMESTIC_JURISDICTION, DEFAULT_GST_RATE, DEFAULT_MANAGEMENT_FEE_RATE, DEFAULT_NAV,
    DEFAULT_STAMP_DUTY_RATE,
};
use crate::utils::money::const_decimal;

/// Fund profile with the economic inputs the pipeline needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    pub id: String,
    pub name: String,
    pub currency: String,
    /// Current NAV per unit, supplied by the fund administrator.
    pub nav: Decimal,
    pub management_fee_rate: Decimal,
    /// Tax levied on the management fee.
    pub gst_rate: Decimal,
    pub stamp_duty_rate: Decimal,
    pub initial_close_date: Option<NaiveDate>,
    pub domestic_jurisdiction: String,
}

impl Fund {
    /// Creates a fund profile with the standard rates.
    pub fn with_defaults(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            currency: "INR".to_string(),
            nav: const_decimal(DEFAULT_NAV),
            management_fee_rate: const_decimal(DEFAULT_MANAGEMENT_FEE_RATE),
            gst_rate: const_decimal(DEFAULT_GST_RATE),
            stamp_duty_rate: const_decimal(DEFAULT_STAMP_DUTY_RATE),
            initial_close_date: None,
            domestic_jurisdiction: DEFAULT_DOMESTIC_JURISDICTION.to_string(),
        }
    }

    /// True when an investor from `geography` counts as foreign for this fund.
    pub fn is_foreign(&self, geography: &str) -> bool {
        !geography
            .trim()
            .eq_ignore_ascii_case(self.domestic_jurisdiction.trim())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LpStatus {
    #[default]
    Active,
    Inactive,
    Exited,
}

impl LpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LpStatus::Active => "ACTIVE",
            LpStatus::Inactive => "INACTIVE",
            LpStatus::Exited => "EXITED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Some(LpStatus::Active),
            "INACTIVE" => Some(LpStatus::Inactive),
            "EXITED" => Some(LpStatus::Exited),
            _ => None,
        }
    }
}

/// A named holder on the LP's demat account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Holder {
    pub name: String,
    pub pan: Option<String>,
}

/// Demat account details used on allotment sheets and inVi filings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DepositoryDetails {
    pub client_id: Option<String>,
    pub dp_id: Option<String>,
    pub depository: Option<String>,
    /// First, second and third holders, in order.
    pub holders: Vec<Holder>,
}

/// Limited partner profile, including the commitment to its fund.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LimitedPartner {
    pub id: String,
    pub fund_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub commitment: Decimal,
    pub currency: String,
    pub geography: String,
    pub investor_type: String,
    pub status: LpStatus,
    pub depository: DepositoryDetails,
}

impl LimitedPartner {
    pub fn is_active(&self) -> bool {
        self.status == LpStatus::Active
    }
}

/// An investment made by the fund into a portfolio company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioInvestment {
    pub id: String,
    pub fund_id: String,
    pub company_name: String,
    pub amount_invested: Decimal,
    pub funding_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fund_defaults() {
        let fund = Fund::with_defaults("f1", "Fund One");
        assert_eq!(fund.nav, dec!(100));
        assert_eq!(fund.management_fee_rate, dec!(0.01));
        assert_eq!(fund.gst_rate, dec!(0.18));
        assert_eq!(fund.stamp_duty_rate, dec!(0.00005));
    }

    #[test]
    fn test_foreign_is_case_insensitive() {
        let fund = Fund::with_defaults("f1", "Fund One");
        assert!(!fund.is_foreign("india"));
        assert!(!fund.is_foreign(" INDIA "));
        assert!(fund.is_foreign("Singapore"));
    }

    #[test]
    fn test_lp_status_parse() {
        assert_eq!(LpStatus::parse("active"), Some(LpStatus::Active));
        assert_eq!(LpStatus::parse("EXITED"), Some(LpStatus::Exited));
        assert_eq!(LpStatus::parse("unknown"), None);
    }
}
