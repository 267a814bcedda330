//! Indian fiscal quarters (April to March).
//!
//! A quarter is labelled `FY{yy}Q{n}` where `yy` is the calendar year in which
//! the fiscal year ends: `FY25Q1` is April to June 2024 and `FY25Q4` is
//! January to March 2025. The older `Q{n}'{yy}` form is accepted on input.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FiscalQuarter {
    /// Calendar year in which the fiscal year ends.
    fiscal_year: i32,
    /// 1..=4, Q1 being April to June.
    quarter: u8,
}

impl FiscalQuarter {
    pub fn new(fiscal_year: i32, quarter: u8) -> Result<Self> {
        if !(1..=4).contains(&quarter) || !(1900..=9999).contains(&fiscal_year) {
            return Err(ValidationError::InvalidQuarter(format!(
                "FY{}Q{}",
                fiscal_year, quarter
            ))
            .into());
        }
        Ok(Self {
            fiscal_year,
            quarter,
        })
    }

    /// Quarter that contains the given calendar date.
    pub fn containing(date: NaiveDate) -> Self {
        let month = date.month();
        let (fiscal_year, quarter) = if month >= 4 {
            (date.year() + 1, ((month - 4) / 3 + 1) as u8)
        } else {
            (date.year(), 4)
        };
        Self {
            fiscal_year,
            quarter,
        }
    }

    pub fn fiscal_year(&self) -> i32 {
        self.fiscal_year
    }

    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// First calendar day of the quarter.
    pub fn start_date(&self) -> NaiveDate {
        let (year, month) = match self.quarter {
            1 => (self.fiscal_year - 1, 4),
            2 => (self.fiscal_year - 1, 7),
            3 => (self.fiscal_year - 1, 10),
            _ => (self.fiscal_year, 1),
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last calendar day of the quarter.
    pub fn end_date(&self) -> NaiveDate {
        self.next()
            .start_date()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }

    pub fn next(&self) -> Self {
        if self.quarter == 4 {
            Self {
                fiscal_year: self.fiscal_year + 1,
                quarter: 1,
            }
        } else {
            Self {
                fiscal_year: self.fiscal_year,
                quarter: self.quarter + 1,
            }
        }
    }

    /// Number of quarters from `earlier` to `self` (negative if `earlier` is later).
    pub fn quarters_since(&self, earlier: &FiscalQuarter) -> i64 {
        self.ordinal() - earlier.ordinal()
    }

    fn ordinal(&self) -> i64 {
        i64::from(self.fiscal_year) * 4 + i64::from(self.quarter) - 1
    }

    pub fn label(&self) -> String {
        format!("FY{:02}Q{}", self.fiscal_year.rem_euclid(100), self.quarter)
    }
}

fn parse_year(digits: &str) -> Option<i32> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: i32 = digits.parse().ok()?;
    match digits.len() {
        2 => Some(2000 + value),
        4 => Some(value),
        _ => None,
    }
}

impl FromStr for FiscalQuarter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let label = s.trim().to_ascii_uppercase();
        let invalid = || Error::from(ValidationError::InvalidQuarter(s.to_string()));

        // FY25Q1 / FY2025Q1
        if let Some(rest) = label.strip_prefix("FY") {
            let (year, quarter) = rest.split_once('Q').ok_or_else(invalid)?;
            let year = parse_year(year).ok_or_else(invalid)?;
            let quarter: u8 = quarter.parse().map_err(|_| invalid())?;
            return FiscalQuarter::new(year, quarter).map_err(|_| invalid());
        }

        // Q1'25
        if let Some(rest) = label.strip_prefix('Q') {
            let (quarter, year) = rest.split_once('\'').ok_or_else(invalid)?;
            let year = parse_year(year).ok_or_else(invalid)?;
            let quarter: u8 = quarter.parse().map_err(|_| invalid())?;
            return FiscalQuarter::new(year, quarter).map_err(|_| invalid());
        }

        Err(invalid())
    }
}

impl fmt::Display for FiscalQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl TryFrom<String> for FiscalQuarter {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FiscalQuarter> for String {
    fn from(value: FiscalQuarter) -> Self {
        value.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_both_label_forms() {
        let q: FiscalQuarter = "FY25Q1".parse().unwrap();
        assert_eq!(q, FiscalQuarter::new(2025, 1).unwrap());
        assert_eq!("Q1'25".parse::<FiscalQuarter>().unwrap(), q);
        assert_eq!("fy2025q1".parse::<FiscalQuarter>().unwrap(), q);
        assert_eq!(q.to_string(), "FY25Q1");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "FY25", "FY25Q5", "Q0'25", "2025-Q1", "FYabQ1"] {
            assert!(bad.parse::<FiscalQuarter>().is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn test_quarter_boundaries() {
        let q1 = FiscalQuarter::new(2025, 1).unwrap();
        assert_eq!(q1.start_date(), date(2024, 4, 1));
        assert_eq!(q1.end_date(), date(2024, 6, 30));

        let q4 = FiscalQuarter::new(2025, 4).unwrap();
        assert_eq!(q4.start_date(), date(2025, 1, 1));
        assert_eq!(q4.end_date(), date(2025, 3, 31));
    }

    #[test]
    fn test_containing() {
        assert_eq!(FiscalQuarter::containing(date(2025, 6, 30)).label(), "FY26Q1");
        assert_eq!(FiscalQuarter::containing(date(2025, 3, 31)).label(), "FY25Q4");
        assert_eq!(FiscalQuarter::containing(date(2024, 10, 1)).label(), "FY25Q3");
    }

    #[test]
    fn test_next_and_distance() {
        let q4 = FiscalQuarter::new(2025, 4).unwrap();
        let next = q4.next();
        assert_eq!(next.label(), "FY26Q1");
        assert_eq!(next.quarters_since(&q4), 1);
        assert_eq!(
            FiscalQuarter::new(2026, 3)
                .unwrap()
                .quarters_since(&FiscalQuarter::new(2025, 1).unwrap()),
            6
        );
    }

    #[test]
    fn test_serde_as_label() {
        let q = FiscalQuarter::new(2025, 2).unwrap();
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(json, "\"FY25Q2\"");
        let back: FiscalQuarter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }
}
