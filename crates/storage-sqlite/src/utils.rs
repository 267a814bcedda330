//! Utility functions for SQLite storage operations.
//!
//! Decimals and dates are stored as TEXT. The parsers here turn a malformed
//! column into a storage error instead of guessing a value.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use fundflow_core::errors::{DatabaseError, Error, Result};
use fundflow_core::FiscalQuarter;

/// Maximum number of parameters for SQLite IN (...) queries.
///
/// SQLite limits the number of parameters in a statement (typically 999),
/// so lists of ids are split into chunks of this size.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Chunk a slice into smaller slices for batch SQLite queries.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

fn corrupt(column: &str, value: &str) -> Error {
    Error::Database(DatabaseError::Internal(format!(
        "invalid value '{}' in column {}",
        value, column
    )))
}

pub(crate) fn parse_decimal(column: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value).map_err(|_| corrupt(column, value))
}

pub(crate) fn parse_date(column: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| corrupt(column, value))
}

pub(crate) fn parse_optional_date(column: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    value.map(|v| parse_date(column, v)).transpose()
}

pub(crate) fn parse_quarter(column: &str, value: &str) -> Result<FiscalQuarter> {
    FiscalQuarter::from_str(value).map_err(|_| corrupt(column, value))
}

/// Parses an enum column through the type's own `parse`.
pub(crate) fn parse_enum<T>(
    column: &str,
    value: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T> {
    parse(value).ok_or_else(|| corrupt(column, value))
}

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_chunk_for_sqlite_splits_long_lists() {
        let items: Vec<i32> = (0..1001).collect();
        let chunks: Vec<_> = chunk_for_sqlite(&items).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 1);
    }

    #[test]
    fn test_decimal_text_keeps_scale() {
        assert_eq!(parse_decimal("amount", "1000.03").unwrap(), dec!(1000.03));
        assert!(parse_decimal("amount", "12,00").is_err());
    }

    #[test]
    fn test_dates_use_iso_format() {
        let d = parse_date("due_date", "2025-06-30").unwrap();
        assert_eq!(format_date(d), "2025-06-30");
        assert!(parse_date("due_date", "30/06/2025").is_err());
        assert_eq!(parse_optional_date("value_date", None).unwrap(), None);
    }
}
