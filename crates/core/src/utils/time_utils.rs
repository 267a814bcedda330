use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Timezone in which settlement dates (due dates, reminder days) are reckoned.
pub const SETTLEMENT_TZ: Tz = chrono_tz::Asia::Kolkata;

/// Converts a UTC instant to a settlement date in the given timezone.
pub fn settlement_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Today's settlement date. Only runtime adapters call this; core operations
/// take the date as an explicit argument.
pub fn settlement_date_today() -> NaiveDate {
    settlement_date_from_utc(Utc::now(), SETTLEMENT_TZ)
}

/// Whole days from `start` to `end` (negative when `end` is earlier).
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}
