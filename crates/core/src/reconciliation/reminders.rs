//! Reminder schedule arithmetic. Offsets count days after the due date.

use chrono::{Duration, NaiveDate};

use super::ReminderStatus;
use crate::utils::time_utils::days_between;

/// Reminder progress for a line item as of `as_of`.
///
/// `settled_on` is the date the line item became fully paid, if it has.
/// Reminders stop on that day.
pub fn reminder_status(
    due_date: NaiveDate,
    as_of: NaiveDate,
    offsets: [u32; 2],
    window_days: u32,
    settled_on: Option<NaiveDate>,
) -> ReminderStatus {
    let elapsed = days_between(due_date, as_of);
    let cutoff = settled_on.map(|d| days_between(due_date, d));

    let fired_days: Vec<u32> = offsets
        .iter()
        .copied()
        .filter(|&day| i64::from(day) <= elapsed)
        .filter(|&day| cutoff.map_or(true, |c| i64::from(day) < c))
        .collect();

    let next_day = if settled_on.is_some() {
        None
    } else {
        offsets
            .iter()
            .copied()
            .find(|&day| i64::from(day) > elapsed && day <= window_days)
    };

    ReminderStatus {
        fired_days,
        next_day,
        next_date: next_day.map(|d| due_date + Duration::days(i64::from(d))),
    }
}

/// The reminder that falls exactly on `as_of`, as `(reminder_number, day_offset)`.
pub fn reminder_due_on(
    due_date: NaiveDate,
    as_of: NaiveDate,
    offsets: [u32; 2],
) -> Option<(u8, u32)> {
    let elapsed = days_between(due_date, as_of);
    offsets
        .iter()
        .zip(1u8..)
        .find(|(&day, _)| i64::from(day) == elapsed)
        .map(|(&day, number)| (number, day))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_ten_has_fired_first_reminder() {
        let due = date(2025, 7, 1);
        let status = reminder_status(due, date(2025, 7, 11), [7, 13], 14, None);
        assert_eq!(status.fired_days, vec![7]);
        assert_eq!(status.next_day, Some(13));
        assert_eq!(status.next_date, Some(date(2025, 7, 14)));
    }

    #[test]
    fn test_before_due_date_nothing_fired() {
        let due = date(2025, 7, 1);
        let status = reminder_status(due, date(2025, 6, 25), [7, 13], 14, None);
        assert!(status.fired_days.is_empty());
        assert_eq!(status.next_day, Some(7));
    }

    #[test]
    fn test_settlement_stops_reminders() {
        let due = date(2025, 7, 1);
        let status = reminder_status(due, date(2025, 7, 20), [7, 13], 14, Some(date(2025, 7, 10)));
        assert_eq!(status.fired_days, vec![7]);
        assert_eq!(status.next_day, None);
        assert_eq!(status.next_date, None);
    }

    #[test]
    fn test_reminder_due_on_exact_day_only() {
        let due = date(2025, 7, 1);
        assert_eq!(reminder_due_on(due, date(2025, 7, 8), [7, 13]), Some((1, 7)));
        assert_eq!(reminder_due_on(due, date(2025, 7, 14), [7, 13]), Some((2, 13)));
        assert_eq!(reminder_due_on(due, date(2025, 7, 9), [7, 13]), None);
    }
}
