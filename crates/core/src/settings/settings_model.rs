//! Per-fund settlement policy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MATCH_TOLERANCE, DEFAULT_RECONCILIATION_WINDOW_DAYS, DEFAULT_REMINDER_DAYS,
};
use crate::errors::{Error, Result};
use crate::utils::money::const_decimal;

/// When the two payment reminders go out, counted in days after the due date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderSchedule {
    /// Fixed day offsets, e.g. day 7 and day 13.
    FixedDays([u32; 2]),
    /// Fractions of the reconciliation window, e.g. 0.5 and 0.93.
    WindowFraction([f64; 2]),
}

impl Default for ReminderSchedule {
    fn default() -> Self {
        ReminderSchedule::FixedDays(DEFAULT_REMINDER_DAYS)
    }
}

impl ReminderSchedule {
    /// Day offsets for a window of `window_days`, each clamped to 1..=window.
    pub fn offsets(&self, window_days: u32) -> [u32; 2] {
        let window = window_days.max(1);
        match *self {
            ReminderSchedule::FixedDays(days) => days.map(|d| d.clamp(1, window)),
            ReminderSchedule::WindowFraction(fractions) => fractions.map(|f| {
                let day = (f * f64::from(window)).floor();
                (day as u32).clamp(1, window)
            }),
        }
    }
}

/// What happens to money received beyond the amount called.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverpaymentPolicy {
    /// Excess is recorded on the allotment but not converted.
    #[default]
    TrackExcess,
    /// Excess is converted into additional units.
    ConvertToUnits,
    /// Excess is recorded as due for refund.
    Refund,
}

impl OverpaymentPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverpaymentPolicy::TrackExcess => "TRACK_EXCESS",
            OverpaymentPolicy::ConvertToUnits => "CONVERT_TO_UNITS",
            OverpaymentPolicy::Refund => "REFUND",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "TRACK_EXCESS" => Some(OverpaymentPolicy::TrackExcess),
            "CONVERT_TO_UNITS" => Some(OverpaymentPolicy::ConvertToUnits),
            "REFUND" => Some(OverpaymentPolicy::Refund),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SettlementSettings {
    /// Name+amount matches bind when within this many rupees of the balance.
    pub match_tolerance: Decimal,
    pub reconciliation_window_days: u32,
    pub reminder_schedule: ReminderSchedule,
    pub overpayment_policy: OverpaymentPolicy,
}

impl Default for SettlementSettings {
    fn default() -> Self {
        Self {
            match_tolerance: const_decimal(DEFAULT_MATCH_TOLERANCE),
            reconciliation_window_days: DEFAULT_RECONCILIATION_WINDOW_DAYS,
            reminder_schedule: ReminderSchedule::default(),
            overpayment_policy: OverpaymentPolicy::default(),
        }
    }
}

impl SettlementSettings {
    pub fn storage_key(fund_id: &str) -> String {
        format!("settlement:{}", fund_id)
    }

    pub fn reminder_offsets(&self) -> [u32; 2] {
        self.reminder_schedule
            .offsets(self.reconciliation_window_days)
    }

    pub fn validate(&self) -> Result<()> {
        if self.match_tolerance < Decimal::ZERO {
            return Err(Error::InvalidConfigValue(
                "match tolerance cannot be negative".to_string(),
            ));
        }
        if self.reconciliation_window_days == 0 {
            return Err(Error::InvalidConfigValue(
                "reconciliation window must be at least one day".to_string(),
            ));
        }
        match self.reminder_schedule {
            ReminderSchedule::FixedDays([first, second]) => {
                if first == 0 || first >= second || second > self.reconciliation_window_days {
                    return Err(Error::InvalidConfigValue(format!(
                        "reminder days must satisfy 0 < first < second <= {}",
                        self.reconciliation_window_days
                    )));
                }
            }
            ReminderSchedule::WindowFraction([first, second]) => {
                if !(first > 0.0 && first < second && second <= 1.0) {
                    return Err(Error::InvalidConfigValue(
                        "reminder fractions must satisfy 0 < first < second <= 1".to_string(),
                    ));
                }
                let [first_day, second_day] = self.reminder_offsets();
                if first_day >= second_day {
                    return Err(Error::InvalidConfigValue(format!(
                        "reminder fractions fall on days {} and {} of a {}-day window; \
                         the second reminder must come later",
                        first_day, second_day, self.reconciliation_window_days
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let s = SettlementSettings::default();
        assert_eq!(s.match_tolerance, dec!(50));
        assert_eq!(s.reconciliation_window_days, 14);
        assert_eq!(s.reminder_offsets(), [7, 13]);
        assert_eq!(s.overpayment_policy, OverpaymentPolicy::TrackExcess);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_window_fraction_offsets() {
        let schedule = ReminderSchedule::WindowFraction([0.5, 0.93]);
        assert_eq!(schedule.offsets(14), [7, 13]);
        assert_eq!(schedule.offsets(30), [15, 27]);
    }

    #[test]
    fn test_validate_rejects_bad_schedules() {
        let mut s = SettlementSettings::default();
        s.reminder_schedule = ReminderSchedule::FixedDays([13, 7]);
        assert!(s.validate().is_err());

        s.reminder_schedule = ReminderSchedule::FixedDays([7, 20]);
        assert!(s.validate().is_err());

        s.reminder_schedule = ReminderSchedule::WindowFraction([0.0, 0.5]);
        assert!(s.validate().is_err());

        s.reminder_schedule = ReminderSchedule::WindowFraction([0.5, 0.55]);
        assert_eq!(s.reminder_offsets(), [7, 7]);
        assert!(s.validate().is_err());

        s.reconciliation_window_days = 30;
        assert_eq!(s.reminder_offsets(), [15, 16]);
        assert!(s.validate().is_ok());

        s = SettlementSettings::default();
        s.match_tolerance = dec!(-1);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let s: SettlementSettings = serde_json::from_str(r#"{"matchTolerance":100}"#).unwrap();
        assert_eq!(s.match_tolerance, dec!(100));
        assert_eq!(s.reconciliation_window_days, 14);
    }
}
