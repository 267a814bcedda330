/// Decimal places for rupee amounts (paise)
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Default NAV per unit when a fund has not published one
pub const DEFAULT_NAV: &str = "100";

/// Default annual management fee rate (1% of commitment)
pub const DEFAULT_MANAGEMENT_FEE_RATE: &str = "0.01";

/// Default GST applied on top of the management fee
pub const DEFAULT_GST_RATE: &str = "0.18";

/// Default stamp duty rate (0.005% of amount due)
pub const DEFAULT_STAMP_DUTY_RATE: &str = "0.00005";

/// Jurisdiction used to tell domestic investors from foreign ones
pub const DEFAULT_DOMESTIC_JURISDICTION: &str = "India";

/// Default matching tolerance in rupees
pub const DEFAULT_MATCH_TOLERANCE: &str = "50";

/// Days after the due date during which automatic reconciliation runs
pub const DEFAULT_RECONCILIATION_WINDOW_DAYS: u32 = 14;

/// Day offsets (after due date) of the two payment reminders
pub const DEFAULT_REMINDER_DAYS: [u32; 2] = [7, 13];

/// Template ids handed to the document renderer
pub const TEMPLATE_ALLOTMENT_SHEET: &str = "allotment-sheet";
pub const TEMPLATE_SEBI_REPORT: &str = "sebi-activity-report";
pub const TEMPLATE_INVI_REPORT: &str = "invi-filing";
