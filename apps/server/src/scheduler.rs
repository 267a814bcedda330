//! Background scheduler for the daily payment reminder sweep.
//!
//! Checks hourly and sweeps once per settlement-calendar day. Each reminder is
//! scheduled on one calendar day, so one sweep per day emits it exactly once.

use std::sync::Arc;

use chrono::NaiveDate;
use fundflow_core::utils::time_utils::settlement_date_today;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

use crate::main_lib::AppState;

const CHECK_INTERVAL_SECS: u64 = 60 * 60;

/// Initial delay before the first sweep (lets the server finish starting)
const INITIAL_DELAY_SECS: u64 = 30;

/// Starts the background reminder sweep.
pub fn start_reminder_scheduler(state: Arc<AppState>) {
    tokio::spawn(async move {
        info!("Reminder scheduler started (daily sweep, hourly check)");

        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;

        let mut check_interval = interval(Duration::from_secs(CHECK_INTERVAL_SECS));
        let mut last_swept: Option<NaiveDate> = None;

        loop {
            check_interval.tick().await;
            let today = settlement_date_today();
            if last_swept == Some(today) {
                debug!("Reminder sweep for {} already ran", today);
                continue;
            }
            if run_sweep(&state, today) {
                last_swept = Some(today);
            }
        }
    });
}

/// Runs one sweep. Returns false when the sweep failed and should be retried.
fn run_sweep(state: &AppState, as_of: NaiveDate) -> bool {
    match state.reconciliation_service.reminder_sweep(as_of) {
        Ok(notices) => {
            info!("Reminder sweep for {}: {} reminder(s) due", as_of, notices.len());
            true
        }
        Err(err) => {
            error!("Reminder sweep for {} failed: {}", as_of, err);
            false
        }
    }
}
