//! Logical lock keyed by (fund, quarter).
//!
//! Reconciliation, allotment and drawdown issue all read and then write the
//! same line items, so runs for one fund-quarter are serialized. Different
//! funds or quarters proceed in parallel.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::utils::FiscalQuarter;

#[derive(Default)]
pub struct QuarterLocks {
    locks: DashMap<(String, FiscalQuarter), Arc<Mutex<()>>>,
}

/// Held for the duration of a (fund, quarter) operation.
pub type QuarterGuard = OwnedMutexGuard<()>;

impl QuarterLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other operation holds the (fund, quarter) pair.
    pub async fn acquire(&self, fund_id: &str, quarter: FiscalQuarter) -> QuarterGuard {
        let lock = self
            .locks
            .entry((fund_id.to_string(), quarter))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Returns a guard only if the pair is free right now.
    pub fn try_acquire(&self, fund_id: &str, quarter: FiscalQuarter) -> Option<QuarterGuard> {
        let lock = self
            .locks
            .entry((fund_id.to_string(), quarter))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.try_lock_owned().ok()
    }
}
