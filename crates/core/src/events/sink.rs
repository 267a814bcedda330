//! Where settlement services hand off their events.

use std::sync::{Arc, Mutex, MutexGuard};

use super::DomainEvent;
use crate::status::LineItemStatus;

/// Receives settlement events once the ledger write behind them has committed.
///
/// The server forwards them to the audit log. Notices, reminder mail and
/// allotment letters hang off the same stream.
///
/// `emit` runs inside the request that performed the write, so it must return
/// quickly and must not touch the ledger. Losing an event never undoes the
/// write it describes.
pub trait DomainEventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);

    /// Hands over the events of one write in the order they happened.
    fn emit_batch(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// Drops every event. Used by batch tools that only care about ledger state.
#[derive(Clone, Default)]
pub struct NoOpDomainEventSink;

impl DomainEventSink for NoOpDomainEventSink {
    fn emit(&self, _event: DomainEvent) {}
}

/// Keeps every event in memory so tests can assert what a settlement step
/// announced.
#[derive(Clone, Default)]
pub struct MockDomainEventSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl MockDomainEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking test thread must not hide the events recorded before it.
    fn recorded(&self) -> MutexGuard<'_, Vec<DomainEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.recorded().clone()
    }

    pub fn clear(&self) {
        self.recorded().clear();
    }

    pub fn len(&self) -> usize {
        self.recorded().len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded().is_empty()
    }

    /// Status moves recorded for one line item, oldest first.
    pub fn status_moves(&self, line_item_id: &str) -> Vec<(LineItemStatus, LineItemStatus)> {
        self.recorded()
            .iter()
            .filter_map(|event| match event {
                DomainEvent::LineItemStatusChanged {
                    line_item_id: id,
                    from,
                    to,
                } if id == line_item_id => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    /// Events that start follow-up work such as notices or letters.
    pub fn actionable(&self) -> Vec<DomainEvent> {
        self.recorded()
            .iter()
            .filter(|event| !event.is_audit_only())
            .cloned()
            .collect()
    }
}

impl DomainEventSink for MockDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        self.recorded().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skipped(reference: &str) -> DomainEvent {
        DomainEvent::duplicate_transaction_skipped("fund-1".to_string(), reference.to_string())
    }

    fn moved(line_item_id: &str, from: LineItemStatus, to: LineItemStatus) -> DomainEvent {
        DomainEvent::line_item_status_changed(line_item_id.to_string(), from, to)
    }

    #[test]
    fn test_noop_sink_discards_batches() {
        let sink = NoOpDomainEventSink;
        sink.emit(skipped("UTR1"));
        sink.emit_batch(vec![skipped("UTR2"), skipped("UTR3")]);
    }

    #[test]
    fn test_mock_sink_keeps_batch_order() {
        let sink = MockDomainEventSink::new();
        assert!(sink.is_empty());

        sink.emit(skipped("UTR1"));
        sink.emit_batch(vec![skipped("UTR2"), skipped("UTR3")]);
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.events()[2], skipped("UTR3"));

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_status_moves_for_one_line_item() {
        let sink = MockDomainEventSink::new();
        sink.emit_batch(vec![
            moved("li-1", LineItemStatus::NoticePending, LineItemStatus::Sent),
            moved("li-2", LineItemStatus::NoticePending, LineItemStatus::Cancelled),
            skipped("UTR1"),
            moved("li-1", LineItemStatus::Sent, LineItemStatus::WirePending),
        ]);

        assert_eq!(
            sink.status_moves("li-1"),
            vec![
                (LineItemStatus::NoticePending, LineItemStatus::Sent),
                (LineItemStatus::Sent, LineItemStatus::WirePending),
            ]
        );
        assert!(sink.status_moves("li-9").is_empty());
        assert!(sink.actionable().is_empty());
    }

    #[test]
    fn test_sink_survives_a_poisoned_lock() {
        let sink = MockDomainEventSink::new();
        sink.emit(skipped("UTR1"));

        let shared = sink.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.events.lock().unwrap();
            panic!("test thread failed while holding the lock");
        })
        .join();

        sink.emit(skipped("UTR2"));
        assert_eq!(sink.len(), 2);
    }
}
