//! Line-item statuses and the rules for moving between them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::StatusError;

/// Lifecycle state of one drawdown line item.
///
/// Normal flow is Notice Pending, Sent, Wire Pending or Demat Pending,
/// Acceptance Pending, Allotment Pending, Allotment Done. `InviFiled` is a
/// marker layered on Allotment Done; `Cancelled` is a side branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineItemStatus {
    NoticePending,
    Sent,
    WirePending,
    DematPending,
    AcceptancePending,
    AllotmentPending,
    AllotmentDone,
    InviFiled,
    Cancelled,
}

/// Outcome of validating a requested transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target equals the current state; nothing to write.
    Unchanged,
    Advance,
}

impl LineItemStatus {
    pub const ALL: [LineItemStatus; 9] = [
        LineItemStatus::NoticePending,
        LineItemStatus::Sent,
        LineItemStatus::WirePending,
        LineItemStatus::DematPending,
        LineItemStatus::AcceptancePending,
        LineItemStatus::AllotmentPending,
        LineItemStatus::AllotmentDone,
        LineItemStatus::InviFiled,
        LineItemStatus::Cancelled,
    ];

    /// Position along the forward path. Wire and Demat Pending are
    /// alternatives and share a rank. `None` for Cancelled.
    pub fn rank(&self) -> Option<u8> {
        match self {
            LineItemStatus::NoticePending => Some(0),
            LineItemStatus::Sent => Some(1),
            LineItemStatus::WirePending | LineItemStatus::DematPending => Some(2),
            LineItemStatus::AcceptancePending => Some(3),
            LineItemStatus::AllotmentPending => Some(4),
            LineItemStatus::AllotmentDone => Some(5),
            LineItemStatus::InviFiled => Some(6),
            LineItemStatus::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, LineItemStatus::Cancelled)
    }

    /// False for the states only allotment and inVi filing may set.
    pub fn is_manual_target(&self) -> bool {
        !self.is_allotted()
    }

    /// Allotment Done or the inVi marker on top of it.
    pub fn is_allotted(&self) -> bool {
        matches!(
            self,
            LineItemStatus::AllotmentDone | LineItemStatus::InviFiled
        )
    }

    /// Payments may still be attached to the line item.
    pub fn accepts_payments(&self) -> bool {
        !self.is_cancelled() && !self.is_allotted()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemStatus::NoticePending => "NOTICE_PENDING",
            LineItemStatus::Sent => "SENT",
            LineItemStatus::WirePending => "WIRE_PENDING",
            LineItemStatus::DematPending => "DEMAT_PENDING",
            LineItemStatus::AcceptancePending => "ACCEPTANCE_PENDING",
            LineItemStatus::AllotmentPending => "ALLOTMENT_PENDING",
            LineItemStatus::AllotmentDone => "ALLOTMENT_DONE",
            LineItemStatus::InviFiled => "INVI_FILED",
            LineItemStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// Checks whether `self -> target` is allowed.
    ///
    /// Moves are forward-only (skipping intermediate states is fine), except
    /// the explicit cancel from any state before Allotment Done. The inVi
    /// marker can only be set on Allotment Done.
    pub fn check_transition(
        &self,
        target: LineItemStatus,
        line_item_id: &str,
    ) -> Result<Transition, StatusError> {
        if *self == target {
            return Ok(Transition::Unchanged);
        }

        let allowed = match (self.rank(), target) {
            (None, _) => false,
            (Some(from), LineItemStatus::Cancelled) => from < 5,
            (_, LineItemStatus::InviFiled) => *self == LineItemStatus::AllotmentDone,
            (Some(from), to) => to.rank().is_some_and(|to_rank| to_rank > from),
        };

        if allowed {
            Ok(Transition::Advance)
        } else {
            Err(StatusError::InvalidTransition {
                line_item_id: line_item_id.to_string(),
                from: *self,
                to: target,
            })
        }
    }
}

impl fmt::Display for LineItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status write guarded by the status the caller last read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub line_item_id: String,
    pub from: LineItemStatus,
    pub to: LineItemStatus,
}

/// Derives a drawdown's status from its line items.
///
/// The drawdown sits at the least advanced status among its live line items;
/// it is Cancelled only when every line item is. `None` for an empty drawdown.
pub fn rollup_status<I>(statuses: I) -> Option<LineItemStatus>
where
    I: IntoIterator<Item = LineItemStatus>,
{
    let mut any = false;
    let mut least: Option<LineItemStatus> = None;

    for status in statuses {
        any = true;
        let Some(rank) = status.rank() else {
            continue;
        };
        match least {
            Some(current) if current.rank().is_some_and(|r| r <= rank) => {}
            _ => least = Some(status),
        }
    }

    match (any, least) {
        (false, _) => None,
        (true, None) => Some(LineItemStatus::Cancelled),
        (true, Some(status)) => Some(status),
    }
}

#[cfg(test)]
mod tests {
    use super::LineItemStatus::*;
    use super::*;

    #[test]
    fn test_forward_moves_and_skips_are_allowed() {
        assert_eq!(
            NoticePending.check_transition(Sent, "li").unwrap(),
            Transition::Advance
        );
        assert_eq!(
            Sent.check_transition(AllotmentPending, "li").unwrap(),
            Transition::Advance
        );
        assert_eq!(
            AllotmentDone.check_transition(InviFiled, "li").unwrap(),
            Transition::Advance
        );
    }

    #[test]
    fn test_backward_moves_are_rejected() {
        let err = AllotmentDone.check_transition(WirePending, "li-9").unwrap_err();
        match err {
            StatusError::InvalidTransition {
                line_item_id,
                from,
                to,
            } => {
                assert_eq!(line_item_id, "li-9");
                assert_eq!(from, AllotmentDone);
                assert_eq!(to, WirePending);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_wire_and_demat_are_alternatives() {
        assert!(WirePending.check_transition(DematPending, "li").is_err());
        assert!(DematPending.check_transition(WirePending, "li").is_err());
        assert!(WirePending.check_transition(AcceptancePending, "li").is_ok());
    }

    #[test]
    fn test_cancel_rules() {
        for status in [NoticePending, Sent, WirePending, AcceptancePending, AllotmentPending] {
            assert!(status.check_transition(Cancelled, "li").is_ok());
        }
        assert!(AllotmentDone.check_transition(Cancelled, "li").is_err());
        assert!(InviFiled.check_transition(Cancelled, "li").is_err());
        assert!(Cancelled.check_transition(Sent, "li").is_err());
    }

    #[test]
    fn test_invi_marker_only_on_allotment_done() {
        assert!(AllotmentPending.check_transition(InviFiled, "li").is_err());
        assert!(Sent.check_transition(InviFiled, "li").is_err());
    }

    #[test]
    fn test_same_state_is_unchanged() {
        assert_eq!(
            Sent.check_transition(Sent, "li").unwrap(),
            Transition::Unchanged
        );
        assert_eq!(
            Cancelled.check_transition(Cancelled, "li").unwrap(),
            Transition::Unchanged
        );
    }

    #[test]
    fn test_rollup() {
        assert_eq!(rollup_status(Vec::new()), None);
        assert_eq!(
            rollup_status(vec![AllotmentDone, AllotmentDone]),
            Some(AllotmentDone)
        );
        assert_eq!(
            rollup_status(vec![AllotmentDone, Sent, Cancelled]),
            Some(Sent)
        );
        assert_eq!(
            rollup_status(vec![Cancelled, Cancelled]),
            Some(Cancelled)
        );
        assert_eq!(rollup_status(vec![InviFiled, AllotmentDone]), Some(AllotmentDone));
    }

    #[test]
    fn test_parse_round_trips_names() {
        for status in LineItemStatus::ALL {
            assert_eq!(LineItemStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(LineItemStatus::parse("allotment_done"), Some(AllotmentDone));
    }
}
