use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use super::{LineItemStatus, StatusError, StatusUpdate, Transition};
use crate::drawdowns::{DrawdownLineItem, DrawdownRepositoryTrait};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};

#[async_trait]
pub trait StatusServiceTrait: Send + Sync {
    /// Moves one line item to `target`, or fails with `InvalidTransition`.
    /// Allotment Done and inVi Filed are not valid targets here.
    async fn transition_status(
        &self,
        line_item_id: &str,
        target: LineItemStatus,
    ) -> Result<DrawdownLineItem>;

    /// Cancels every live line item of a drawdown. Refused once any line
    /// item has been allotted.
    async fn cancel_drawdown(&self, drawdown_id: &str) -> Result<Vec<DrawdownLineItem>>;
}

pub struct StatusService {
    drawdown_repository: Arc<dyn DrawdownRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl StatusService {
    pub fn new(
        drawdown_repository: Arc<dyn DrawdownRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            drawdown_repository,
            event_sink,
        }
    }

    fn emit_changes(&self, updates: &[StatusUpdate]) {
        self.event_sink.emit_batch(
            updates
                .iter()
                .map(|u| DomainEvent::line_item_status_changed(u.line_item_id.clone(), u.from, u.to))
                .collect(),
        );
    }
}

#[async_trait]
impl StatusServiceTrait for StatusService {
    async fn transition_status(
        &self,
        line_item_id: &str,
        target: LineItemStatus,
    ) -> Result<DrawdownLineItem> {
        let item = self.drawdown_repository.get_line_item(line_item_id)?;

        if !target.is_manual_target() && item.status != target {
            return Err(StatusError::ManualTargetNotAllowed {
                line_item_id: line_item_id.to_string(),
                target,
            }
            .into());
        }

        if item.status.check_transition(target, line_item_id)? == Transition::Unchanged {
            return Ok(item);
        }

        let update = StatusUpdate {
            line_item_id: line_item_id.to_string(),
            from: item.status,
            to: target,
        };
        let mut updated = self
            .drawdown_repository
            .apply_status_updates(vec![update.clone()])
            .await?;

        info!(
            "Line item {} moved from {} to {}",
            line_item_id, update.from, update.to
        );
        self.emit_changes(&[update]);

        updated
            .pop()
            .ok_or_else(|| crate::Error::Unexpected(format!("line item {} vanished", line_item_id)))
    }

    async fn cancel_drawdown(&self, drawdown_id: &str) -> Result<Vec<DrawdownLineItem>> {
        // Loads the drawdown first so an unknown id surfaces as NotFound.
        self.drawdown_repository.get_drawdown(drawdown_id)?;
        let items = self.drawdown_repository.list_line_items(drawdown_id)?;

        let allotted: Vec<String> = items
            .iter()
            .filter(|i| i.status.is_allotted())
            .map(|i| i.id.clone())
            .collect();
        if !allotted.is_empty() {
            return Err(StatusError::CancelAfterAllotment {
                drawdown_id: drawdown_id.to_string(),
                line_item_ids: allotted,
            }
            .into());
        }

        let updates: Vec<StatusUpdate> = items
            .iter()
            .filter(|i| !i.status.is_cancelled())
            .map(|i| StatusUpdate {
                line_item_id: i.id.clone(),
                from: i.status,
                to: LineItemStatus::Cancelled,
            })
            .collect();

        if updates.is_empty() {
            return Ok(items);
        }

        self.drawdown_repository
            .apply_status_updates(updates.clone())
            .await?;
        info!(
            "Cancelled drawdown {} ({} line items)",
            drawdown_id,
            updates.len()
        );
        self.emit_changes(&updates);

        self.drawdown_repository.list_line_items(drawdown_id)
    }
}
