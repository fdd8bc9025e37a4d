//! Approve/reject transitions for orders awaiting approval
use crate::error::OrderError;
use crate::history::HistoryRecord;
use crate::order::{Order, OrderId, OrderStatus, TimeStamp};
use crate::service::trace_internal;
use crate::store::OrderStore;
use std::sync::Arc;

/// Owns the two terminal transitions out of `pending`. Both are checked
/// against the current status under the row lock, so a repeated approve
/// or reject always fails rather than silently succeeding.
pub struct ApprovalService {
    store: Arc<OrderStore>,
}

impl ApprovalService {
    pub fn new(store: Arc<OrderStore>) -> Self {
        Self { store }
    }

    /// Approve a pending order and record the approver.
    pub fn approve_order(&self, order_id: &OrderId, actor: &str) -> Result<Order, OrderError> {
        let updated = self
            .store
            .update_locked(order_id, |current| {
                if !current.is_pending_approval() {
                    return Err(OrderError::StateConflict {
                        status: current.status,
                    });
                }

                let mut next = current.clone();
                next.status = OrderStatus::Approved;
                next.approved_by = Some(actor.to_string());
                next.updated_at = TimeStamp::new();

                let record = HistoryRecord::new(
                    current.id.clone(),
                    Some(OrderStatus::Pending),
                    OrderStatus::Approved,
                    actor.to_string(),
                    "Order approved",
                );
                Ok((next, record))
            })
            .map_err(|e| trace_internal("approve_order", order_id, e))?;

        tracing::info!(order_id = %updated.id, approved_by = actor, "order approved");
        Ok(updated)
    }

    /// Reject a pending order. The optional reason becomes the audit
    /// note; without one the note reads "Order rejected".
    pub fn reject_order(
        &self,
        order_id: &OrderId,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<Order, OrderError> {
        let note = reason.unwrap_or("Order rejected").to_string();

        let updated = self
            .store
            .update_locked(order_id, |current| {
                if !current.is_pending_approval() {
                    return Err(OrderError::StateConflict {
                        status: current.status,
                    });
                }

                let mut next = current.clone();
                next.status = OrderStatus::Rejected;
                next.updated_at = TimeStamp::new();

                let record = HistoryRecord::new(
                    current.id.clone(),
                    Some(OrderStatus::Pending),
                    OrderStatus::Rejected,
                    actor.to_string(),
                    note.clone(),
                );
                Ok((next, record))
            })
            .map_err(|e| trace_internal("reject_order", order_id, e))?;

        tracing::info!(order_id = %updated.id, "order rejected");
        Ok(updated)
    }
}
