//! Order lifecycle engine: creation, item replacement, submission, lookups
use crate::error::{OrderError, ValidationError};
use crate::history::HistoryRecord;
use crate::number::OrderNumberGenerator;
use crate::order::{Money, NewItem, Order, OrderId, OrderItem, OrderStatus, TimeStamp};
use crate::store::OrderStore;
use crate::utils;
use std::sync::Arc;

/// Bound on fresh order-number draws before giving up on uniqueness.
const NUMBER_ALLOC_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Orders totalling at least this much carry the manager-approval
    /// audit note on submission; below it the note reads auto-approved.
    pub approval_threshold: Money,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            approval_threshold: Money::from_major(1000),
        }
    }
}

pub struct OrderService {
    store: Arc<OrderStore>,
    numbers: OrderNumberGenerator,
    config: ServiceConfig,
}

impl OrderService {
    pub fn new(store: Arc<OrderStore>) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    pub fn with_config(store: Arc<OrderStore>, config: ServiceConfig) -> Self {
        Self {
            store,
            numbers: OrderNumberGenerator::new(),
            config,
        }
    }

    /// Create a new order in `pending` with the given items.
    ///
    /// Items are validated before anything touches the store; the order,
    /// its number-index entry, and the creation audit record commit as
    /// one atomic unit.
    pub fn create_order(&self, actor: &str, items: &[NewItem]) -> Result<Order, OrderError> {
        let items = validate_items(items)?;
        let total = Order::total_of(&items)?;

        let id = OrderId::new(utils::new_uuid_to_bech32("ord")?);
        let order_number = self.allocate_number()?;
        let now = TimeStamp::new();

        let order = Order {
            id: id.clone(),
            order_number,
            total,
            status: OrderStatus::Pending,
            created_by: actor.to_string(),
            approved_by: None,
            created_at: now.clone(),
            updated_at: now,
            deleted_at: None,
            items,
        };
        let record = HistoryRecord::new(
            id,
            None,
            OrderStatus::Pending,
            actor.to_string(),
            "Order created",
        );

        self.store.create(&order, &record).map_err(|e| {
            tracing::error!(order_number = %order.order_number, error = %e, "failed to create order");
            e
        })?;
        tracing::info!(order_id = %order.id, order_number = %order.order_number, total = %order.total, "order created");

        Ok(order)
    }

    /// Replace an order's item set wholesale and recompute the total.
    ///
    /// Only approved orders are frozen; rejected orders stay editable.
    pub fn update_order(
        &self,
        order_id: &OrderId,
        actor: &str,
        items: &[NewItem],
    ) -> Result<Order, OrderError> {
        let items = validate_items(items)?;
        let total = Order::total_of(&items)?;

        let updated = self
            .store
            .update_locked(order_id, |current| {
                if !current.can_be_modified() {
                    return Err(OrderError::StateConflict {
                        status: current.status,
                    });
                }

                let mut next = current.clone();
                next.items = items.clone();
                next.total = total;
                next.updated_at = TimeStamp::new();

                let record = HistoryRecord::new(
                    current.id.clone(),
                    Some(current.status),
                    current.status,
                    actor.to_string(),
                    "Order updated",
                );
                Ok((next, record))
            })
            .map_err(|e| trace_internal("update_order", order_id, e))?;

        tracing::info!(order_id = %updated.id, total = %updated.total, "order items replaced");
        Ok(updated)
    }

    /// Submit a pending order.
    ///
    /// The approval threshold selects the audit note only; submission
    /// always transitions the order to `approved`.
    pub fn submit_for_approval(
        &self,
        order_id: &OrderId,
        actor: &str,
    ) -> Result<Order, OrderError> {
        let threshold = self.config.approval_threshold;

        let updated = self
            .store
            .update_locked(order_id, |current| {
                if !current.is_pending_approval() {
                    return Err(OrderError::StateConflict {
                        status: current.status,
                    });
                }
                if current.items.is_empty() {
                    return Err(ValidationError::NoItems.into());
                }

                let note = if current.requires_approval(threshold) {
                    "Order submitted for approval"
                } else {
                    "Order auto-approved"
                };

                let mut next = current.clone();
                next.status = OrderStatus::Approved;
                next.updated_at = TimeStamp::new();

                let record = HistoryRecord::new(
                    current.id.clone(),
                    Some(OrderStatus::Pending),
                    OrderStatus::Approved,
                    actor.to_string(),
                    note,
                );
                Ok((next, record))
            })
            .map_err(|e| trace_internal("submit_for_approval", order_id, e))?;

        tracing::info!(order_id = %updated.id, status = %updated.status, "order submitted");
        Ok(updated)
    }

    /// Read-only lookup with items attached; absence is not an error.
    pub fn get_by_order_number(&self, order_number: &str) -> Result<Option<Order>, OrderError> {
        self.store.get_by_number(order_number)
    }

    /// Audit trail for an order, newest first.
    pub fn get_history(&self, order_id: &OrderId) -> Result<Vec<HistoryRecord>, OrderError> {
        self.store.history(order_id)
    }

    // Generate-and-check keeps order numbers unique without trusting the
    // random suffix alone.
    fn allocate_number(&self) -> Result<String, OrderError> {
        for _ in 0..NUMBER_ALLOC_ATTEMPTS {
            let candidate = self.numbers.generate();
            if !self.store.contains_number(&candidate)? {
                return Ok(candidate);
            }
        }
        Err(OrderError::Internal(anyhow::anyhow!(
            "could not allocate a unique order number after {NUMBER_ALLOC_ATTEMPTS} attempts"
        )))
    }
}

pub(crate) fn validate_items(items: &[NewItem]) -> Result<Vec<OrderItem>, ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::NoItems);
    }
    items.iter().map(NewItem::validate).collect()
}

pub(crate) fn trace_internal(
    operation: &'static str,
    order_id: &OrderId,
    e: OrderError,
) -> OrderError {
    if matches!(e, OrderError::Internal(_)) {
        tracing::error!(%order_id, operation, error = %e, "unexpected failure");
    }
    e
}
