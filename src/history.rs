//! Append-only audit trail for order state transitions
use crate::error::OrderError;
use crate::order::{OrderId, OrderStatus, TimeStamp};
use chrono::Utc;

/// One immutable audit entry. `status` is the status before the
/// transition; it is `None` only for the creation event.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct HistoryRecord {
    #[n(0)]
    pub order_id: OrderId,
    #[n(1)]
    pub status: Option<OrderStatus>,
    #[n(2)]
    pub new_status: OrderStatus,
    #[n(3)]
    pub changed_by: String,
    #[n(4)]
    pub note: String,
    #[n(5)]
    pub created_at: TimeStamp<Utc>,
}

impl HistoryRecord {
    pub fn new(
        order_id: OrderId,
        status: Option<OrderStatus>,
        new_status: OrderStatus,
        changed_by: String,
        note: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            status,
            new_status,
            changed_by,
            note: note.into(),
            created_at: TimeStamp::new(),
        }
    }
}

/// Stages audit entries into the caller's batch so the record commits in
/// the same atomic unit as the state change it documents. There is no
/// update or delete.
pub struct HistoryRecorder;

impl HistoryRecorder {
    /// Stage `record` as entry number `seq` for its order.
    pub fn append(
        batch: &mut sled::Batch,
        seq: u64,
        record: &HistoryRecord,
    ) -> Result<(), OrderError> {
        let bytes = minicbor::to_vec(record).map_err(anyhow::Error::from)?;
        batch.insert(key(&record.order_id, seq), bytes);
        Ok(())
    }
}

/// Key prefix under which all of an order's history entries live.
pub(crate) fn prefix(order_id: &OrderId) -> Vec<u8> {
    let mut k = Vec::with_capacity(8 + order_id.as_str().len() + 1);
    k.extend_from_slice(b"history/");
    k.extend_from_slice(order_id.as_str().as_bytes());
    k.push(b'/');
    k
}

/// Big-endian sequence suffix keeps lexicographic key order equal to
/// append order, so a prefix scan yields the exact transition sequence.
pub(crate) fn key(order_id: &OrderId, seq: u64) -> Vec<u8> {
    let mut k = prefix(order_id);
    k.extend_from_slice(&seq.to_be_bytes());
    k
}
