//! Persistence boundary: sled-backed order storage with row-level
//! exclusive locks and bounded retry on transient conflicts.
//!
//! All records live in the database's default tree under key prefixes
//! (`order/`, `number/`, `history/`) so one `sled::Batch` commits an
//! order mutation and its audit entry atomically.
use crate::error::OrderError;
use crate::history::{self, HistoryRecord, HistoryRecorder};
use crate::order::{Order, OrderId};
use anyhow::anyhow;
use sled::Batch;
use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long a mutation waits for an order's exclusive lock before
    /// reporting a transient conflict.
    pub lock_wait_timeout: Duration,
    /// Attempts per mutating operation; only transient conflicts retry.
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_wait_timeout: Duration::from_secs(5),
            max_attempts: 5,
            retry_backoff: Duration::from_millis(10),
        }
    }
}

pub struct OrderStore {
    db: Arc<sled::Db>,
    locks: RowLocks,
    config: StoreConfig,
}

impl OrderStore {
    pub fn new(db: Arc<sled::Db>, config: StoreConfig) -> Self {
        Self {
            db,
            locks: RowLocks::new(),
            config,
        }
    }

    /// Read an order by id. Soft-deleted rows read as absent.
    pub fn get(&self, id: &OrderId) -> Result<Option<Order>, OrderError> {
        let Some(bytes) = self.db.get(order_key(id))? else {
            return Ok(None);
        };
        let order: Order = minicbor::decode(&bytes).map_err(anyhow::Error::from)?;

        Ok((order.deleted_at.is_none()).then_some(order))
    }

    /// Look up an order through the unique order-number index.
    pub fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, OrderError> {
        let Some(bytes) = self.db.get(number_key(order_number))? else {
            return Ok(None);
        };
        let id = OrderId::new(
            String::from_utf8(bytes.to_vec())
                .map_err(|e| anyhow!("corrupt order-number index: {e}"))?,
        );
        self.get(&id)
    }

    pub fn contains_number(&self, order_number: &str) -> Result<bool, OrderError> {
        Ok(self.db.contains_key(number_key(order_number))?)
    }

    /// Full audit trail for an order, newest first. An unknown order id
    /// yields an empty list.
    pub fn history(&self, id: &OrderId) -> Result<Vec<HistoryRecord>, OrderError> {
        let mut records = Vec::new();
        for entry in self.db.scan_prefix(history::prefix(id)) {
            let (_, bytes) = entry?;
            records.push(minicbor::decode(&bytes).map_err(anyhow::Error::from)?);
        }
        records.reverse();
        Ok(records)
    }

    /// Persist a brand-new order, its number-index entry, and its
    /// creation audit record in one atomic batch. The id is fresh, so no
    /// lock is needed.
    pub fn create(&self, order: &Order, record: &HistoryRecord) -> Result<(), OrderError> {
        // creation takes no row lock, so the index check here is the last
        // defense against two creators drawing the same number
        if self.db.contains_key(number_key(&order.order_number))? {
            return Err(OrderError::TransientConflict(format!(
                "order number {} already allocated",
                order.order_number
            )));
        }

        let mut batch = Batch::default();
        batch.insert(
            order_key(&order.id),
            minicbor::to_vec(order).map_err(anyhow::Error::from)?,
        );
        batch.insert(
            number_key(&order.order_number),
            order.id.as_str().as_bytes(),
        );
        HistoryRecorder::append(&mut batch, 0, record)?;
        self.db.apply_batch(batch)?;

        Ok(())
    }

    /// Run a state transition under the order's exclusive row lock.
    ///
    /// `f` sees the current committed row and returns the updated order
    /// plus the audit record for the transition; both are committed in
    /// one batch before the lock is released. Transient conflicts (lock
    /// wait timeouts) retry up to `StoreConfig::max_attempts`; once
    /// exhausted the failure surfaces as an internal error. Validation
    /// and state-conflict errors from `f` propagate immediately.
    pub fn update_locked<F>(&self, id: &OrderId, f: F) -> Result<Order, OrderError>
    where
        F: Fn(&Order) -> Result<(Order, HistoryRecord), OrderError>,
    {
        let mut attempt = 1;
        loop {
            match self.try_update_locked(id, &f) {
                Err(e) if e.is_transient() && attempt < self.config.max_attempts => {
                    tracing::warn!(order_id = %id, attempt, error = %e, "retrying after transient conflict");
                    std::thread::sleep(self.config.retry_backoff);
                    attempt += 1;
                }
                Err(OrderError::TransientConflict(msg)) => {
                    tracing::error!(order_id = %id, attempts = attempt, "exhausted retries on transient conflict");
                    return Err(OrderError::Internal(anyhow!(
                        "gave up after {attempt} attempts: {msg}"
                    )));
                }
                other => return other,
            }
        }
    }

    fn try_update_locked<F>(&self, id: &OrderId, f: &F) -> Result<Order, OrderError>
    where
        F: Fn(&Order) -> Result<(Order, HistoryRecord), OrderError>,
    {
        let _guard = self.locks.acquire(id, self.config.lock_wait_timeout)?;

        let current = self
            .get(id)?
            .ok_or_else(|| OrderError::Internal(anyhow!("order {id} not found for locked update")))?;

        let (updated, record) = f(&current)?;

        // Sequence allocated under the lock, so append order is the
        // commit order of the mutations that produced the records.
        let seq = self.history_len(id)?;
        let mut batch = Batch::default();
        batch.insert(
            order_key(&updated.id),
            minicbor::to_vec(&updated).map_err(anyhow::Error::from)?,
        );
        HistoryRecorder::append(&mut batch, seq, &record)?;
        self.db.apply_batch(batch)?;

        Ok(updated)
    }

    fn history_len(&self, id: &OrderId) -> Result<u64, OrderError> {
        let mut n = 0;
        for entry in self.db.scan_prefix(history::prefix(id)) {
            entry?;
            n += 1;
        }
        Ok(n)
    }
}

fn order_key(id: &OrderId) -> Vec<u8> {
    let mut k = Vec::with_capacity(6 + id.as_str().len());
    k.extend_from_slice(b"order/");
    k.extend_from_slice(id.as_str().as_bytes());
    k
}

fn number_key(order_number: &str) -> Vec<u8> {
    let mut k = Vec::with_capacity(7 + order_number.len());
    k.extend_from_slice(b"number/");
    k.extend_from_slice(order_number.as_bytes());
    k
}

/// In-process registry of exclusive per-order locks. Contention is
/// scoped to a single order id; distinct orders never block each other.
#[derive(Debug)]
struct RowLocks {
    held: Mutex<HashSet<OrderId>>,
    released: Condvar,
}

impl RowLocks {
    fn new() -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
        }
    }

    fn acquire(&self, id: &OrderId, timeout: Duration) -> Result<RowLockGuard<'_>, OrderError> {
        let deadline = Instant::now() + timeout;
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());

        while held.contains(id) {
            let now = Instant::now();
            if now >= deadline {
                return Err(OrderError::TransientConflict(format!(
                    "lock wait timeout on order {id}"
                )));
            }
            held = self
                .released
                .wait_timeout(held, deadline - now)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }

        held.insert(id.clone());
        Ok(RowLockGuard { locks: self, id: id.clone() })
    }

    fn release(&self, id: &OrderId) {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(id);
        drop(held);
        self.released.notify_all();
    }
}

#[derive(Debug)]
struct RowLockGuard<'a> {
    locks: &'a RowLocks,
    id: OrderId,
}

impl Drop for RowLockGuard<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.id);
    }
}
