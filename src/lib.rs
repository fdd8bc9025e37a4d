//! Purchase order lifecycle and approval engine.
//!
//! Orders move through a three-state machine (`pending` → `approved` or
//! `rejected`, both terminal). Every state change commits atomically with
//! an append-only audit record, and concurrent mutations of one order are
//! serialized by an exclusive per-order lock with bounded retry.

pub mod approval;
pub mod error;
pub mod history;
pub mod number;
pub mod order;
pub mod service;
pub mod store;
pub mod utils;

pub use approval::ApprovalService;
pub use error::{OrderError, ValidationError};
pub use history::{HistoryRecord, HistoryRecorder};
pub use number::OrderNumberGenerator;
pub use order::{Money, NewItem, Order, OrderId, OrderItem, OrderStatus, TimeStamp};
pub use service::{OrderService, ServiceConfig};
pub use store::{OrderStore, StoreConfig};
