use crate::order::OrderStatus;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("order must have at least one item")]
    NoItems,
    #[error("item name must not be empty")]
    EmptyItemName,
    #[error("item name must be at most 255 characters")]
    NameTooLong,
    #[error("item quantity must be at least 1")]
    ZeroQuantity,
    #[error("item price must be at least 0.01")]
    PriceBelowMinimum,
    #[error("item amounts overflow the order total")]
    AmountOverflow,
}

#[derive(thiserror::Error, Debug)]
pub enum OrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("operation not allowed while order is {status}")]
    StateConflict { status: OrderStatus },
    #[error("transient store conflict: {0}")]
    TransientConflict(String),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl OrderError {
    /// Transient conflicts are the only kind worth retrying; validation and
    /// state conflicts are deterministic.
    pub fn is_transient(&self) -> bool {
        matches!(self, OrderError::TransientConflict(_))
    }
}

// sled failures are never part of the caller-facing taxonomy
impl From<sled::Error> for OrderError {
    fn from(e: sled::Error) -> Self {
        OrderError::Internal(e.into())
    }
}
