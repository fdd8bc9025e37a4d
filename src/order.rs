//! Core order value types and their persistence codecs
use crate::error::ValidationError;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// Maximum accepted length for an item name.
const MAX_ITEM_NAME_LEN: usize = 255;

/// Opaque order identifier, assigned by the store layer at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, minicbor::Encode, minicbor::Decode)]
#[cbor(transparent)]
pub struct OrderId(#[n(0)] String);

impl OrderId {
    pub fn new(id: String) -> Self {
        Self(id)
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monetary amount held as a count of minor units (cents).
///
/// Integer minor units keep arithmetic exact; `Display` renders the
/// conventional two-decimal form, e.g. `250.00`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    minicbor::Encode,
    minicbor::Decode,
)]
#[cbor(transparent)]
pub struct Money(#[n(0)] u64);

impl Money {
    pub const ZERO: Money = Money(0);
    /// Smallest chargeable item price, 0.01.
    pub const MIN_PRICE: Money = Money(1);

    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }
    /// Whole currency units, e.g. `from_major(1000)` is 1000.00.
    pub fn from_major(units: u64) -> Self {
        Self(units * 100)
    }
    pub fn cents(self) -> u64 {
        self.0
    }
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }
    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(u64::from(quantity)).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum OrderStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Approved,
    #[n(2)]
    Rejected,
}

impl OrderStatus {
    /// Approved and rejected are terminal; no transition leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Approved | OrderStatus::Rejected)
    }
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied line item, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub quantity: u32,
    pub price: Money,
}

impl NewItem {
    pub fn new(name: impl Into<String>, quantity: u32, price: Money) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
        }
    }

    /// Check field constraints and derive the persisted item with its
    /// redundant subtotal.
    pub fn validate(&self) -> Result<OrderItem, ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyItemName);
        }
        if self.name.chars().count() > MAX_ITEM_NAME_LEN {
            return Err(ValidationError::NameTooLong);
        }
        if self.quantity == 0 {
            return Err(ValidationError::ZeroQuantity);
        }
        if self.price < Money::MIN_PRICE {
            return Err(ValidationError::PriceBelowMinimum);
        }
        let subtotal = self
            .price
            .checked_mul(self.quantity)
            .ok_or(ValidationError::AmountOverflow)?;

        Ok(OrderItem {
            name: self.name.clone(),
            quantity: self.quantity,
            price: self.price,
            subtotal,
        })
    }
}

/// Persisted line item. Invariant: `subtotal == price * quantity`.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct OrderItem {
    #[n(0)]
    pub name: String,
    #[n(1)]
    pub quantity: u32,
    #[n(2)]
    pub price: Money,
    #[n(3)]
    pub subtotal: Money,
}

/// A purchase order with its items. Plain immutable value record; the
/// engines produce updated copies rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Order {
    #[n(0)]
    pub id: OrderId,
    #[n(1)]
    pub order_number: String,
    #[n(2)]
    pub total: Money,
    #[n(3)]
    pub status: OrderStatus,
    #[n(4)]
    pub created_by: String,
    #[n(5)]
    pub approved_by: Option<String>,
    #[n(6)]
    pub created_at: TimeStamp<Utc>,
    #[n(7)]
    pub updated_at: TimeStamp<Utc>,
    #[n(8)]
    pub deleted_at: Option<TimeStamp<Utc>>,
    #[n(9)]
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn is_pending_approval(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn requires_approval(&self, threshold: Money) -> bool {
        self.total >= threshold
    }

    /// Approved orders are frozen; rejected orders remain editable.
    pub fn can_be_modified(&self) -> bool {
        self.status != OrderStatus::Approved
    }

    /// Sum the item subtotals into an order total.
    pub fn total_of(items: &[OrderItem]) -> Result<Money, ValidationError> {
        items.iter().try_fold(Money::ZERO, |acc, item| {
            acc.checked_add(item.subtotal)
                .ok_or(ValidationError::AmountOverflow)
        })
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}
