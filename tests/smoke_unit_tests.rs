//! Smoke Screen Unit tests for order approval system components
//!
//! These test are unit tests that span the codebase, testing behavior in
//! isolation from integration scenarios. These are intended as smoke-screen
//! and generally test the happy-path.
//!
#![allow(unused_imports)]

use chrono::{Datelike, Timelike, Utc};
use order_approval::{
    error::{OrderError, ValidationError},
    history::HistoryRecord,
    number::OrderNumberGenerator,
    order::{Money, NewItem, Order, OrderId, OrderItem, OrderStatus, TimeStamp},
    utils::new_uuid_to_bech32,
};

// UTILS MODULE TESTS
#[cfg(test)]
mod utils_tests {
    use super::*;

    /// Test that new_uuid_to_bech32 generates valid bech32-encoded strings
    /// with the correct human-readable prefix
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let result = new_uuid_to_bech32("ord");
        assert!(result.is_ok());

        let encoded = result.unwrap();
        assert!(encoded.starts_with("ord1"));
        assert!(encoded.len() > 10); // UUID should produce substantial output
    }

    /// Test that the function handles empty strings appropriately
    #[test]
    fn handles_empty_hrp() {
        // Empty string should fail
        let result = new_uuid_to_bech32("");
        assert!(result.is_err());
    }

    /// Test that multiple calls generate unique identifiers
    #[test]
    fn generates_unique_ids() {
        let id1 = new_uuid_to_bech32("ord").unwrap();
        let id2 = new_uuid_to_bech32("ord").unwrap();
        let id3 = new_uuid_to_bech32("ord").unwrap();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }
}

// ORDER MODULE TESTS
#[cfg(test)]
mod order_tests {
    use super::*;

    /// Test that TimeStamp::new() creates a timestamp close to current time
    #[test]
    fn timestamp_new_creates_current_time() {
        let ts = TimeStamp::new();
        let now = Utc::now();

        let diff = (now - ts.to_datetime_utc()).num_seconds().abs();
        assert!(diff < 1); // Should be within 1 second
    }

    /// Test that TimeStamp can be created with specific date/time values
    #[test]
    fn timestamp_new_with_creates_specific_time() {
        let ts = TimeStamp::new_with(2024, 6, 15, 10, 30, 0);
        let dt = ts.to_datetime_utc();

        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 6);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn money_arithmetic_is_exact() {
        let price = Money::from_cents(1999); // 19.99
        let subtotal = price.checked_mul(3).unwrap();
        assert_eq!(subtotal, Money::from_cents(5997));
        assert_eq!(subtotal.to_string(), "59.97");

        let total = subtotal.checked_add(Money::from_cents(3)).unwrap();
        assert_eq!(total.to_string(), "60.00");
    }

    #[test]
    fn money_overflow_is_detected() {
        assert!(Money::from_cents(u64::MAX).checked_mul(2).is_none());
        assert!(
            Money::from_cents(u64::MAX)
                .checked_add(Money::MIN_PRICE)
                .is_none()
        );
    }

    #[test]
    fn pending_is_the_only_non_terminal_status() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Approved.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }

    #[test]
    fn status_display_names_are_lowercase() {
        assert_eq!(OrderStatus::Pending.to_string(), "pending");
        assert_eq!(OrderStatus::Approved.to_string(), "approved");
        assert_eq!(OrderStatus::Rejected.to_string(), "rejected");
    }

    #[test]
    fn valid_item_passes_validation() {
        let item = NewItem::new("Desk lamp", 4, Money::from_cents(1250))
            .validate()
            .unwrap();

        assert_eq!(item.quantity, 4);
        assert_eq!(item.subtotal, Money::from_cents(5000));
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = NewItem::new("", 1, Money::from_cents(100))
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyItemName);
    }

    #[test]
    fn oversized_name_is_rejected() {
        let err = NewItem::new("x".repeat(256), 1, Money::from_cents(100))
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::NameTooLong);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = NewItem::new("Desk lamp", 0, Money::from_cents(100))
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::ZeroQuantity);
    }

    #[test]
    fn price_below_one_cent_is_rejected() {
        let err = NewItem::new("Desk lamp", 1, Money::ZERO)
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::PriceBelowMinimum);
    }

    #[test]
    fn total_of_sums_subtotals() {
        let items = vec![
            NewItem::new("Product 1", 2, Money::from_major(100))
                .validate()
                .unwrap(),
            NewItem::new("Product 2", 1, Money::from_major(50))
                .validate()
                .unwrap(),
        ];

        assert_eq!(Order::total_of(&items).unwrap(), Money::from_cents(25_000));
    }
}

// NUMBER MODULE TESTS
#[cfg(test)]
mod number_tests {
    use super::*;

    #[test]
    fn number_carries_current_period() {
        let number = OrderNumberGenerator::new().generate();
        let period = Utc::now().format("%Y%m").to_string();

        assert!(number.starts_with(&format!("ORD-{period}-")));
    }

    #[test]
    fn suffix_is_eight_hex_chars() {
        let number = OrderNumberGenerator::new().generate();
        let suffix = number.rsplit('-').next().unwrap();

        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

// ERROR MODULE TESTS
#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn only_transient_conflicts_are_retryable() {
        assert!(OrderError::TransientConflict("lock wait timeout".into()).is_transient());
        assert!(!OrderError::Validation(ValidationError::NoItems).is_transient());
        assert!(
            !OrderError::StateConflict {
                status: OrderStatus::Approved
            }
            .is_transient()
        );
        assert!(!OrderError::Internal(anyhow::anyhow!("boom")).is_transient());
    }

    #[test]
    fn state_conflict_names_the_blocking_status() {
        let err = OrderError::StateConflict {
            status: OrderStatus::Rejected,
        };
        assert_eq!(
            err.to_string(),
            "operation not allowed while order is rejected"
        );
    }
}

// HISTORY MODULE TESTS
#[cfg(test)]
mod history_tests {
    use super::*;

    #[test]
    fn creation_record_has_no_previous_status() {
        let record = HistoryRecord::new(
            OrderId::new("ord_x".into()),
            None,
            OrderStatus::Pending,
            "user_a".into(),
            "Order created",
        );

        assert!(record.status.is_none());
        assert_eq!(record.new_status, OrderStatus::Pending);
        assert_eq!(record.note, "Order created");
    }
}
