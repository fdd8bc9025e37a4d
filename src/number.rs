//! Human-readable order number generation
use chrono::Utc;
use uuid7::uuid7;

/// Produces order numbers of the form `ORD-{YYYYMM}-{8 hex chars}`,
/// e.g. `ORD-202608-1A2B3C4D`.
///
/// The random suffix alone does not guarantee uniqueness; the lifecycle
/// engine checks each candidate against the store before use.
#[derive(Debug, Default)]
pub struct OrderNumberGenerator;

impl OrderNumberGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self) -> String {
        let period = Utc::now().format("%Y%m");
        // uuid7 trailing bytes carry the random payload
        let uuid = uuid7();
        let suffix = hex::encode_upper(&uuid.as_bytes()[12..16]);

        format!("ORD-{period}-{suffix}")
    }
}
