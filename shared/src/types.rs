//! Common types and helpers used across the platform

use chrono::NaiveDate;
use uuid::Uuid;

/// Build a human-readable transaction reference: `PREFIX-YYYYMMDD-XXXXXX`.
///
/// The suffix is derived from a fresh UUID; uniqueness is ultimately enforced
/// by the database index on the reference column.
pub fn reference_for(prefix: &str, date: NaiveDate) -> String {
    let uuid = Uuid::new_v4();
    let hex = uuid.simple().to_string();
    format!(
        "{}-{}-{}",
        prefix,
        date.format("%Y%m%d"),
        hex[..6].to_uppercase()
    )
}

/// Reference prefix for return events
pub const RETURN_REFERENCE_PREFIX: &str = "RET";
