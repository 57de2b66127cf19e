//! Time-sortable identifiers.
//!
//! Every row id is a UUIDv7 rendered as lowercase hyphenated hex. The
//! string order of these ids is the numeric order of the underlying
//! 128-bit values, so sorting ids as strings sorts rows by creation.

use std::sync::{LazyLock, Mutex};
use uuid::Uuid;

static LAST_ID: LazyLock<Mutex<u128>> = LazyLock::new(|| Mutex::new(0));

/// Generate a new UUIDv7 id, strictly greater than every id this process
/// has generated before.
///
/// Two ids drawn in the same millisecond share their timestamp prefix and
/// would otherwise be ordered by their random tail.
#[must_use]
pub fn new_id() -> String {
    let candidate = Uuid::now_v7().as_u128();
    let mut last = LAST_ID.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let next = if candidate > *last { candidate } else { *last + 1 };
    *last = next;
    Uuid::from_u128(next).hyphenated().to_string()
}

/// Current time in Unix milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Render a millisecond timestamp as RFC 3339, falling back to the raw number.
#[must_use]
pub fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
