use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Millisecond timestamp used to keep blob keys unique per user.
pub fn key_stamp(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}
