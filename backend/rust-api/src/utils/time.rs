use chrono::{DateTime, Utc};

/// LMS timestamps are unix seconds
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

pub fn from_unix(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}
