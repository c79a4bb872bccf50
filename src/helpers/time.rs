use chrono::{Local, Utc};
use tokio::time::Instant;

/// Timestamp layout of the legacy RPC dialect
pub const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

pub fn get_instant() -> Instant {
    Instant::now()
}

/// Local wall-clock time as `YYYY-MM-DD HH:MM:SS`
pub fn legacy_timestamp() -> String {
    Local::now().format(LEGACY_TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_timestamp_layout() {
        let ts = legacy_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, LEGACY_TIMESTAMP_FORMAT).is_ok(), "{}", ts);
        assert_eq!(ts.len(), 19);
    }
}
