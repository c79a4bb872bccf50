use serde::{Deserialize, Serialize};

use crate::helpers::time::now_i64;

/// Cache name of the access token
pub const AUTH_CACHE_NAME: &str = "auth";
/// Cache name of the JS-API signing ticket
pub const JSAPI_TICKET_CACHE_NAME: &str = "jsapi_ticket";

/// Lifetime applied when the platform reports `expires_in = 0`
pub const TTL_FLOOR_SECONDS: u64 = 7200;

/// A perishable value (access token or ticket) and its lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub value: String,
    /// UNIX TIMESTAMP
    pub created_at: i64,
    pub ttl_seconds: u64,
}

impl Credential {
    /// Builds a credential stamped with the current time
    pub fn issued_now(value: String, ttl_seconds: u64) -> Self {
        Self { value, created_at: now_i64(), ttl_seconds }
    }

    pub fn expires_at(&self) -> i64 {
        self.created_at.saturating_add(i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX))
    }

    pub fn is_valid_at(&self, now: i64) -> bool {
        now < self.expires_at()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_i64())
    }
}

/// Zero means "unspecified", anything else is kept as reported
pub fn ttl_or_floor(expires_in: u64) -> u64 {
    if expires_in == 0 {
        TTL_FLOOR_SECONDS
    } else {
        expires_in
    }
}
