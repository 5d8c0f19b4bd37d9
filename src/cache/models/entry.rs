use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 缓存条目
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: serde_json::Value,
    pub stored_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(key: &str, value: serde_json::Value, stored_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            key: key.to_string(),
            value,
            stored_at,
            ttl,
        }
    }

    /// 过期时刻，超出 chrono 范围时视为永不过期
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| self.stored_at.checked_add_signed(ttl))
    }

    /// now - stored_at < ttl 时有效
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }

    /// 空数组、空对象和 null 不用于预填
    pub fn is_empty(&self) -> bool {
        match &self.value {
            serde_json::Value::Null => true,
            serde_json::Value::Array(items) => items.is_empty(),
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}
