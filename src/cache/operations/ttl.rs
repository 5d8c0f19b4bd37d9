use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::models::CacheEntry;
use crate::utils::{Clock, SystemClock};

/// 进程内 TTL 缓存
///
/// 克隆得到的是同一份数据的句柄。读写都是同步的，任何存储错误都当作未命中处理，
/// 不会抛给调用方。除过期外没有淘汰策略，键集合很小且固定。
#[derive(Clone, Debug)]
pub struct TtlCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl TtlCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// 读取并反序列化缓存值，过期或无法解析时返回 None
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.get_entry(key)?;
        match serde_json::from_value(entry.value) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Cache entry {} has unexpected shape: {}", key, e);
                None
            }
        }
    }

    /// 读取原始条目，过期条目在这里被惰性删除
    pub fn get_entry(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        let entry = {
            let entries = match self.entries.read() {
                Ok(entries) => entries,
                Err(_) => {
                    tracing::warn!("Cache lock poisoned, treating {} as miss", key);
                    return None;
                }
            };
            entries.get(key)?.clone()
        };

        if entry.is_valid_at(now) {
            return Some(entry);
        }

        tracing::debug!("Cache entry {} expired", key);
        if let Ok(mut entries) = self.entries.write() {
            // 期间可能已被重新写入，只删除仍然过期的条目
            if entries.get(key).is_some_and(|e| !e.is_valid_at(now)) {
                entries.remove(key);
            }
        }
        None
    }

    /// 使用默认 TTL 写入
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// 写入缓存，后写覆盖先写
    pub fn set_with_ttl<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to serialize cache value for {}: {}", key, e);
                return;
            }
        };

        let entry = CacheEntry::new(key, value, self.clock.now(), ttl);
        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(key.to_string(), entry);
            }
            Err(_) => tracing::warn!("Cache lock poisoned, dropping write for {}", key),
        }
    }

    pub fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }

    /// 删除某个前缀下的全部条目
    pub fn remove_prefix(&self, prefix: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|key, _| !key.starts_with(prefix));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// 主动清理所有过期条目，返回清理数量
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        match self.entries.write() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|_, entry| entry.is_valid_at(now));
                before - entries.len()
            }
            Err(_) => 0,
        }
    }

    /// 当前保存的条目数（含尚未清理的过期条目）
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
