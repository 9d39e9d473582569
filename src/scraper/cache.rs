use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use worker::kv::KvStore;
use worker::Env;

use super::types::MediaRecord;
use crate::utils::time::now_millis;

/// KV binding holding cached records.
pub const KV_BINDING: &str = "CACHE";

pub fn cache_key(post_id: &str) -> String {
    format!("post:{post_id}")
}

/// TTL-expiring record store keyed by post id.
#[async_trait(?Send)]
pub trait MediaCache {
    async fn get(&self, key: &str) -> Option<MediaRecord>;
    async fn set(&self, key: &str, record: &MediaRecord, ttl: Duration);
}

pub trait Clock {
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        now_millis()
    }
}

struct Entry {
    record: MediaRecord,
    expires_at: u64,
}

/// In-process cache. Expired entries are dropped when read; nothing sweeps in the background.
pub struct MemoryCache<C: Clock = SystemClock> {
    entries: Mutex<HashMap<String, Entry>>,
    clock: C,
}

impl MemoryCache<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryCache<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryCache<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait(?Send)]
impl<C: Clock> MediaCache for MemoryCache<C> {
    async fn get(&self, key: &str) -> Option<MediaRecord> {
        let now = self.clock.now_millis();
        let mut entries = self.entries.lock().ok()?;

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => {
                log::debug!("[cache] memory HIT for {}", key);
                Some(entry.record.clone())
            }
            Some(_) => {
                log::debug!("[cache] memory entry expired for {}", key);
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn set(&self, key: &str, record: &MediaRecord, ttl: Duration) {
        let expires_at = self.clock.now_millis() + ttl.as_millis() as u64;
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.to_string(),
                Entry {
                    record: record.clone(),
                    expires_at,
                },
            );
        }
    }
}

/// Workers KV-backed cache. Failures are logged and read as misses.
pub struct KvCache {
    kv: KvStore,
}

impl KvCache {
    /// Returns `None` when the worker has no `CACHE` binding.
    pub fn from_env(env: &Env) -> Option<Self> {
        env.kv(KV_BINDING).ok().map(|kv| Self { kv })
    }
}

#[async_trait(?Send)]
impl MediaCache for KvCache {
    async fn get(&self, key: &str) -> Option<MediaRecord> {
        let json = match self.kv.get(key).text().await {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("[cache] kv read error for {}: {:?}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&json) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("[cache] deserialize error for {}: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, record: &MediaRecord, ttl: Duration) {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("[cache] serialize error for {}: {}", key, e);
                return;
            }
        };

        // KV rejects TTLs under 60 seconds.
        let ttl_secs = ttl.as_secs().max(60);
        let put = match self.kv.put(key, json) {
            Ok(put) => put,
            Err(e) => {
                log::warn!("[cache] kv put error for {}: {:?}", key, e);
                return;
            }
        };
        if let Err(e) = put.expiration_ttl(ttl_secs).execute().await {
            log::warn!("[cache] kv write error for {}: {:?}", key, e);
        }
    }
}
