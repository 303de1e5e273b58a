use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use scently_core::{CacheError, Fingerprint, Ranked, ResponseCache};
use tokio::sync::RwLock;
use tokio::time::Instant;

struct Entry {
    ranked: Vec<Ranked>,
    expires_at: Instant,
}

/// Process-local cache for single-instance deployments and tests. Expired
/// entries are dropped on read of their key and swept on every store.
#[derive(Default)]
pub struct InMemoryResponseCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().await.values().filter(|entry| entry.expires_at > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn load(&self, fingerprint: &Fingerprint) -> Result<Option<Vec<Ranked>>, CacheError> {
        let key = fingerprint.cache_key();
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.ranked.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(&key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(&key);
        }
        Ok(None)
    }

    async fn store(
        &self,
        fingerprint: &Fingerprint,
        ranked: &[Ranked],
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let now = Instant::now();
        let entry = Entry { ranked: ranked.to_vec(), expires_at: now + ttl };
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(fingerprint.cache_key(), entry);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Cache that never hits and never stores.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopResponseCache;

#[async_trait]
impl ResponseCache for NoopResponseCache {
    async fn load(&self, _fingerprint: &Fingerprint) -> Result<Option<Vec<Ranked>>, CacheError> {
        Ok(None)
    }

    async fn store(
        &self,
        _fingerprint: &Fingerprint,
        _ranked: &[Ranked],
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "disabled"
    }
}
