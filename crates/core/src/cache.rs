//! Keyed, immutable request cache.
//!
//! Each key is read at most once per cache lifetime. Concurrent callers for the same key share
//! the in-flight read through `moka`'s coalesced `get_with`, and every later caller receives a
//! clone of the settled value. Nothing is revalidated; [`RequestCache::invalidate`] is the only
//! way to force a fresh read.
//!
//! Reads run on detached tasks. A caller that stops waiting does not cancel the read: it still
//! settles and populates the cache for the next caller.

use moka::future::Cache as MokaCache;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinError;

#[derive(Clone)]
pub struct RequestCache<V> {
    inner: MokaCache<String, V>,
    pending: Arc<Mutex<HashSet<String>>>,
}

impl<V> RequestCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// A cache holding up to `capacity` settled keys. Zero is raised to one, since a moka cache
    /// with no capacity stores nothing and every caller would read again.
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: MokaCache::new(capacity.max(1)),
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// The settled value for `key`, if any.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key).await
    }

    /// Whether a read started through [`RequestCache::start`] is still running for `key`.
    pub async fn is_pending(&self, key: &str) -> bool {
        self.pending.lock().await.contains(key)
    }

    /// Return the settled value for `key`, running `read` to settle it if needed.
    ///
    /// `read` is only polled when no value is cached and no other read for `key` is in flight.
    pub async fn get_or_read<F>(&self, key: String, read: F) -> Result<V, JoinError>
    where
        F: Future<Output = V> + Send + 'static,
    {
        if let Some(value) = self.inner.get(&key).await {
            tracing::debug!("request cache hit: {}", key);
            return Ok(value);
        }

        let inner = self.inner.clone();
        tokio::spawn(async move { inner.get_with(key, read).await }).await
    }

    /// Start settling `key` in the background unless it is already cached or being read.
    ///
    /// Returns `true` when this call started a read.
    pub async fn start<F>(&self, key: String, read: F) -> bool
    where
        F: Future<Output = V> + Send + 'static,
    {
        if self.inner.contains_key(&key) {
            return false;
        }
        if !self.pending.lock().await.insert(key.clone()) {
            return false;
        }

        let inner = self.inner.clone();
        let pending = self.pending.clone();
        tokio::spawn(async move {
            inner.get_with(key.clone(), read).await;
            pending.lock().await.remove(&key);
        });
        true
    }

    /// Drop the settled value for `key` so the next caller reads again.
    ///
    /// A read already in flight for `key` is not interrupted and will still store its result.
    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }
}
