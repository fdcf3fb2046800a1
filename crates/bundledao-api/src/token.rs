//! Auth token caching with coalesced refresh.
//!
//! [`TokenCache`] keeps one token and its fetch time. Reads take a short
//! synchronous lock on that state and never wait on the network. Fetches
//! are serialized by a separate async lock, so callers that arrive while a
//! fetch is in flight wait for it and then read its result instead of
//! starting their own. Once two thirds of the token lifetime have passed a
//! background refresh is started; callers keep getting the current token
//! until the new one is swapped in.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::Result;

/// Default token lifetime.
pub const DEFAULT_TOKEN_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// Something that can issue a fresh auth token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Fetch a new token.
    async fn fetch(&self) -> Result<String>;
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    fetched_at: Instant,
}

struct Inner {
    source: Arc<dyn TokenSource>,
    max_age: Duration,
    state: Mutex<Option<CachedToken>>,
    fetch_lock: tokio::sync::Mutex<()>,
    prefetching: AtomicBool,
}

/// A time-boxed token cache. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct TokenCache {
    inner: Arc<Inner>,
}

impl TokenCache {
    /// Create a cache over `source` with the default lifetime.
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self::with_max_age(source, DEFAULT_TOKEN_MAX_AGE)
    }

    /// Create a cache with an explicit token lifetime.
    pub fn with_max_age(source: Arc<dyn TokenSource>, max_age: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                max_age,
                state: Mutex::new(None),
                fetch_lock: tokio::sync::Mutex::new(()),
                prefetching: AtomicBool::new(false),
            }),
        }
    }

    /// The configured token lifetime.
    pub fn max_age(&self) -> Duration {
        self.inner.max_age
    }

    /// Return a valid token, fetching one if the cache is empty or expired.
    pub async fn get(&self) -> Result<String> {
        if let Some(cached) = self.current() {
            if cached.fetched_at.elapsed() >= self.prefetch_after() {
                self.spawn_prefetch(cached.value.clone());
            }
            return Ok(cached.value);
        }

        let _fetching = self.inner.fetch_lock.lock().await;
        // Another caller may have fetched while we waited.
        if let Some(cached) = self.current() {
            return Ok(cached.value);
        }
        self.fetch_and_store().await
    }

    /// Replace `stale` with a fresh token.
    ///
    /// If another caller already replaced it, the newer token is returned
    /// without fetching again.
    pub async fn refresh(&self, stale: &str) -> Result<String> {
        let _fetching = self.inner.fetch_lock.lock().await;
        if let Some(cached) = self.current() {
            if cached.value != stale {
                return Ok(cached.value);
            }
        }
        self.fetch_and_store().await
    }

    /// Drop the cached token.
    pub async fn invalidate(&self) {
        *self.state() = None;
    }

    /// The cached token if it has not expired.
    fn current(&self) -> Option<CachedToken> {
        self.state()
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.inner.max_age)
            .cloned()
    }

    /// Fetch without holding the state lock. Callers hold `fetch_lock`.
    async fn fetch_and_store(&self) -> Result<String> {
        tracing::debug!("fetching auth token");
        let value = self.inner.source.fetch().await.map_err(|e| {
            tracing::warn!(error = %e, "auth token fetch failed");
            e
        })?;
        *self.state() = Some(CachedToken {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    fn state(&self) -> MutexGuard<'_, Option<CachedToken>> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn prefetch_after(&self) -> Duration {
        self.inner.max_age * 2 / 3
    }

    fn spawn_prefetch(&self, stale: String) {
        if self.inner.prefetching.swap(true, Ordering::AcqRel) {
            return;
        }
        let cache = self.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.refresh(&stale).await {
                tracing::warn!(error = %e, "background token refresh failed");
            }
            cache.inner.prefetching.store(false, Ordering::Release);
        });
    }
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("max_age", &self.inner.max_age)
            .finish_non_exhaustive()
    }
}
