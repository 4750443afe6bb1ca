//! Skin texture lookups. `TextureCache` memoizes the results of a `TextureResolver` for a fixed time
//! and makes sure that concurrent lookups of the same key share a single resolver call.

use std::{sync::Arc, time::Duration};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use masquerade_shared::{SyncMutex, debug};
use rustc_hash::FxHashMap;
use tokio::time::Instant;

use crate::data::TextureBlob;

mod error;
mod resolver;

pub use error::ResolveError;
pub use resolver::{MojangTextureResolver, TextureResolver};

pub type ResolveResult = Result<TextureBlob, ResolveError>;

type SharedLookup = Shared<BoxFuture<'static, ResolveResult>>;

struct CacheEntry {
    blob: TextureBlob,
    expires_at: Instant,
}

struct CacheInner {
    resolver: Arc<dyn TextureResolver>,
    ttl: Duration,
    timeout: Duration,
    // lock order: `in_flight` before `entries`
    in_flight: SyncMutex<FxHashMap<String, SharedLookup>>,
    entries: SyncMutex<FxHashMap<String, CacheEntry>>,
}

/// Cheap to clone, every clone shares the same entries.
#[derive(Clone)]
pub struct TextureCache {
    inner: Arc<CacheInner>,
}

impl TextureCache {
    pub fn new(resolver: Arc<dyn TextureResolver>, ttl: Duration, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                resolver,
                ttl,
                timeout,
                in_flight: SyncMutex::new(FxHashMap::default()),
                entries: SyncMutex::new(FxHashMap::default()),
            }),
        }
    }

    /// Return the texture for `key`, calling the resolver only if there is no fresh cached entry
    /// and no lookup of the same key already in progress. Failures are not cached.
    pub async fn resolve(&self, key: &str) -> ResolveResult {
        if let Some(blob) = self.get_cached(key) {
            return Ok(blob);
        }

        let lookup = {
            let mut in_flight = self.inner.in_flight.lock();

            // a lookup may have finished since we checked
            if let Some(blob) = self.get_cached(key) {
                return Ok(blob);
            }

            in_flight
                .entry(key.to_owned())
                .or_insert_with(|| Self::start_lookup(self.inner.clone(), key.to_owned()))
                .clone()
        };

        lookup.await
    }

    /// The cached texture for `key` if it has not expired. Expired entries are evicted here.
    pub fn get_cached(&self, key: &str) -> Option<TextureBlob> {
        let mut entries = self.inner.entries.lock();

        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.blob.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn invalidate(&self, key: &str) {
        self.inner.entries.lock().remove(key);
    }

    /// Amount of stored entries, including expired ones that were not evicted yet.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Amount of lookups currently waiting on the resolver.
    pub fn pending_lookups(&self) -> usize {
        self.inner.in_flight.lock().len()
    }

    fn start_lookup(inner: Arc<CacheInner>, key: String) -> SharedLookup {
        debug!("resolving texture for {key}");

        let call = inner.resolver.resolve(&key);

        // the lookup runs on its own task so it completes and cleans up even if every waiter goes away
        let handle = tokio::spawn(async move {
            let result = tokio::time::timeout(inner.timeout, call)
                .await
                .unwrap_or(Err(ResolveError::Timeout));

            let mut in_flight = inner.in_flight.lock();
            match &result {
                Ok(blob) => {
                    inner.entries.lock().insert(
                        key.clone(),
                        CacheEntry {
                            blob: blob.clone(),
                            expires_at: Instant::now() + inner.ttl,
                        },
                    );
                }
                Err(err) => debug!("texture lookup for {key} failed: {err}"),
            }

            in_flight.remove(&key);
            result
        });

        async move {
            handle
                .await
                .unwrap_or_else(|err| Err(ResolveError::Request(format!("lookup task failed: {err}"))))
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingResolver {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl TextureResolver for Arc<CountingResolver> {
        fn resolve(&self, key: &str) -> BoxFuture<'static, ResolveResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.delay;
            let key = key.to_owned();

            async move {
                tokio::time::sleep(delay).await;
                match key.as_str() {
                    "missing" => Err(ResolveError::NotFound),
                    _ => Ok(TextureBlob::signed(format!("value-{key}"), "sig")),
                }
            }
            .boxed()
        }
    }

    fn cache(delay: Duration, ttl: Duration) -> (TextureCache, Arc<CountingResolver>) {
        let resolver = Arc::new(CountingResolver {
            calls: AtomicUsize::new(0),
            delay,
        });

        let cache = TextureCache::new(Arc::new(resolver.clone()), ttl, Duration::from_secs(5));
        (cache, resolver)
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_lookups_share_one_call() {
        let (cache, resolver) = cache(Duration::from_millis(200), Duration::from_secs(60));

        let results = futures_util::future::join_all((0..8).map(|_| cache.resolve("Notch"))).await;

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap().value, "value-Notch");
        }

        assert_eq!(cache.resolve("Notch").await.unwrap().value, "value-Notch");
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.pending_lookups(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_cached() {
        let (cache, resolver) = cache(Duration::ZERO, Duration::from_secs(60));

        assert_eq!(cache.resolve("missing").await, Err(ResolveError::NotFound));
        assert_eq!(cache.resolve("missing").await, Err(ResolveError::NotFound));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_resolver_times_out() {
        let (cache, _) = cache(Duration::from_secs(30), Duration::from_secs(60));
        assert_eq!(cache.resolve("Notch").await, Err(ResolveError::Timeout));
        assert!(cache.get_cached("Notch").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_resolve_again() {
        let (cache, resolver) = cache(Duration::ZERO, Duration::from_secs(10));

        cache.resolve("jeb_").await.unwrap();
        tokio::time::advance(Duration::from_secs(9)).await;
        cache.resolve("jeb_").await.unwrap();
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get_cached("jeb_").is_none());
        assert_eq!(cache.len(), 0);

        cache.resolve("jeb_").await.unwrap();
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_lookup() {
        let (cache, resolver) = cache(Duration::ZERO, Duration::from_secs(60));

        cache.resolve("Dinnerbone").await.unwrap();
        cache.invalidate("Dinnerbone");
        cache.resolve("Dinnerbone").await.unwrap();
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }
}
