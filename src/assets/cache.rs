//! Coalescing Async Cache
//!
//! [`AsyncCache`] memoizes the result of an asynchronous load under a stable
//! `u64` key (a content fingerprint, see
//! [`ResolvedSource::fingerprint`](crate::environment::ResolvedSource::fingerprint)).
//!
//! - The first request for a key starts the load; concurrent requests for the
//!   same key await the same in-flight future instead of starting new work.
//! - Results, successful or failed, stay cached until [`AsyncCache::evict`]
//!   is called. Loads are never retried implicitly.
//! - [`AsyncCache::poll`] is the non-blocking entry point: it starts the load
//!   in the background on first use and reports [`Readiness`] on every call.

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::errors::{Error, Result};

type SharedLoad<V> = Shared<BoxFuture<'static, std::result::Result<Arc<V>, Arc<Error>>>>;

/// Load state of a cache entry.
#[derive(Debug)]
pub enum Readiness<V> {
    /// The load is still in flight.
    Pending,
    /// The value is available.
    Ready(Arc<V>),
    /// The load failed; the error is shared by every observer.
    Failed(Arc<Error>),
}

impl<V> Readiness<V> {
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Converts a settled state into a `Result`, `None` while pending.
    #[must_use]
    pub fn into_result(self) -> Option<Result<Arc<V>>> {
        match self {
            Self::Pending => None,
            Self::Ready(v) => Some(Ok(v)),
            Self::Failed(e) => Some(Err(Error::Shared(e))),
        }
    }
}

impl<V> Clone for Readiness<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Pending => Self::Pending,
            Self::Ready(v) => Self::Ready(Arc::clone(v)),
            Self::Failed(e) => Self::Failed(Arc::clone(e)),
        }
    }
}

pub struct AsyncCache<V> {
    label: &'static str,
    entries: Mutex<FxHashMap<u64, SharedLoad<V>>>,
}

impl<V: Send + Sync + 'static> AsyncCache<V> {
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    /// Returns the cached future for `key`, creating it with `load` if absent.
    ///
    /// A new entry is driven on the asset runtime right away, so it settles
    /// even when every awaiter goes away before completion.
    fn entry<F, Fut>(&self, key: u64, load: F) -> SharedLoad<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let mut entries = self.entries.lock();
        entries
            .entry(key)
            .or_insert_with(|| {
                log::debug!("{}: starting load for key {key:016x}", self.label);
                let shared = load()
                    .map(|r| r.map(Arc::new).map_err(Arc::new))
                    .boxed()
                    .shared();
                drop(super::get_asset_runtime().spawn(shared.clone()));
                shared
            })
            .clone()
    }

    /// Awaits the value for `key`, starting `load` only if no entry exists.
    pub fn get_or_load<F, Fut>(
        &self,
        key: u64,
        load: F,
    ) -> impl Future<Output = Result<Arc<V>>> + Send + 'static
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let shared = self.entry(key, load);
        async move { shared.await.map_err(Error::Shared) }
    }

    /// Non-blocking variant of [`get_or_load`](Self::get_or_load).
    pub fn poll<F, Fut>(&self, key: u64, load: F) -> Readiness<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        Self::readiness(&self.entry(key, load))
    }

    /// Reports the state of `key` without starting anything.
    #[must_use]
    pub fn peek(&self, key: u64) -> Option<Readiness<V>> {
        self.entries.lock().get(&key).map(Self::readiness)
    }

    fn readiness(shared: &SharedLoad<V>) -> Readiness<V> {
        match shared.peek() {
            None => Readiness::Pending,
            Some(Ok(v)) => Readiness::Ready(Arc::clone(v)),
            Some(Err(e)) => Readiness::Failed(Arc::clone(e)),
        }
    }

    /// Removes `key` only if its settled value satisfies `pred`.
    ///
    /// Pending and failed entries are kept.
    pub fn evict_if(&self, key: u64, pred: impl FnOnce(&Arc<V>) -> bool) -> bool {
        let mut entries = self.entries.lock();
        let matches = entries
            .get(&key)
            .and_then(|shared| shared.peek().cloned())
            .is_some_and(|r| r.is_ok_and(|v| pred(&v)));
        if matches {
            entries.remove(&key);
            log::debug!("{}: evicted key {key:016x}", self.label);
        }
        matches
    }

    /// Removes `key`. Waiters already holding the in-flight future still
    /// receive its result. Returns `true` if an entry was present.
    pub fn evict(&self, key: u64) -> bool {
        let removed = self.entries.lock().remove(&key).is_some();
        if removed {
            log::debug!("{}: evicted key {key:016x}", self.label);
        }
        removed
    }

    #[must_use]
    pub fn contains(&self, key: u64) -> bool {
        self.entries.lock().contains_key(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn failed_entries_are_not_retried() {
        let cache = AsyncCache::<u32>::new("test");
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            let result = pollster::block_on(cache.get_or_load(7, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(Error::ConvolutionError("boom".into()))
            }));
            assert!(matches!(result.unwrap_err().root(), Error::ConvolutionError(_)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn evict_if_only_removes_matching_values() {
        let cache = AsyncCache::<u32>::new("test");
        let first = pollster::block_on(cache.get_or_load(3, || async { Ok::<u32, Error>(1) })).unwrap();
        let stale = Arc::new(1);

        assert!(!cache.evict_if(3, |v| Arc::ptr_eq(v, &stale)));
        assert!(cache.contains(3));
        assert!(cache.evict_if(3, |v| Arc::ptr_eq(v, &first)));
        assert!(!cache.contains(3));
        assert!(!cache.evict_if(3, |_| true));
    }

    #[test]
    fn evict_allows_reload() {
        let cache = AsyncCache::<u32>::new("test");
        let first = pollster::block_on(cache.get_or_load(1, || async { Ok::<u32, Error>(1) })).unwrap();
        assert!(cache.evict(1));
        assert!(!cache.evict(1));
        let second = pollster::block_on(cache.get_or_load(1, || async { Ok::<u32, Error>(2) })).unwrap();
        assert_eq!((*first, *second), (1, 2));
    }
}
