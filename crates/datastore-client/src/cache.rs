//! Keyed cache of shared service connections.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Map from connection key to a shared handle.
///
/// [`get_or_create`](Self::get_or_create) runs the factory under the lock,
/// so concurrent callers asking for the same key construct it at most once
/// and all receive the same `Arc`.
pub struct ConnectionCache<T: ?Sized> {
    entries: Mutex<HashMap<String, Arc<T>>>,
}

impl<T: ?Sized> Default for ConnectionCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for ConnectionCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("ConnectionCache")
            .field("keys", &entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: ?Sized> ConnectionCache<T> {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached handle for `key`, creating it with `factory` on first use.
    ///
    /// A failing factory leaves the cache unchanged.
    pub fn get_or_create<E>(
        &self,
        key: &str,
        factory: impl FnOnce() -> Result<Arc<T>, E>,
    ) -> Result<Arc<T>, E> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(key) {
            return Ok(Arc::clone(existing));
        }
        let created = factory()?;
        tracing::debug!(key, "Cached new connection");
        entries.insert(key.to_string(), Arc::clone(&created));
        Ok(created)
    }

    /// Number of cached connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every cached handle, returning how many there were.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[test]
    fn test_same_key_returns_same_handle() {
        let cache: ConnectionCache<String> = ConnectionCache::new();
        let a = cache
            .get_or_create("localhost:50051", || Ok::<_, Infallible>(Arc::new("a".into())))
            .unwrap();
        let b = cache
            .get_or_create("localhost:50051", || Ok::<_, Infallible>(Arc::new("b".into())))
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*b, "a");

        let c = cache
            .get_or_create("remote:50051", || Ok::<_, Infallible>(Arc::new("c".into())))
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_callers_construct_once() {
        let cache = Arc::new(ConnectionCache::<usize>::new());
        let constructed = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let constructed = Arc::clone(&constructed);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_create("localhost:50051", || {
                            let n = constructed.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, Infallible>(Arc::new(n))
                        })
                        .unwrap()
                })
            })
            .collect();

        let results: Vec<Arc<usize>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }

    #[test]
    fn test_failed_factory_is_not_cached() {
        let cache: ConnectionCache<u8> = ConnectionCache::new();
        let err = cache.get_or_create("bad", || Err("boom"));
        assert_eq!(err.unwrap_err(), "boom");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_releases_handles() {
        let cache: ConnectionCache<u8> = ConnectionCache::new();
        let handle = cache
            .get_or_create("k", || Ok::<_, Infallible>(Arc::new(1)))
            .unwrap();
        assert_eq!(Arc::strong_count(&handle), 2);
        assert_eq!(cache.clear(), 1);
        assert_eq!(Arc::strong_count(&handle), 1);
        assert!(cache.is_empty());
    }
}
