//! Process-wide cache of loaded synthesis engines, keyed by model id.
//!
//! Loading a neural model takes seconds and a lot of memory, so each model id
//! is loaded at most once. The map lock is only held long enough to fetch the
//! per-id slot; the load itself runs under that slot's `OnceCell`, so callers
//! racing on the same id wait for one loader while other ids proceed.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

type Slot<E> = Arc<OnceCell<Arc<E>>>;

pub struct EngineCache<E> {
    slots: Mutex<HashMap<String, Slot<E>>>,
}

impl<E> Default for EngineCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EngineCache<E> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The engine for `model_id`, if it has been loaded.
    pub fn get(&self, model_id: &str) -> Option<Arc<E>> {
        let slot = self.slots.lock().get(model_id).cloned()?;
        slot.get().cloned()
    }

    /// Return the engine for `model_id`, running `load` if no engine exists yet.
    ///
    /// Concurrent callers for the same id block until the first loader
    /// finishes and then share its result. If `load` fails the slot stays
    /// empty and the next caller tries again.
    pub fn get_or_try_load<F, Err>(&self, model_id: &str, load: F) -> Result<Arc<E>, Err>
    where
        F: FnOnce() -> Result<E, Err>,
    {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(model_id.to_string()).or_default())
        };

        slot.get_or_try_init(|| {
            log::info!("Loading engine for model '{model_id}'");
            load().map(Arc::new)
        })
        .cloned()
    }

    /// Number of loaded engines.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::EngineCache;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    struct FakeModel {
        id: String,
    }

    #[test]
    fn concurrent_requests_load_a_model_once() {
        let cache = Arc::new(EngineCache::<FakeModel>::new());
        let loads = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let loads = Arc::clone(&loads);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_try_load("kokoro", || {
                            loads.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(50));
                            Ok::<_, String>(FakeModel {
                                id: "kokoro".to_string(),
                            })
                        })
                        .expect("load succeeds")
                })
            })
            .collect();

        let engines: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect();

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(engines.iter().all(|e| Arc::ptr_eq(e, &engines[0])));
        assert_eq!(engines[0].id, "kokoro");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_models_get_distinct_engines() {
        let cache = EngineCache::<FakeModel>::new();
        let load = |id: &str| {
            let id = id.to_string();
            move || Ok::<_, String>(FakeModel { id })
        };

        let a = cache.get_or_try_load("a", load("a")).unwrap();
        let b = cache.get_or_try_load("b", load("b")).unwrap();
        let a_again = cache.get_or_try_load("a", load("never used")).unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &a_again));
        assert_eq!(a_again.id, "a");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_load_is_retried_on_next_request() {
        let cache = EngineCache::<FakeModel>::new();

        let first = cache.get_or_try_load("flaky", || Err::<FakeModel, _>("disk busy"));
        assert_eq!(first.err(), Some("disk busy"));
        assert!(cache.get("flaky").is_none());
        assert!(cache.is_empty());

        let second = cache
            .get_or_try_load("flaky", || {
                Ok::<_, &str>(FakeModel {
                    id: "flaky".to_string(),
                })
            })
            .expect("second load succeeds");
        assert_eq!(second.id, "flaky");
        assert!(cache.get("flaky").is_some());
    }
}
