//! Per-thread formatter cache
//!
//! Formatters carry mutable working buffers, so each thread lazily builds its
//! own instance per format identity and reuses it on later calls. Nothing in
//! here is shared across threads.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Maximum cache size before clearing (to prevent unbounded memory growth)
const FORMATTER_CACHE_MAX_SIZE: usize = 1024;

static NEXT_FORMAT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static FORMATTERS: RefCell<HashMap<u64, Rc<dyn Any>>> = RefCell::new(HashMap::new());
}

/// Allocate a process-unique identity for a new format configuration.
pub(crate) fn next_format_id() -> u64 {
    NEXT_FORMAT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Run `f` with this thread's formatter for `id`, building it on first use.
pub(crate) fn with_formatter<F, R>(id: u64, build: impl FnOnce() -> F, f: impl FnOnce(&F) -> R) -> R
where
    F: 'static,
{
    let cached = FORMATTERS.with(|cache| {
        cache
            .borrow()
            .get(&id)
            .and_then(|entry| Rc::clone(entry).downcast::<F>().ok())
    });

    let formatter = if let Some(formatter) = cached {
        formatter
    } else {
        debug!(format_id = id, "building formatter for current thread");
        let formatter = Rc::new(build());
        FORMATTERS.with(|cache| {
            let mut cache = cache.borrow_mut();
            if cache.len() >= FORMATTER_CACHE_MAX_SIZE {
                cache.clear();
            }
            let entry: Rc<dyn Any> = formatter.clone();
            cache.insert(id, entry);
        });
        formatter
    };

    f(&formatter)
}

/// Number of formatters cached on the current thread.
#[must_use]
pub fn formatter_cache_len() -> usize {
    FORMATTERS.with(|cache| cache.borrow().len())
}

/// Drop every formatter cached on the current thread.
pub fn clear_formatter_cache() {
    FORMATTERS.with(|cache| cache.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_formatter_built_once_per_thread() {
        clear_formatter_cache();
        let id = next_format_id();
        let builds = Cell::new(0);

        for _ in 0..3 {
            let len = with_formatter(
                id,
                || {
                    builds.set(builds.get() + 1);
                    String::from("fmt")
                },
                String::len,
            );
            assert_eq!(len, 3);
        }

        assert_eq!(builds.get(), 1);
        assert_eq!(formatter_cache_len(), 1);
    }

    #[test]
    fn test_other_thread_builds_its_own() {
        let id = next_format_id();
        with_formatter(id, || 1u32, |_| ());

        let built_elsewhere = std::thread::spawn(move || {
            let mut built = false;
            with_formatter(
                id,
                || {
                    built = true;
                    2u32
                },
                |value| assert_eq!(*value, 2),
            );
            built
        })
        .join()
        .unwrap();

        assert!(built_elsewhere);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(next_format_id(), next_format_id());
    }
}
