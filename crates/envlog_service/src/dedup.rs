use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

/// Default number of recently seen message ids remembered per process.
pub const DEFAULT_DEDUP_CAPACITY: usize = 10_000;

/// Explicit duplicate-delivery policy: the transport may redeliver a
/// message; this records recently seen ids and reports replays. Keyed by
/// `message_id`, bounded by an LRU window.
pub struct MessageDeduplicator {
    seen: Mutex<LruCache<String, ()>>,
}

impl MessageDeduplicator {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity.max(1)).expect("capacity is non-zero"),
            )),
        }
    }

    /// Record the id and report whether it was already seen. Messages
    /// without an id are never treated as duplicates.
    pub fn check_and_record(&self, message_id: &str) -> bool {
        if message_id.is_empty() {
            return false;
        }

        self.seen
            .lock()
            .expect("poisoned mutex")
            .put(message_id.to_string(), ())
            .is_some()
    }
}
