//! Response cache and in-flight request dedup (§5 concurrency model, §9
//! design note "concurrency primitives for dedup"). The session map in
//! the teacher's HTTP transport (`Mutex<HashMap<String, Arc<Session>>>`)
//! is the model for the bounded map here; in-flight dedup uses a one-shot
//! `tokio::sync::broadcast` per key rather than a raw promise map so every
//! waiter gets the same result without polling.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

pub const RESPONSE_CACHE_CAPACITY: usize = 1000;
pub const RESPONSE_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// When the cache is full, evict this many of the oldest entries at once
/// rather than evicting one-by-one on every insert.
const EVICTION_BATCH: usize = 100;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Bounded, TTL'd cache keyed by an opaque request hash. Not an LRU in the
/// strict sense: eviction is by insertion order once the cache is full,
/// matching §5's "evict oldest 100 when full".
pub struct ResponseCache<V: Clone> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    order: Mutex<Vec<String>>,
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self { entries: Mutex::new(HashMap::new()), order: Mutex::new(Vec::new()) }
    }
}

impl<V: Clone> ResponseCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.lock().unwrap();
        entries.get(key).and_then(|entry| {
            if entry.inserted_at.elapsed() < RESPONSE_CACHE_TTL {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    pub fn insert(&self, key: String, value: V) {
        let mut entries = self.entries.lock().unwrap();
        let mut order = self.order.lock().unwrap();

        if !entries.contains_key(&key) {
            order.push(key.clone());
        }
        entries.insert(key, Entry { value, inserted_at: Instant::now() });

        if entries.len() > RESPONSE_CACHE_CAPACITY {
            let evict_count = EVICTION_BATCH.min(order.len());
            for evicted_key in order.drain(..evict_count) {
                entries.remove(&evicted_key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Deduplicates concurrent pipeline runs sharing the same request key.
/// The first caller to register a key runs the pipeline and broadcasts its
/// result to every other caller that registered for the same key while it
/// was in flight.
pub struct InFlightDedup<V: Clone + Send + 'static> {
    pending: Mutex<HashMap<String, broadcast::Sender<V>>>,
}

pub enum DedupSlot<V: Clone + Send + 'static> {
    /// This caller owns the computation. Must call `complete` when done.
    Leader,
    /// Another caller already owns the computation; await its result here.
    Follower(broadcast::Receiver<V>),
}

impl<V: Clone + Send + 'static> Default for InFlightDedup<V> {
    fn default() -> Self {
        Self { pending: Mutex::new(HashMap::new()) }
    }
}

impl<V: Clone + Send + 'static> InFlightDedup<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in `key`. Returns `Leader` to exactly one caller
    /// per in-flight key; all subsequent callers for the same key get a
    /// `Follower` receiver until `complete` is called.
    pub fn register(&self, key: &str) -> DedupSlot<V> {
        let mut pending = self.pending.lock().unwrap();
        if let Some(sender) = pending.get(key) {
            DedupSlot::Follower(sender.subscribe())
        } else {
            let (sender, _receiver) = broadcast::channel(1);
            pending.insert(key.to_string(), sender);
            DedupSlot::Leader
        }
    }

    /// Called by the leader once the pipeline result is ready: broadcasts
    /// to all followers and clears the in-flight entry.
    pub fn complete(&self, key: &str, value: V) {
        let mut pending = self.pending.lock().unwrap();
        if let Some(sender) = pending.remove(key) {
            let _ = sender.send(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_cache_round_trips() {
        let cache = ResponseCache::new();
        cache.insert("key".to_string(), 42);
        assert_eq!(cache.get("key"), Some(42));
    }

    #[test]
    fn response_cache_evicts_oldest_batch_when_full() {
        let cache: ResponseCache<i32> = ResponseCache::new();
        for i in 0..(RESPONSE_CACHE_CAPACITY + 1) {
            cache.insert(format!("key-{i}"), i as i32);
        }
        assert!(cache.len() <= RESPONSE_CACHE_CAPACITY);
        assert!(cache.get("key-0").is_none());
    }

    #[tokio::test]
    async fn in_flight_dedup_gives_one_leader_and_followers_the_result() {
        let dedup: InFlightDedup<i32> = InFlightDedup::new();

        let leader_slot = dedup.register("k");
        assert!(matches!(leader_slot, DedupSlot::Leader));

        let follower_slot = dedup.register("k");
        let mut follower_rx = match follower_slot {
            DedupSlot::Follower(rx) => rx,
            DedupSlot::Leader => panic!("expected follower"),
        };

        dedup.complete("k", 7);
        assert_eq!(follower_rx.recv().await.unwrap(), 7);

        // Key is free again after completion.
        assert!(matches!(dedup.register("k"), DedupSlot::Leader));
    }
}
