use std::time::Duration;

use async_trait::async_trait;
use drain_redis::RedisError;

/// An error returned by a [`FloodStore`].
#[derive(Debug, thiserror::Error)]
pub enum FloodError {
    /// Failed to talk to Redis.
    #[error("failed to talk to redis")]
    Redis(#[from] RedisError),

    /// The store is not reachable.
    #[error("flood store unavailable")]
    Unavailable,
}

/// Shared storage of flood protection counters.
///
/// Operations are independent round trips without transactions. Concurrent checks for the same key
/// may race, which makes the counting approximate.
#[async_trait]
pub trait FloodStore: Send + Sync {
    /// Reads the counter of `key`, returning `None` if there is none.
    async fn get(&self, key: &str) -> Result<Option<u64>, FloodError>;

    /// Increments the counter of `key`, creating it if needed, and returns the new count.
    async fn incr(&self, key: &str) -> Result<u64, FloodError>;

    /// Lets the counter of `key` expire after `window`.
    async fn expire(&self, key: &str, window: Duration) -> Result<(), FloodError>;

    /// Deletes the counter of `key`.
    async fn del(&self, key: &str) -> Result<(), FloodError>;
}

#[cfg(any(test, feature = "test"))]
mod memory {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    use parking_lot::Mutex;
    use tokio::time::Instant;

    use super::*;

    #[derive(Debug)]
    struct Counter {
        count: u64,
        expires_at: Option<Instant>,
    }

    impl Counter {
        fn is_live(&self, now: Instant) -> bool {
            self.expires_at.is_none_or(|at| at > now)
        }
    }

    /// A [`FloodStore`] in process memory.
    ///
    /// Expiry follows the tokio clock, so tests can advance it with `tokio::time::advance`.
    #[derive(Debug, Default)]
    pub struct MemoryFloodStore {
        counters: Mutex<HashMap<String, Counter>>,
        unavailable: AtomicBool,
    }

    impl MemoryFloodStore {
        /// Creates an empty store.
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every operation fail with [`FloodError::Unavailable`] while `unavailable` is set.
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::Relaxed);
        }

        /// Returns the live count of `key` without going through the trait.
        pub fn count(&self, key: &str) -> Option<u64> {
            let now = Instant::now();
            self.counters
                .lock()
                .get(key)
                .filter(|counter| counter.is_live(now))
                .map(|counter| counter.count)
        }

        fn check_available(&self) -> Result<(), FloodError> {
            match self.unavailable.load(Ordering::Relaxed) {
                true => Err(FloodError::Unavailable),
                false => Ok(()),
            }
        }
    }

    #[async_trait]
    impl FloodStore for MemoryFloodStore {
        async fn get(&self, key: &str) -> Result<Option<u64>, FloodError> {
            self.check_available()?;
            Ok(self.count(key))
        }

        async fn incr(&self, key: &str) -> Result<u64, FloodError> {
            self.check_available()?;

            let now = Instant::now();
            let mut counters = self.counters.lock();
            let counter = counters.entry(key.to_owned()).or_insert(Counter {
                count: 0,
                expires_at: None,
            });

            if !counter.is_live(now) {
                counter.count = 0;
                counter.expires_at = None;
            }

            counter.count += 1;
            Ok(counter.count)
        }

        async fn expire(&self, key: &str, window: Duration) -> Result<(), FloodError> {
            self.check_available()?;

            if let Some(counter) = self.counters.lock().get_mut(key) {
                counter.expires_at = Some(Instant::now() + window);
            }
            Ok(())
        }

        async fn del(&self, key: &str) -> Result<(), FloodError> {
            self.check_available()?;
            self.counters.lock().remove(key);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test"))]
pub use self::memory::MemoryFloodStore;
