use std::time::Duration;

use async_trait::async_trait;
use drain_redis::redis::cmd;
use drain_redis::{AsyncRedisPool, RedisError};

use crate::{FloodError, FloodStore};

/// A [`FloodStore`] keeping counters in Redis.
///
/// Counters are plain integer keys driven by `GET`, `INCR`, `EXPIRE` and `DEL`, so they can be
/// inspected with `redis-cli`.
#[derive(Clone, Debug)]
pub struct RedisFloodStore {
    pool: AsyncRedisPool,
}

impl RedisFloodStore {
    /// Creates a store on top of a connection pool.
    pub fn new(pool: AsyncRedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FloodStore for RedisFloodStore {
    async fn get(&self, key: &str) -> Result<Option<u64>, FloodError> {
        let mut connection = self.pool.get_connection().await?;
        let count = cmd("GET")
            .arg(key)
            .query_async(&mut connection)
            .await
            .map_err(RedisError::from)?;
        Ok(count)
    }

    async fn incr(&self, key: &str) -> Result<u64, FloodError> {
        let mut connection = self.pool.get_connection().await?;
        let count = cmd("INCR")
            .arg(key)
            .query_async(&mut connection)
            .await
            .map_err(RedisError::from)?;
        Ok(count)
    }

    async fn expire(&self, key: &str, window: Duration) -> Result<(), FloodError> {
        let mut connection = self.pool.get_connection().await?;
        cmd("EXPIRE")
            .arg(key)
            .arg(window.as_secs())
            .query_async::<()>(&mut connection)
            .await
            .map_err(RedisError::from)?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), FloodError> {
        let mut connection = self.pool.get_connection().await?;
        cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut connection)
            .await
            .map_err(RedisError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use drain_redis::RedisConfig;

    use super::*;

    #[tokio::test]
    async fn test_unreachable_redis_errors() {
        // Nothing listens on port 1, so every operation fails once a connection is needed.
        let config = RedisConfig::Single("redis://127.0.0.1:1".to_owned());
        let store = RedisFloodStore::new(AsyncRedisPool::new(&config).unwrap());

        assert!(matches!(store.get("app").await, Err(FloodError::Redis(_))));
    }
}
