//! Pooled Redis client.
//!
//! The drain only talks to a single Redis node, which holds the flood protection counters. The
//! pool is created lazily: creating an [`AsyncRedisPool`] does not open a connection, so the
//! service starts even if Redis is unreachable.
#![warn(missing_docs)]

mod config;

pub use self::config::*;

use std::fmt;
use std::time::Duration;

use deadpool::managed::{BuildError, PoolError};
use deadpool_redis::redis::{Cmd, Pipeline, RedisFuture, Value};
use deadpool_redis::{Config as SingleConfig, ConfigError, Connection, Pool, Runtime};
use thiserror::Error;

pub use deadpool_redis::redis;

/// Time allowed to establish a new connection to Redis.
const CREATE_TIMEOUT: Duration = Duration::from_secs(2);

/// Time allowed to wait for a free connection from the pool.
const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// An error type that represents various failure modes when interacting with Redis.
#[derive(Debug, Error)]
pub enum RedisError {
    /// An error that occurs during communication with Redis.
    #[error("failed to communicate with redis: {0}")]
    Redis(#[source] redis::RedisError),

    /// An error that occurs when interacting with the Redis connection pool.
    #[error("failed to interact with the redis pool: {0}")]
    Pool(#[source] PoolError<redis::RedisError>),

    /// An error that occurs when creating a Redis connection pool.
    #[error("failed to create redis pool: {0}")]
    CreatePool(#[from] BuildError),

    /// An error that occurs when configuring Redis.
    #[error("failed to configure redis: {0}")]
    ConfigError(#[from] ConfigError),
}

impl From<redis::RedisError> for RedisError {
    fn from(error: redis::RedisError) -> Self {
        Self::Redis(error)
    }
}

/// Statistics about the Redis client's connection pool state.
#[derive(Debug)]
pub struct RedisClientStats {
    /// The number of connections currently being managed by the pool.
    pub connections: u32,
    /// The number of idle connections.
    pub idle_connections: u32,
    /// The maximum number of connections in the pool.
    pub max_connections: u32,
}

/// A connection pool to a single Redis instance.
#[derive(Clone)]
pub struct AsyncRedisPool {
    pool: Pool,
}

impl AsyncRedisPool {
    /// Creates a new connection pool from the given configuration.
    pub fn new(config: &RedisConfig) -> Result<Self, RedisError> {
        Self::single(config.server(), &config.options())
    }

    /// Creates a new connection pool for a single Redis instance.
    pub fn single(server: &str, opts: &RedisConfigOptions) -> Result<Self, RedisError> {
        let pool = SingleConfig::from_url(server)
            .builder()?
            .max_size(opts.max_connections as usize)
            .create_timeout(Some(CREATE_TIMEOUT))
            .wait_timeout(Some(WAIT_TIMEOUT))
            .runtime(Runtime::Tokio1)
            .build()?;

        Ok(Self { pool })
    }

    /// Acquires a connection from the pool.
    ///
    /// The connection is returned to the pool when dropped.
    pub async fn get_connection(&self) -> Result<AsyncRedisConnection, RedisError> {
        let connection = self.pool.get().await.map_err(RedisError::Pool)?;
        Ok(AsyncRedisConnection(connection))
    }

    /// Returns statistics about the current state of the connection pool.
    pub fn stats(&self) -> RedisClientStats {
        let status = self.pool.status();

        RedisClientStats {
            idle_connections: status.available as u32,
            connections: status.size as u32,
            max_connections: status.max_size as u32,
        }
    }
}

impl fmt::Debug for AsyncRedisPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncRedisPool")
            .field("status", &self.pool.status())
            .finish()
    }
}

/// A pooled connection to a single Redis instance.
///
/// Implements [`ConnectionLike`](redis::aio::ConnectionLike), so all of
/// [`AsyncCommands`](redis::AsyncCommands) are available on it.
pub struct AsyncRedisConnection(Connection);

impl fmt::Debug for AsyncRedisConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AsyncRedisConnection").finish()
    }
}

impl redis::aio::ConnectionLike for AsyncRedisConnection {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        self.0.req_packed_command(cmd)
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        self.0.req_packed_commands(cmd, offset, count)
    }

    fn get_db(&self) -> i64 {
        self.0.get_db()
    }
}
