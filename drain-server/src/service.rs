use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use drain_config::Config;
use drain_metrics::{MetricSink, StatsdSink};
use drain_quotas::{FloodProtector, FloodStore, RedisFloodStore};
use drain_redis::AsyncRedisPool;
use drain_statsd::metric;

use crate::services::server::ServerError;
use crate::statsd::ServerGauges;
use crate::tenants::TenantRegistry;

/// Interval of reporting Redis pool statistics.
const POOL_STATS_INTERVAL: Duration = Duration::from_secs(10);

struct StateInner {
    config: Arc<Config>,
    tenants: TenantRegistry,
    protector: FloodProtector,
    sink: Arc<dyn MetricSink>,
}

/// Server state shared by all request handlers.
#[derive(Clone)]
pub struct ServiceState {
    inner: Arc<StateInner>,
}

impl ServiceState {
    /// Creates the state from its parts.
    pub fn new(config: Arc<Config>, protector: FloodProtector, sink: Arc<dyn MetricSink>) -> Self {
        let tenants = TenantRegistry::from_config(config.tenants());

        Self {
            inner: Arc::new(StateInner {
                config,
                tenants,
                protector,
                sink,
            }),
        }
    }

    /// Connects the backends named in the configuration and creates the state.
    ///
    /// Neither StatsD nor Redis are contacted here. Must be called within a tokio runtime.
    pub fn start(config: Arc<Config>) -> Result<Self, ServerError> {
        let client =
            drain_statsd::build_client("", config.statsd_addr(), config.statsd_queue_size())?;
        let sink = Arc::new(StatsdSink::new(client));
        drain_log::info!("sending metrics to statsd at {}", config.statsd_addr());

        let store = match config.redis() {
            Some(redis) => {
                let pool = AsyncRedisPool::new(redis)?;
                spawn_pool_stats(pool.clone());
                Some(Arc::new(RedisFloodStore::new(pool)) as Arc<dyn FloodStore>)
            }
            None => None,
        };

        let flood = config.flood_protection().clone();
        if flood.enabled && store.is_none() {
            drain_log::warn!("flood protection is enabled without redis, requests are not counted");
        }

        let protector = FloodProtector::new(flood, store);
        Ok(Self::new(config, protector, sink))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Returns the tenants allowed to send logs.
    pub fn tenants(&self) -> &TenantRegistry {
        &self.inner.tenants
    }

    /// Returns the flood protector.
    pub fn protector(&self) -> &FloodProtector {
        &self.inner.protector
    }

    /// Returns the sink of tenant metrics.
    pub fn sink(&self) -> &dyn MetricSink {
        self.inner.sink.as_ref()
    }
}

impl fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceState")
            .field("tenants", &self.inner.tenants.len())
            .field("protector", &self.inner.protector)
            .finish()
    }
}

fn spawn_pool_stats(pool: AsyncRedisPool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POOL_STATS_INTERVAL);
        loop {
            interval.tick().await;
            let stats = pool.stats();
            metric!(gauge(ServerGauges::RedisPoolConnections) = u64::from(stats.connections));
            metric!(
                gauge(ServerGauges::RedisPoolIdleConnections) = u64::from(stats.idle_connections)
            );
        }
    });
}
