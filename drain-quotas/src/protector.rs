use std::fmt;
use std::sync::Arc;

use drain_statsd::metric;

use crate::statsd::QuotaCounters;
use crate::{FloodError, FloodGranularity, FloodProtectionConfig, FloodStore};

/// The outcome of a flood protection check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Admission {
    /// No counting took place, either because protection is off or the store failed.
    Unchecked,
    /// The counter was below the limit and has been incremented to `count`.
    Counted {
        /// The counter value after incrementing.
        count: u64,
    },
    /// The counter had reached the limit and has been reset.
    LimitReached {
        /// The counter value that was found.
        count: u64,
    },
}

impl Admission {
    /// Returns the name of the decision used in logs and metric tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchecked => "unchecked",
            Self::Counted { .. } => "counted",
            Self::LimitReached { .. } => "limit_reached",
        }
    }
}

impl fmt::Display for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts requests of tenants in fixed windows.
///
/// A check reads the counter of its key. Below the limit, the counter is incremented and its expiry
/// is re-armed to the configured window. At or above the limit, the counter is deleted and the
/// check reports [`Admission::LimitReached`]. Nothing is ever rejected here: whether a decision
/// suppresses metrics is up to the [`FloodPolicy`](crate::FloodPolicy).
///
/// All store failures fail open.
#[derive(Clone)]
pub struct FloodProtector {
    config: FloodProtectionConfig,
    store: Option<Arc<dyn FloodStore>>,
}

impl FloodProtector {
    /// Creates a protector. Without a store, every check is [`Admission::Unchecked`].
    pub fn new(config: FloodProtectionConfig, store: Option<Arc<dyn FloodStore>>) -> Self {
        Self { config, store }
    }

    /// Returns the configuration of this protector.
    pub fn config(&self) -> &FloodProtectionConfig {
        &self.config
    }

    /// Returns `true` if checks actually count.
    pub fn is_active(&self) -> bool {
        self.config.enabled && self.store.is_some()
    }

    /// Returns `true` if checks are made per request rather than per line.
    pub fn checks_requests(&self) -> bool {
        self.config.granularity == FloodGranularity::Tenant
    }

    /// Builds the counter key for a tenant and, at per-variant granularity, a line variant.
    pub fn key(&self, tenant: &str, variant: &str) -> String {
        match self.config.granularity {
            FloodGranularity::Tenant => tenant.to_owned(),
            FloodGranularity::TenantVariant => format!("{tenant}.{variant}"),
        }
    }

    /// Checks and updates the counter of `key`.
    ///
    /// The `flood.decision` counter is only recorded while the protector is active.
    pub async fn check(&self, key: &str) -> Admission {
        let Some(store) = self.store.as_deref().filter(|_| self.config.enabled) else {
            return Admission::Unchecked;
        };

        let admission = self.check_store(store, key).await;

        metric!(
            counter(QuotaCounters::FloodDecision) += 1,
            decision = admission.as_str()
        );

        admission
    }

    async fn check_store(&self, store: &dyn FloodStore, key: &str) -> Admission {
        let current = match store.get(key).await {
            Ok(count) => count.unwrap_or(0),
            Err(error) => {
                store_error("get", key, &error);
                return Admission::Unchecked;
            }
        };

        if current < self.config.limit {
            let count = store.incr(key).await.unwrap_or_else(|error| {
                store_error("incr", key, &error);
                current + 1
            });

            if let Err(error) = store.expire(key, self.config.window()).await {
                store_error("expire", key, &error);
            }

            Admission::Counted { count }
        } else {
            if let Err(error) = store.del(key).await {
                store_error("del", key, &error);
            }

            drain_log::debug!(key, count = current, "flood limit reached");
            Admission::LimitReached { count: current }
        }
    }
}

impl fmt::Debug for FloodProtector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloodProtector")
            .field("config", &self.config)
            .field("store", &self.store.is_some())
            .finish()
    }
}

fn store_error(operation: &'static str, key: &str, error: &FloodError) {
    drain_log::debug!(
        error = error as &dyn std::error::Error,
        key,
        "flood store {operation} failed"
    );
    metric!(
        counter(QuotaCounters::StoreErrors) += 1,
        operation = operation
    );
}
