use std::collections::BTreeMap;

use crate::TenantConfig;

/// Names of the environment variables that override static settings.
const HOST: &str = "HOST";
const PORT: &str = "PORT";
const WEB_CONCURRENCY: &str = "WEB_CONCURRENCY";
const STATSD_URL: &str = "STATSD_URL";
const REDIS_URL: &str = "REDIS_URL";
const LIMIT_REQ: &str = "LIMIT_REQ";
const EXPIRE_REQ: &str = "EXPIRE_REQ";
const FLOOD_PROTECTION: &str = "FLOOD_PROTECTION";
const FLOOD_PROTECTION_GRANULARITY: &str = "FLOOD_PROTECTION_GRANULARITY";
const FLOOD_PROTECTION_POLICY: &str = "FLOOD_PROTECTION_POLICY";
const DEBUG: &str = "DEBUG";
const LOG_LEVEL: &str = "LOG_LEVEL";
const LOG_FORMAT: &str = "LOG_FORMAT";
const SENTRY_DSN: &str = "SENTRY_DSN";
const ALLOWED_APPS: &str = "ALLOWED_APPS";

/// Suffixes of per-tenant variables, such as `MYAPP_PASSWORD`.
const PASSWORD_SUFFIX: &str = "_PASSWORD";
const TAGS_SUFFIX: &str = "_TAGS";
const PREFIX_SUFFIX: &str = "_PREFIX";

/// Per-tenant settings from variables named after the upper-cased tenant.
#[derive(Debug, Default)]
pub struct TenantOverrides {
    vars: BTreeMap<String, String>,
}

impl TenantOverrides {
    fn accepts(key: &str) -> bool {
        [PASSWORD_SUFFIX, TAGS_SUFFIX, PREFIX_SUFFIX]
            .iter()
            .any(|suffix| key.len() > suffix.len() && key.ends_with(suffix))
    }

    fn get(&self, tenant: &str, suffix: &str) -> Option<&str> {
        let key = format!("{}{suffix}", tenant.to_uppercase());
        self.vars.get(&key).map(String::as_str)
    }

    /// Applies the variables of `tenant` to its configuration.
    ///
    /// Tags are a comma-separated list. Variables that are not set leave the configuration as is.
    pub fn apply(&self, tenant: &mut TenantConfig) {
        if let Some(password) = self.get(&tenant.name, PASSWORD_SUFFIX) {
            tenant.password = password.to_owned();
        }

        if let Some(tags) = self.get(&tenant.name, TAGS_SUFFIX) {
            tenant.tags = tags
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_owned)
                .collect();
        }

        if let Some(prefix) = self.get(&tenant.name, PREFIX_SUFFIX) {
            tenant.prefix = prefix.to_owned();
        }
    }
}

/// Structure used to hold information about configuration overrides via environment variables.
///
/// Values are kept as strings and validated when applied with
/// [`Config::apply_override`](crate::Config::apply_override).
#[derive(Debug, Default)]
pub struct OverridableConfig {
    /// The address to bind the HTTP server to.
    pub host: Option<String>,
    /// The port of the HTTP server.
    pub port: Option<String>,
    /// Number of runtime worker threads.
    pub worker_threads: Option<String>,
    /// The StatsD server as URL or `host:port`.
    pub statsd_url: Option<String>,
    /// The Redis server for flood protection counters.
    pub redis_url: Option<String>,
    /// The flood protection limit.
    pub limit: Option<String>,
    /// The flood protection window in seconds.
    pub window: Option<String>,
    /// Integer flag enabling flood protection.
    pub flood_protection: Option<String>,
    /// The flood protection granularity.
    pub granularity: Option<String>,
    /// The flood protection policy.
    pub policy: Option<String>,
    /// Integer flag enabling debug logging.
    pub debug: Option<String>,
    /// The log level.
    pub log_level: Option<String>,
    /// The log format.
    pub log_format: Option<String>,
    /// The Sentry DSN. Setting it enables error reporting.
    pub sentry_dsn: Option<String>,
    /// Comma-separated names of all tenants.
    pub allowed_apps: Option<String>,
    /// Passwords, tags and prefixes of tenants.
    pub tenants: TenantOverrides,
}

impl OverridableConfig {
    /// Collects overrides from `(name, value)` pairs. Unknown names are ignored.
    pub fn from_env_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut overrides = Self::default();

        for (key, value) in vars {
            let key = key.into();
            let value = Some(value.into());

            match key.as_str() {
                HOST => overrides.host = value,
                PORT => overrides.port = value,
                WEB_CONCURRENCY => overrides.worker_threads = value,
                STATSD_URL => overrides.statsd_url = value,
                REDIS_URL => overrides.redis_url = value,
                LIMIT_REQ => overrides.limit = value,
                EXPIRE_REQ => overrides.window = value,
                FLOOD_PROTECTION => overrides.flood_protection = value,
                FLOOD_PROTECTION_GRANULARITY => overrides.granularity = value,
                FLOOD_PROTECTION_POLICY => overrides.policy = value,
                DEBUG => overrides.debug = value,
                LOG_LEVEL => overrides.log_level = value,
                LOG_FORMAT => overrides.log_format = value,
                SENTRY_DSN => overrides.sentry_dsn = value,
                ALLOWED_APPS => overrides.allowed_apps = value,
                _ if TenantOverrides::accepts(&key) => {
                    overrides.tenants.vars.extend(value.map(|v| (key, v)));
                }
                _ => (),
            }
        }

        overrides
    }

    /// Collects overrides from the environment of the process.
    pub fn from_env() -> Self {
        Self::from_env_vars(std::env::vars())
    }
}
