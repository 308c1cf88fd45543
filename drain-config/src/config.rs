use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use drain_log::{LogConfig, LogLevel, SentryConfig};
use drain_quotas::FloodProtectionConfig;
use drain_redis::RedisConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};

use crate::{ByteSize, OverridableConfig, parse_statsd_url};

type BoxedError = Box<dyn Error + Send + Sync + 'static>;

/// Defines the source of a config error.
#[derive(Debug, Default)]
enum ConfigErrorSource {
    /// An error occurring independently.
    #[default]
    None,
    /// An error originating from a configuration file.
    File(PathBuf),
    /// An error originating in a field override, such as an environment variable.
    FieldOverride(String),
}

/// Indicates config related errors.
#[derive(Debug)]
pub struct ConfigError {
    source: ConfigErrorSource,
    kind: ConfigErrorKind,
    inner: Option<BoxedError>,
}

impl ConfigError {
    pub(crate) fn new(kind: ConfigErrorKind) -> Self {
        Self {
            source: ConfigErrorSource::None,
            kind,
            inner: None,
        }
    }

    pub(crate) fn wrap<E>(inner: E, kind: ConfigErrorKind) -> Self
    where
        E: Into<BoxedError>,
    {
        Self {
            inner: Some(inner.into()),
            ..Self::new(kind)
        }
    }

    pub(crate) fn for_field<E>(inner: E, field: impl Into<String>) -> Self
    where
        E: Into<BoxedError>,
    {
        Self::wrap(inner, ConfigErrorKind::InvalidValue).field(field)
    }

    pub(crate) fn file<P: AsRef<Path>>(mut self, p: P) -> Self {
        self.source = ConfigErrorSource::File(p.as_ref().to_path_buf());
        self
    }

    pub(crate) fn field(mut self, name: impl Into<String>) -> Self {
        self.source = ConfigErrorSource::FieldOverride(name.into());
        self
    }

    /// Returns the error kind of the error.
    pub fn kind(&self) -> ConfigErrorKind {
        self.kind
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ConfigErrorSource::None => self.kind.fmt(f),
            ConfigErrorSource::File(file_name) => {
                write!(f, "{} (file {})", self.kind, file_name.display())
            }
            ConfigErrorSource::FieldOverride(name) => write!(f, "{} (field {})", self.kind, name),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

/// Indicates config related errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ConfigErrorKind {
    /// Failed to open the file.
    #[error("could not open config file")]
    CouldNotOpenFile,
    /// Failed to serialize the configuration.
    #[error("could not write config")]
    CouldNotWriteFile,
    /// Parsing YAML failed.
    #[error("could not parse yaml config file")]
    BadYaml,
    /// Invalid config value.
    #[error("invalid config value")]
    InvalidValue,
    /// No tenant is configured, so every request would be rejected.
    #[error("no tenants configured, set ALLOWED_APPS")]
    MissingTenants,
    /// A tenant has no password.
    #[error("missing tenant password")]
    MissingPassword,
}

trait ConfigObject: DeserializeOwned + Serialize {
    /// The basename of the config file.
    fn name() -> &'static str;

    /// The full filename of the config file, including the file extension.
    fn path(base: &Path) -> PathBuf {
        base.join(format!("{}.yml", Self::name()))
    }

    /// Loads the config file from a file within the given directory location.
    fn load(base: &Path) -> Result<Self, ConfigError> {
        let path = Self::path(base);

        let f = fs::File::open(&path)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotOpenFile).file(&path))?;

        serde_yaml::from_reader(io::BufReader::new(f))
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::BadYaml).file(&path))
    }
}

/// HTTP listener settings.
#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
struct Http {
    /// The address to bind to.
    host: IpAddr,
    /// The port to listen on.
    port: u16,
    /// Maximum length of a single log line in bytes. Longer lines are skipped.
    max_line_size: ByteSize,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            max_line_size: ByteSize::kibibytes(64),
        }
    }
}

/// Settings of the async runtime.
#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
struct Runtime {
    /// Number of worker threads serving requests.
    worker_threads: usize,
}

impl Default for Runtime {
    fn default() -> Self {
        Self { worker_threads: 1 }
    }
}

/// Where tenant metrics and internal telemetry are sent.
#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
struct Metrics {
    /// The `host:port` of the StatsD server.
    statsd: String,
    /// Maximum number of datagrams queued for sending.
    queue_size: usize,
    /// Reports the drain's own telemetry to the same StatsD server.
    internal: bool,
    /// Prefix of internal metric names.
    internal_prefix: String,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            statsd: "127.0.0.1:8125".to_owned(),
            queue_size: drain_statsd::DEFAULT_QUEUE_SIZE,
            internal: false,
            internal_prefix: "drain".to_owned(),
        }
    }
}

fn redact<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    match value.is_empty() {
        true => serializer.serialize_str(""),
        false => serializer.serialize_str("********"),
    }
}

/// A tenant allowed to send logs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TenantConfig {
    /// The name of the tenant, which is also the username of its credentials.
    pub name: String,
    /// The password of the tenant.
    #[serde(default, serialize_with = "redact")]
    pub password: String,
    /// Tags in `key:value` form added to every metric of this tenant.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Prefix of every metric name of this tenant.
    #[serde(default)]
    pub prefix: String,
}

impl TenantConfig {
    /// Creates a tenant without password, tags or prefix.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: String::new(),
            tags: Vec::new(),
            prefix: String::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
struct ConfigValues {
    http: Http,
    runtime: Runtime,
    metrics: Metrics,
    redis: Option<RedisConfig>,
    flood_protection: FloodProtectionConfig,
    logging: LogConfig,
    sentry: SentryConfig,
    tenants: Vec<TenantConfig>,
}

impl ConfigObject for ConfigValues {
    fn name() -> &'static str {
        "config"
    }
}

/// Config struct.
pub struct Config {
    values: ConfigValues,
    path: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("path", &self.path)
            .field("values", &self.values)
            .finish()
    }
}

impl Config {
    /// Loads a config from a given config folder.
    ///
    /// A missing `config.yml` yields the defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = std::env::current_dir()
            .map(|x| x.join(path.as_ref()))
            .unwrap_or_else(|_| path.as_ref().to_path_buf());

        let values = if ConfigValues::path(&path).exists() {
            ConfigValues::load(&path)?
        } else {
            ConfigValues::default()
        };

        Ok(Config { values, path })
    }

    /// Creates a config from a YAML string.
    ///
    /// This is mostly useful for tests.
    pub fn from_yaml_str(yaml: &str) -> Result<Config, ConfigError> {
        Ok(Config {
            values: serde_yaml::from_str(yaml)
                .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::BadYaml))?,
            path: PathBuf::new(),
        })
    }

    /// Override configuration with values coming from environment variables.
    pub fn apply_override(
        &mut self,
        overrides: OverridableConfig,
    ) -> Result<&mut Self, ConfigError> {
        let http = &mut self.values.http;
        if let Some(host) = overrides.host {
            http.host = host
                .parse()
                .map_err(|err| ConfigError::for_field(err, "HOST"))?;
        }

        if let Some(port) = overrides.port {
            http.port = port
                .parse()
                .map_err(|err| ConfigError::for_field(err, "PORT"))?;
        }

        if let Some(workers) = overrides.worker_threads {
            let workers: usize = workers
                .parse()
                .map_err(|err| ConfigError::for_field(err, "WEB_CONCURRENCY"))?;
            if workers == 0 {
                return Err(
                    ConfigError::new(ConfigErrorKind::InvalidValue).field("WEB_CONCURRENCY")
                );
            }
            self.values.runtime.worker_threads = workers;
        }

        if let Some(statsd_url) = overrides.statsd_url {
            self.values.metrics.statsd = parse_statsd_url(&statsd_url)
                .map_err(|err| ConfigError::for_field(err, "STATSD_URL"))?;
        }

        if let Some(redis_url) = overrides.redis_url {
            self.values.redis = Some(RedisConfig::Single(redis_url));
        }

        let flood = &mut self.values.flood_protection;
        if let Some(limit) = overrides.limit {
            flood.limit = limit
                .parse()
                .map_err(|err| ConfigError::for_field(err, "LIMIT_REQ"))?;
        }

        if let Some(window) = overrides.window {
            flood.window = window
                .parse()
                .map_err(|err| ConfigError::for_field(err, "EXPIRE_REQ"))?;
        }

        if let Some(enabled) = overrides.flood_protection {
            flood.enabled = parse_flag(&enabled, "FLOOD_PROTECTION")?;
        }

        if let Some(granularity) = overrides.granularity {
            flood.granularity = granularity
                .parse()
                .map_err(|err| ConfigError::for_field(err, "FLOOD_PROTECTION_GRANULARITY"))?;
        }

        if let Some(policy) = overrides.policy {
            flood.policy = policy
                .parse()
                .map_err(|err| ConfigError::for_field(err, "FLOOD_PROTECTION_POLICY"))?;
        }

        let logging = &mut self.values.logging;
        if let Some(level) = overrides.log_level {
            logging.level = level
                .parse()
                .map_err(|err| ConfigError::for_field(err, "LOG_LEVEL"))?;
        }

        if let Some(debug) = overrides.debug {
            if parse_flag(&debug, "DEBUG")? {
                logging.level = LogLevel::Debug;
            }
        }

        if let Some(format) = overrides.log_format {
            logging.format = format
                .parse()
                .map_err(|err| ConfigError::for_field(err, "LOG_FORMAT"))?;
        }

        if let Some(dsn) = overrides.sentry_dsn {
            let sentry = &mut self.values.sentry;
            sentry.dsn = Some(
                dsn.parse()
                    .map_err(|err| ConfigError::for_field(err, "SENTRY_DSN"))?,
            );
            sentry.enabled = true;
        }

        if let Some(allowed_apps) = overrides.allowed_apps {
            self.values.tenants = allowed_apps
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(TenantConfig::new)
                .collect();
        }

        for tenant in &mut self.values.tenants {
            overrides.tenants.apply(tenant);
        }

        Ok(self)
    }

    /// Checks that the configuration can serve requests.
    ///
    /// At least one tenant must be configured and every tenant needs a password.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.values.tenants.is_empty() {
            return Err(ConfigError::new(ConfigErrorKind::MissingTenants).field("ALLOWED_APPS"));
        }

        for tenant in &self.values.tenants {
            if tenant.password.is_empty() {
                let field = format!("{}_PASSWORD", tenant.name.to_uppercase());
                return Err(ConfigError::new(ConfigErrorKind::MissingPassword).field(field));
            }
        }

        Ok(())
    }

    /// Serializes the effective configuration to YAML, with passwords redacted.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(&self.values)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotWriteFile))
    }

    /// The path to the config folder.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the socket address the HTTP server binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.values.http.host, self.values.http.port)
    }

    /// Returns the maximum length of a log line in bytes.
    pub fn max_line_size(&self) -> usize {
        self.values.http.max_line_size.as_bytes()
    }

    /// Returns the number of worker threads of the runtime.
    pub fn worker_threads(&self) -> usize {
        self.values.runtime.worker_threads
    }

    /// Returns the `host:port` of the StatsD server.
    pub fn statsd_addr(&self) -> &str {
        &self.values.metrics.statsd
    }

    /// Returns the maximum number of queued StatsD datagrams.
    pub fn statsd_queue_size(&self) -> usize {
        self.values.metrics.queue_size
    }

    /// Returns `true` if the drain reports its own telemetry.
    pub fn internal_metrics(&self) -> bool {
        self.values.metrics.internal
    }

    /// Returns the prefix of internal metric names.
    pub fn internal_metrics_prefix(&self) -> &str {
        &self.values.metrics.internal_prefix
    }

    /// Returns the Redis server holding flood protection counters, if any.
    pub fn redis(&self) -> Option<&RedisConfig> {
        self.values.redis.as_ref()
    }

    /// Returns the flood protection settings.
    pub fn flood_protection(&self) -> &FloodProtectionConfig {
        &self.values.flood_protection
    }

    /// Returns the logging configuration.
    pub fn logging(&self) -> &LogConfig {
        &self.values.logging
    }

    /// Returns the Sentry configuration.
    pub fn sentry(&self) -> &SentryConfig {
        &self.values.sentry
    }

    /// Returns all configured tenants.
    pub fn tenants(&self) -> &[TenantConfig] {
        &self.values.tenants
    }
}

/// Parses an integer flag where `0` is off and any other integer is on.
///
/// An empty value counts as off.
fn parse_flag(value: &str, field: &'static str) -> Result<bool, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(false);
    }

    value
        .parse::<i64>()
        .map(|flag| flag != 0)
        .map_err(|err| ConfigError::for_field(err, field))
}

#[cfg(test)]
mod tests {
    use drain_quotas::{FloodGranularity, FloodPolicy};
    use similar_asserts::assert_eq;

    use super::*;

    fn env_config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let mut config = Config::from_yaml_str("{}")?;
        config.apply_override(OverridableConfig::from_env_vars(vars.iter().copied()))?;
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml_str("{}").unwrap();

        assert_eq!(config.listen_addr(), "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.worker_threads(), 1);
        assert_eq!(config.max_line_size(), 64 * 1024);
        assert_eq!(config.statsd_addr(), "127.0.0.1:8125");
        assert!(!config.internal_metrics());
        assert!(config.redis().is_none());
        assert_eq!(config.flood_protection(), &FloodProtectionConfig::default());
        assert_eq!(config.logging().level, LogLevel::Info);
        assert!(config.tenants().is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let config = env_config(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("WEB_CONCURRENCY", "4"),
            ("STATSD_URL", "statsd://metrics:9125"),
            ("REDIS_URL", "redis://redis:6379"),
            ("LIMIT_REQ", "50"),
            ("EXPIRE_REQ", "30"),
            ("FLOOD_PROTECTION", "1"),
            ("FLOOD_PROTECTION_GRANULARITY", "tenant_variant"),
            ("FLOOD_PROTECTION_POLICY", "drop_flooded"),
            ("DEBUG", "1"),
            ("ALLOWED_APPS", "myapp"),
            ("MYAPP_PASSWORD", "secret"),
        ])
        .unwrap();

        assert_eq!(config.listen_addr(), "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.worker_threads(), 4);
        assert_eq!(config.statsd_addr(), "metrics:9125");
        assert_eq!(
            config.redis(),
            Some(&RedisConfig::Single("redis://redis:6379".to_owned()))
        );
        assert_eq!(
            config.flood_protection(),
            &FloodProtectionConfig {
                enabled: true,
                limit: 50,
                window: 30,
                granularity: FloodGranularity::TenantVariant,
                policy: FloodPolicy::DropFlooded,
            }
        );
        assert_eq!(config.logging().level, LogLevel::Debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tenants_from_env() {
        let config = env_config(&[
            ("ALLOWED_APPS", "myapp, other-app,"),
            ("MYAPP_PASSWORD", "secret"),
            ("MYAPP_TAGS", "env:prod, team:core"),
            ("MYAPP_PREFIX", "acme"),
            ("OTHER-APP_PASSWORD", "hunter2"),
        ])
        .unwrap();

        assert_eq!(
            config.tenants(),
            [
                TenantConfig {
                    name: "myapp".to_owned(),
                    password: "secret".to_owned(),
                    tags: vec!["env:prod".to_owned(), "team:core".to_owned()],
                    prefix: "acme".to_owned(),
                },
                TenantConfig {
                    name: "other-app".to_owned(),
                    password: "hunter2".to_owned(),
                    tags: vec![],
                    prefix: String::new(),
                },
            ]
        );
    }

    #[test]
    fn test_missing_tenants() {
        let config = env_config(&[]).unwrap();
        let error = config.validate().unwrap_err();
        assert_eq!(error.kind(), ConfigErrorKind::MissingTenants);
    }

    #[test]
    fn test_missing_password() {
        let config = env_config(&[("ALLOWED_APPS", "myapp")]).unwrap();
        let error = config.validate().unwrap_err();

        assert_eq!(error.kind(), ConfigErrorKind::MissingPassword);
        assert_eq!(
            error.to_string(),
            "missing tenant password (field MYAPP_PASSWORD)"
        );
    }

    #[test]
    fn test_flag_values() {
        let disabled = env_config(&[("FLOOD_PROTECTION", "0")]).unwrap();
        assert!(!disabled.flood_protection().enabled);

        let empty = env_config(&[("FLOOD_PROTECTION", "")]).unwrap();
        assert!(!empty.flood_protection().enabled);

        let error = env_config(&[("FLOOD_PROTECTION", "yes")]).unwrap_err();
        assert_eq!(error.kind(), ConfigErrorKind::InvalidValue);
        assert!(error.source().is_some());
    }

    #[test]
    fn test_invalid_port() {
        let error = env_config(&[("PORT", "http")]).unwrap_err();
        assert_eq!(error.to_string(), "invalid config value (field PORT)");
    }

    #[test]
    fn test_zero_workers() {
        let error = env_config(&[("WEB_CONCURRENCY", "0")]).unwrap_err();
        assert_eq!(error.kind(), ConfigErrorKind::InvalidValue);
    }

    #[test]
    fn test_env_overrides_file_tenants() {
        let mut config = Config::from_yaml_str(
            r#"
tenants:
  - name: myapp
    password: from-file
    tags: ["env:staging"]
"#,
        )
        .unwrap();

        config
            .apply_override(OverridableConfig::from_env_vars([(
                "MYAPP_PASSWORD",
                "from-env",
            )]))
            .unwrap();

        let tenant = &config.tenants()[0];
        assert_eq!(tenant.password, "from-env");
        assert_eq!(tenant.tags, ["env:staging"]);
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yml"),
            "http:\n  port: 4000\nredis: redis://127.0.0.1:6379\n",
        )
        .unwrap();

        let config = Config::from_path(dir.path()).unwrap();
        assert_eq!(config.listen_addr().port(), 4000);
        assert!(config.redis().is_some());
    }

    #[test]
    fn test_max_line_size() {
        let config = Config::from_yaml_str("http:\n  max_line_size: 8 KiB\n").unwrap();
        assert_eq!(config.max_line_size(), 8 * 1024);

        let config = Config::from_yaml_str("http:\n  max_line_size: 512\n").unwrap();
        assert_eq!(config.max_line_size(), 512);
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_path(dir.path()).unwrap();
        assert_eq!(config.listen_addr().port(), 3000);
    }

    #[test]
    fn test_bad_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yml"), "http: [").unwrap();

        let error = Config::from_path(dir.path()).unwrap_err();
        assert_eq!(error.kind(), ConfigErrorKind::BadYaml);
        assert!(error.to_string().contains("(file "));
    }

    #[test]
    fn test_show_redacts_passwords() {
        let config = env_config(&[("ALLOWED_APPS", "myapp"), ("MYAPP_PASSWORD", "secret")])
            .unwrap();
        let yaml = config.to_yaml_string().unwrap();

        assert!(!yaml.contains("secret"));
        assert!(yaml.contains("password: '********'"));
    }
}
