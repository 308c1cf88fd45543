use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Admission;

/// What a flood protection counter is kept for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FloodGranularity {
    /// One counter per tenant, checked once per request before any line is processed.
    #[default]
    Tenant,
    /// One counter per tenant and line variant, checked for every classified line.
    TenantVariant,
}

/// Decides whether metrics are emitted for a given [`Admission`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FloodPolicy {
    /// Always emit. Reaching the limit is only logged and counted.
    #[default]
    Observe,
    /// Drop the metrics of a request that opened the flood gate.
    DropFlooded,
    /// Drop the metrics of every counted request and emit only when the flood gate opens.
    ///
    /// This inverts the meaning of the limit and exists for deployments that relied on it.
    DropCounted,
}

impl FloodPolicy {
    /// Returns `true` if metrics should be emitted under this policy.
    pub fn should_emit(self, admission: Admission) -> bool {
        match (self, admission) {
            (Self::Observe, _) => true,
            (_, Admission::Unchecked) => true,
            (Self::DropFlooded, Admission::LimitReached { .. }) => false,
            (Self::DropFlooded, Admission::Counted { .. }) => true,
            (Self::DropCounted, Admission::Counted { .. }) => false,
            (Self::DropCounted, Admission::LimitReached { .. }) => true,
        }
    }
}

/// The error returned when parsing a [`FloodGranularity`] or [`FloodPolicy`] fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseFloodSettingError(String);

impl fmt::Display for ParseFloodSettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown flood protection setting `{}`", self.0)
    }
}

impl std::error::Error for ParseFloodSettingError {}

impl FromStr for FloodGranularity {
    type Err = ParseFloodSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tenant" => Ok(Self::Tenant),
            "tenant_variant" => Ok(Self::TenantVariant),
            _ => Err(ParseFloodSettingError(s.to_owned())),
        }
    }
}

impl FromStr for FloodPolicy {
    type Err = ParseFloodSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "observe" => Ok(Self::Observe),
            "drop_flooded" => Ok(Self::DropFlooded),
            "drop_counted" => Ok(Self::DropCounted),
            _ => Err(ParseFloodSettingError(s.to_owned())),
        }
    }
}

/// Controls the flood protection of tenants.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FloodProtectionConfig {
    /// Enables counting requests in Redis.
    pub enabled: bool,
    /// Number of counted checks within one window before the flood gate opens.
    pub limit: u64,
    /// Length of the counting window in seconds.
    pub window: u64,
    /// What a counter is kept for.
    pub granularity: FloodGranularity,
    /// Whether reaching the limit suppresses metrics.
    pub policy: FloodPolicy,
}

impl FloodProtectionConfig {
    /// Returns the counting window as a [`Duration`].
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window)
    }
}

impl Default for FloodProtectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            limit: 5,
            window: 10,
            granularity: FloodGranularity::default(),
            policy: FloodPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: FloodProtectionConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, FloodProtectionConfig::default());
        assert_eq!(config.window(), Duration::from_secs(10));
    }

    #[test]
    fn test_config_yaml() {
        let yaml = r#"
enabled: true
limit: 100
window: 60
granularity: tenant_variant
policy: drop_flooded
"#;
        let config: FloodProtectionConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config,
            FloodProtectionConfig {
                enabled: true,
                limit: 100,
                window: 60,
                granularity: FloodGranularity::TenantVariant,
                policy: FloodPolicy::DropFlooded,
            }
        );
    }

    #[test]
    fn test_parse_settings() {
        assert_eq!("tenant_variant".parse(), Ok(FloodGranularity::TenantVariant));
        assert_eq!("drop_counted".parse(), Ok(FloodPolicy::DropCounted));
        assert!("drop".parse::<FloodPolicy>().is_err());
    }

    #[test]
    fn test_observe_always_emits() {
        let policy = FloodPolicy::Observe;
        assert!(policy.should_emit(Admission::Unchecked));
        assert!(policy.should_emit(Admission::Counted { count: 1 }));
        assert!(policy.should_emit(Admission::LimitReached { count: 5 }));
    }

    #[test]
    fn test_drop_flooded() {
        let policy = FloodPolicy::DropFlooded;
        assert!(policy.should_emit(Admission::Unchecked));
        assert!(policy.should_emit(Admission::Counted { count: 1 }));
        assert!(!policy.should_emit(Admission::LimitReached { count: 5 }));
    }

    #[test]
    fn test_drop_counted() {
        let policy = FloodPolicy::DropCounted;
        assert!(policy.should_emit(Admission::Unchecked));
        assert!(!policy.should_emit(Admission::Counted { count: 1 }));
        assert!(policy.should_emit(Admission::LimitReached { count: 5 }));
    }
}
