use serde::{Deserialize, Serialize};

const fn default_max_connections() -> u32 {
    24
}

/// Additional configuration options for a redis client.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct RedisConfigOptions {
    /// Maximum number of connections managed by the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for RedisConfigOptions {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
        }
    }
}

/// Configuration for connecting a redis client.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum RedisConfig {
    /// Connect to a single Redis instance.
    ///
    /// Contains the `redis://` url to the node.
    Single(String),

    /// Connect to a single Redis instance with additional options, e.g. `max_connections`.
    SingleWithOpts {
        /// Contains the `redis://` url to the node.
        server: String,

        /// Additional configuration options for the redis client and a connections pool.
        #[serde(flatten)]
        options: RedisConfigOptions,
    },
}

impl RedisConfig {
    /// Returns the `redis://` url of the server.
    pub fn server(&self) -> &str {
        match self {
            Self::Single(server) => server,
            Self::SingleWithOpts { server, .. } => server,
        }
    }

    /// Returns the pool options, falling back to defaults for the plain url form.
    pub fn options(&self) -> RedisConfigOptions {
        match self {
            Self::Single(_) => RedisConfigOptions::default(),
            Self::SingleWithOpts { options, .. } => options.clone(),
        }
    }
}
