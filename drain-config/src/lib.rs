//! Configuration for the log drain CLI and server.
//!
//! The configuration is read from an optional `config.yml` in the configuration folder and then
//! overridden from environment variables through [`OverridableConfig`]. Every section of the file
//! has defaults, so the drain can run from environment variables alone:
//!
//! ```yaml
//! http:
//!   port: 3000
//!   max_line_size: 64 KiB
//! metrics:
//!   statsd: "127.0.0.1:8125"
//! flood_protection:
//!   enabled: true
//!   limit: 5
//!   window: 10
//! tenants:
//!   - name: myapp
//!     password: secret
//!     tags: ["env:prod"]
//! ```

#![warn(missing_docs)]

mod byte_size;
mod config;
mod overrides;
mod statsd_url;

pub use self::byte_size::*;
pub use self::config::*;
pub use self::overrides::*;
pub use self::statsd_url::*;
