//! Error reporting and logging for the log drain.
//!
//! All crates of the workspace log through the macros re-exported here. They are thin aliases of
//! the [`tracing`] macros, so structured fields work as usual:
//!
//! ```
//! let tenant = "myapp";
//! drain_log::debug!(tenant, "received log batch");
//! drain_log::info!("listening on {}", "0.0.0.0:3000");
//! ```
//!
//! # Setup
//!
//! The binary calls [`init`] once at startup with the logging and Sentry sections of the
//! configuration. Before that, errors should be reported with [`ensure_error`], which falls back
//! to `stderr`.
//!
//! # Testing
//!
//! Unit tests that want to see log output can call [`init_test!`] at the top of the test.

#![warn(missing_docs)]

#[cfg(feature = "init")]
mod setup;
#[cfg(feature = "init")]
pub use setup::*;

#[cfg(feature = "test")]
mod test;
#[cfg(feature = "test")]
pub use test::*;

mod utils;
pub use utils::*;

// Expose the minimal log facade.
#[doc(inline)]
pub use tracing::{Level, debug, error, info, trace, warn};

// Expose the minimal error reporting API.
#[cfg(feature = "init")]
#[doc(inline)]
pub use sentry::Hub;
