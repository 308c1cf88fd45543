//! The HTTP server of the log drain.
//!
//! Platforms deliver application logs to a drain by POSTing batches of logfmt lines to `/`. Each
//! request carries HTTP Basic credentials that identify the tenant. The server streams the body,
//! classifies every line and emits the metrics it contains to StatsD, tagged and prefixed for the
//! tenant.
//!
//! Before the lines of a request are processed, the tenant may be subject to flood protection, see
//! [`drain_quotas`].
//!
//! # Endpoints
//!
//!  - `POST /`: Receives a log batch. Requires credentials and responds with `OK`.
//!  - `GET /healthcheck`: Responds with `OK` without credentials.
//!
//! Requests to any other route are rejected with `401` without credentials and `404` otherwise.

#![warn(missing_docs)]

use std::sync::Arc;

use anyhow::{Context, Result};
use drain_config::Config;

mod constants;
mod endpoints;
mod extractors;
mod middlewares;
mod service;
mod services;
mod statsd;
mod tenants;
mod utils;

#[cfg(test)]
mod testutils;

pub use self::service::ServiceState;
pub use self::services::server::{HttpServer, ServerError};
pub use self::tenants::TenantRegistry;

/// Runs the log drain until the process is asked to shut down.
///
/// Creates a multi-threaded runtime with the configured number of worker threads, connects the
/// backends and serves HTTP requests.
pub fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .thread_name("drain-worker")
        .enable_all()
        .build()
        .context("failed to create the tokio runtime")?;

    runtime.block_on(async {
        let state = ServiceState::start(config.clone()).context("failed to set up backends")?;
        let server = HttpServer::new(config, state).context("failed to start the http server")?;
        server.run().await.context("http server failed")
    })?;

    drain_log::info!("log drain shut down");
    Ok(())
}
