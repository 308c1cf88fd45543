use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, header};
use axum_server::Handle;
use drain_config::Config;
use drain_redis::RedisError;
use drain_statsd::{StatsdError, metric};
use tokio::net::TcpSocket;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::constants;
use crate::middlewares::{self, CatchPanicLayer};
use crate::service::ServiceState;
use crate::statsd::ServerCounters;

/// Maximum number of pending connections.
const LISTEN_BACKLOG: u32 = 1024;

/// Time given to in-flight requests to finish after a shutdown signal.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Indicates the type of failure of the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding failed.
    #[error("bind to interface failed")]
    BindFailed(#[from] io::Error),

    /// The Redis pool could not be created.
    #[error("failed to set up redis")]
    Redis(#[from] RedisError),

    /// The StatsD client could not be created.
    #[error("failed to set up the statsd client")]
    Statsd(#[from] StatsdError),
}

/// Build the axum application with all routes and middleware.
pub(crate) fn make_app(service: ServiceState) -> axum::Router {
    // Service builder order defines layers added first will be called first. This means:
    //  - Requests go from top to bottom
    //  - Responses go from bottom to top
    let middleware = ServiceBuilder::new()
        .layer(CatchPanicLayer::custom(middlewares::handle_panic))
        .layer(SetResponseHeaderLayer::overriding(
            header::SERVER,
            HeaderValue::from_static(constants::SERVER),
        ))
        .layer(middlewares::trace_http_layer());

    crate::endpoints::routes()
        .layer(middleware)
        .with_state(service)
}

fn listen(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }?;

    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    Ok(socket.listen(LISTEN_BACKLOG)?.into_std()?)
}

/// Resolves when the process receives `SIGINT` or `SIGTERM`.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            drain_log::error!(
                error = &error as &dyn std::error::Error,
                "failed to listen for ctrl-c"
            );
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                drain_log::error!(
                    error = &error as &dyn std::error::Error,
                    "failed to listen for SIGTERM"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => (),
        _ = terminate => (),
    }
}

/// HTTP server.
///
/// Hosts the drain endpoints until the process receives a shutdown signal. In-flight requests are
/// given some time to complete.
pub struct HttpServer {
    config: Arc<Config>,
    service: ServiceState,
    listener: TcpListener,
}

impl HttpServer {
    /// Binds the listen address of the configuration.
    pub fn new(config: Arc<Config>, service: ServiceState) -> Result<Self, ServerError> {
        let listener = listen(config.listen_addr())?;

        Ok(Self {
            config,
            service,
            listener,
        })
    }

    /// Serves requests until shutdown.
    pub async fn run(self) -> Result<(), ServerError> {
        let Self {
            config,
            service,
            listener,
        } = self;

        drain_log::info!("spawning http server");
        drain_log::info!("  listening on http://{}/", config.listen_addr());
        metric!(counter(ServerCounters::ServerStarting) += 1);

        let handle = Handle::new();
        let server = axum_server::from_tcp(listener).handle(handle.clone());

        tokio::spawn(async move {
            shutdown_signal().await;
            drain_log::info!("shutting down http server");
            handle.graceful_shutdown(Some(SHUTDOWN_TIMEOUT));
        });

        let app = make_app(service);
        server.serve(app.into_make_service()).await?;

        drain_log::info!("http server stopped");
        Ok(())
    }
}
