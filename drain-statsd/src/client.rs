use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use cadence::{BufferedUdpMetricSink, MetricError, QueuingMetricSink, StatsdClient};

/// Maximum number of metric events that can be queued before we start dropping them.
pub const DEFAULT_QUEUE_SIZE: usize = 100_000;

/// An error returned when a StatsD client cannot be created.
#[derive(Debug, thiserror::Error)]
pub enum StatsdError {
    /// The statsd host could not be resolved.
    #[error("failed to resolve statsd host `{0}`")]
    Resolve(String, #[source] io::Error),

    /// The statsd host resolved to no address at all.
    #[error("statsd host `{0}` did not resolve to any address")]
    NoAddress(String),

    /// The local UDP socket could not be set up.
    #[error("failed to bind the statsd socket")]
    Socket(#[from] io::Error),

    /// The metric sink rejected the socket.
    #[error("failed to create the statsd sink")]
    Sink(#[from] MetricError),
}

/// Resolves `host` to the first socket address it yields.
pub fn resolve(host: &str) -> Result<SocketAddr, StatsdError> {
    host.to_socket_addrs()
        .map_err(|e| StatsdError::Resolve(host.to_owned(), e))?
        .next()
        .ok_or_else(|| StatsdError::NoAddress(host.to_owned()))
}

/// Creates a StatsD client sending over UDP to `host`.
///
/// Datagrams are buffered and handed to a background thread through a queue of at most
/// `queue_size` entries, so sending a metric never blocks the caller. When the queue is full,
/// metrics are dropped and the send reports an error.
pub fn build_client(
    prefix: &str,
    host: &str,
    queue_size: usize,
) -> Result<StatsdClient, StatsdError> {
    let addr = resolve(host)?;

    let bind_addr = match addr {
        SocketAddr::V4(_) => "0.0.0.0:0",
        SocketAddr::V6(_) => "[::]:0",
    };
    let socket = UdpSocket::bind(bind_addr)?;
    socket.set_nonblocking(true)?;

    let udp_sink = BufferedUdpMetricSink::from(addr, socket)?;
    let sink = QueuingMetricSink::with_capacity(udp_sink, queue_size);

    drain_log::debug!("created statsd client for {addr}");
    Ok(StatsdClient::from_sink(prefix, sink))
}
