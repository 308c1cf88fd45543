use drain_statsd::{CounterMetric, GaugeMetric, TimerMetric};

/// Counter metrics of the HTTP server.
pub enum ServerCounters {
    /// Number of times the HTTP server was started.
    ServerStarting,

    /// Number of log batches received from authenticated tenants.
    RequestsReceived,

    /// Number of requests rejected because of missing or wrong credentials.
    ///
    /// This metric is tagged with:
    ///  - `reason`: `missing_header`, `invalid_header` or `unknown_credentials`.
    Unauthorized,

    /// Number of log batches whose metrics were dropped by the flood policy.
    FloodDropped,

    /// Number of log lines skipped for exceeding `http.max_line_size`.
    LinesOversized,
}

impl CounterMetric for ServerCounters {
    fn name(&self) -> &'static str {
        match self {
            Self::ServerStarting => "server.starting",
            Self::RequestsReceived => "requests.received",
            Self::Unauthorized => "requests.unauthorized",
            Self::FloodDropped => "requests.flood_dropped",
            Self::LinesOversized => "lines.oversized",
        }
    }
}

/// Timer metrics of the HTTP server.
pub enum ServerTimers {
    /// Time from accepting a log batch until its last line was processed.
    RequestDuration,
}

impl TimerMetric for ServerTimers {
    fn name(&self) -> &'static str {
        match self {
            Self::RequestDuration => "requests.duration",
        }
    }
}

/// Gauge metrics of the HTTP server.
pub enum ServerGauges {
    /// Number of connections managed by the Redis pool.
    RedisPoolConnections,
    /// Number of idle connections in the Redis pool.
    RedisPoolIdleConnections,
}

impl GaugeMetric for ServerGauges {
    fn name(&self) -> &'static str {
        match self {
            Self::RedisPoolConnections => "redis.pool.connections",
            Self::RedisPoolIdleConnections => "redis.pool.idle_connections",
        }
    }
}
