use drain_statsd::CounterMetric;

pub enum QuotaCounters {
    /// Number of flood protection checks.
    ///
    /// This metric is tagged with:
    ///  - `decision`: `unchecked`, `counted` or `limit_reached`.
    FloodDecision,

    /// Number of failed flood store operations.
    ///
    /// This metric is tagged with:
    ///  - `operation`: The store operation, e.g. `get` or `incr`.
    StoreErrors,
}

impl CounterMetric for QuotaCounters {
    fn name(&self) -> &'static str {
        match self {
            Self::FloodDecision => "flood.decision",
            Self::StoreErrors => "flood.store_errors",
        }
    }
}
