use drain_statsd::CounterMetric;

/// Counter metrics of the emission pipeline.
pub enum MetricCounters {
    /// Number of log lines that went through classification.
    ///
    /// This metric is tagged with:
    ///  - `class`: The shape of the line, e.g. `dyno` or `unmatched`.
    LinesProcessed,

    /// Number of samples emitted to the metrics backend.
    ///
    /// This metric is tagged with:
    ///  - `kind`: The StatsD type shortcode of the sample.
    SamplesEmitted,

    /// Number of histogram samples dropped because the line value held no number.
    SamplesWithoutValue,

    /// Number of samples that could not be queued for sending.
    SamplesFailed,
}

impl CounterMetric for MetricCounters {
    fn name(&self) -> &'static str {
        match self {
            Self::LinesProcessed => "lines.processed",
            Self::SamplesEmitted => "samples.emitted",
            Self::SamplesWithoutValue => "samples.no_value",
            Self::SamplesFailed => "samples.failed",
        }
    }
}
