use std::sync::Arc;

use cadence::prelude::*;
use cadence::{Metric, MetricBuilder, StatsdClient};
use drain_statsd::metric;

use crate::protocol::{MetricSample, MetricValue};
use crate::statsd::MetricCounters;
use crate::tags::Tags;

/// The destination of emitted metric samples.
///
/// Emission is fire-and-forget: sinks never report errors back to the pipeline.
pub trait MetricSink: Send + Sync {
    /// Sends a single sample.
    fn send(&self, sample: MetricSample);
}

impl<T: MetricSink + ?Sized> MetricSink for Arc<T> {
    fn send(&self, sample: MetricSample) {
        (**self).send(sample)
    }
}

/// Sends samples to a StatsD server with DogStatsD tags.
///
/// Histograms without a value cannot be represented on the wire and are dropped with a debug log.
#[derive(Debug)]
pub struct StatsdSink {
    client: StatsdClient,
}

impl StatsdSink {
    /// Creates a sink sending through `client`.
    pub fn new(client: StatsdClient) -> Self {
        Self { client }
    }
}

fn with_tags<'m, 'c, T>(
    mut builder: MetricBuilder<'m, 'c, T>,
    tags: &'m Tags,
) -> MetricBuilder<'m, 'c, T>
where
    T: Metric + From<String>,
{
    for tag in tags.iter() {
        builder = builder.with_tag_value(tag);
    }
    builder
}

impl MetricSink for StatsdSink {
    fn send(&self, sample: MetricSample) {
        drain_log::debug!("intercepted metric {sample}");

        let name = sample.name.as_str();
        let result = match sample.value {
            MetricValue::Histogram(Some(value)) => {
                with_tags(self.client.histogram_with_tags(name, value), &sample.tags)
                    .try_send()
                    .map(drop)
            }
            MetricValue::Histogram(None) => {
                drain_log::debug!("dropping histogram {name} without a value");
                metric!(counter(MetricCounters::SamplesWithoutValue) += 1);
                return;
            }
            MetricValue::Counter(value) => {
                with_tags(self.client.count_with_tags(name, value), &sample.tags)
                    .try_send()
                    .map(drop)
            }
            MetricValue::Gauge(value) => {
                with_tags(self.client.gauge_with_tags(name, value as f64), &sample.tags)
                    .try_send()
                    .map(drop)
            }
        };

        match result {
            Ok(()) => {
                metric!(
                    counter(MetricCounters::SamplesEmitted) += 1,
                    kind = sample.value.ty().as_str()
                );
            }
            Err(error) => {
                drain_log::debug!(
                    error = &error as &dyn std::error::Error,
                    "failed to send metric {name}"
                );
                metric!(counter(MetricCounters::SamplesFailed) += 1);
            }
        }
    }
}

/// A sink that keeps all samples in memory.
#[cfg(any(test, feature = "test"))]
#[derive(Debug, Default)]
pub struct RecordingSink {
    samples: parking_lot::Mutex<Vec<MetricSample>>,
}

#[cfg(any(test, feature = "test"))]
impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns all samples recorded so far.
    pub fn take(&self) -> Vec<MetricSample> {
        std::mem::take(&mut *self.samples.lock())
    }

    /// Removes all recorded samples and returns them formatted as datagrams.
    pub fn take_lines(&self) -> Vec<String> {
        self.take().iter().map(ToString::to_string).collect()
    }
}

#[cfg(any(test, feature = "test"))]
impl MetricSink for RecordingSink {
    fn send(&self, sample: MetricSample) {
        self.samples.lock().push(sample);
    }
}
