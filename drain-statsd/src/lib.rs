//! StatsD clients built on cadence.
//!
//! This crate serves two purposes:
//!
//!  - [`build_client`] creates the UDP client that tenant metrics are emitted through.
//!  - A global client for the drain's internal measurements, used through the [`metric!`] macro.
//!
//! ## Defining Metrics
//!
//! Internal metrics are defined by implementing one of the metric traits on a custom enum. The
//! following types of metrics are available: `counter`, `timer`, `gauge` and `histogram`. The
//! traits serve only to provide a type safe metric name, so a counter metric cannot be used as a
//! timer metric by accident.
//!
//! ## Initializing the Client
//!
//! Metrics can be used without initializing a statsd client. In that case, invoking
//! [`with_client`] or the [`metric!`] macro will become a noop. Use [`init`] at startup to report
//! to a statsd server:
//!
//! ```no_run
//! use drain_statsd::MetricsConfig;
//!
//! drain_statsd::init(MetricsConfig {
//!     prefix: "drain".to_owned(),
//!     host: "localhost:8125".to_owned(),
//!     queue_size: 1024,
//!     default_tags: Default::default(),
//! })
//! .unwrap();
//! ```
//!
//! ## Macro Usage
//!
//! ```
//! use drain_statsd::{metric, CounterMetric};
//!
//! struct MyCounter;
//!
//! impl CounterMetric for MyCounter {
//!     fn name(&self) -> &'static str {
//!         "counter"
//!     }
//! }
//!
//! metric!(counter(MyCounter) += 1);
//! ```

#![warn(missing_docs)]

mod client;

pub use self::client::*;

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;

use cadence::{Metric, MetricBuilder, StatsdClient};
use parking_lot::RwLock;

/// Client configuration object to store globally.
#[derive(Debug)]
pub struct MetricsClient {
    /// The raw statsd client.
    pub statsd_client: StatsdClient,
    /// Default tags to apply to every metric.
    pub default_tags: BTreeMap<String, String>,
}

/// Configuration of the internal metrics client.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Prefix which is prepended to all internal metric names.
    pub prefix: String,
    /// Host and port of the statsd server.
    pub host: String,
    /// Capacity of the send queue.
    pub queue_size: usize,
    /// Tags that are added to all metrics.
    pub default_tags: BTreeMap<String, String>,
}

impl Deref for MetricsClient {
    type Target = StatsdClient;

    fn deref(&self) -> &StatsdClient {
        &self.statsd_client
    }
}

impl MetricsClient {
    /// Send a metric with the default tags defined on this `MetricsClient`.
    #[inline(always)]
    pub fn send_metric<'a, T>(&'a self, mut metric: MetricBuilder<'a, '_, T>)
    where
        T: Metric + From<String>,
    {
        for (k, v) in &self.default_tags {
            metric = metric.with_tag(k, v);
        }

        if let Err(error) = metric.try_send() {
            drain_log::error!(
                error = &error as &dyn std::error::Error,
                "error sending an internal metric",
            );
        }
    }
}

static METRICS_CLIENT: RwLock<Option<Arc<MetricsClient>>> = RwLock::new(None);

thread_local! {
    static CURRENT_CLIENT: std::cell::RefCell<Option<Arc<MetricsClient>>> = METRICS_CLIENT.read().clone().into();
}

/// Internal prelude for the macro.
#[doc(hidden)]
pub mod _pred {
    pub use cadence::prelude::*;
}

/// Set a new statsd client.
pub fn set_client(client: MetricsClient) {
    *METRICS_CLIENT.write() = Some(Arc::new(client));
    CURRENT_CLIENT.with(|cell| cell.replace(METRICS_CLIENT.read().clone()));
}

/// Disable the client again.
pub fn disable() {
    *METRICS_CLIENT.write() = None;
    CURRENT_CLIENT.with(|cell| cell.replace(None));
}

/// Set a test client for the period of the called function (only affects the current thread).
///
/// Returns every datagram sent while `f` ran.
pub fn with_capturing_test_client(f: impl FnOnce()) -> Vec<String> {
    let (rx, sink) = cadence::SpyMetricSink::new();
    let test_client = MetricsClient {
        statsd_client: StatsdClient::from_sink("", sink),
        default_tags: Default::default(),
    };

    CURRENT_CLIENT.with(|cell| {
        let old_client = cell.replace(Some(Arc::new(test_client)));
        f();
        cell.replace(old_client);
    });

    rx.iter()
        .map(|x| String::from_utf8_lossy(&x).into_owned())
        .collect()
}

/// Tell the metrics system to report to statsd.
pub fn init(config: MetricsConfig) -> Result<(), StatsdError> {
    let statsd_client = build_client(&config.prefix, &config.host, config.queue_size)?;
    drain_log::info!("reporting internal metrics to statsd at {}", config.host);

    set_client(MetricsClient {
        statsd_client,
        default_tags: config.default_tags,
    });

    Ok(())
}

/// Invoke a callback with the current statsd client.
///
/// If statsd is not configured the callback is not invoked. For the most part the [`metric!`]
/// macro should be used instead.
#[inline(always)]
pub fn with_client<F, R>(f: F) -> R
where
    F: FnOnce(&MetricsClient) -> R,
    R: Default,
{
    CURRENT_CLIENT.with(|client| {
        if let Some(client) = client.borrow().as_deref() {
            f(client)
        } else {
            R::default()
        }
    })
}

/// A metric for capturing timings.
///
/// Timings are a positive number of milliseconds between a start and end time.
///
/// ## Example
///
/// ```
/// use drain_statsd::{metric, TimerMetric};
///
/// struct RequestDuration;
///
/// impl TimerMetric for RequestDuration {
///     fn name(&self) -> &'static str {
///         "request.duration"
///     }
/// }
///
/// # use std::time::Instant;
/// let start_time = Instant::now();
/// metric!(timer(RequestDuration) = start_time.elapsed(), route = "drain");
///
/// // measure time implicitly by enclosing a code block in a metric
/// metric!(timer(RequestDuration), {
///     // work
/// });
/// ```
pub trait TimerMetric {
    /// Returns the timer metric name that will be sent to statsd.
    fn name(&self) -> &'static str;
}

/// A metric for capturing counters.
///
/// Counters are simple values incremented or decremented by a client. The rates at which these
/// events occur or average values will be determined by the server receiving them.
///
/// ## Example
///
/// ```
/// use drain_statsd::{metric, CounterMetric};
///
/// enum MyCounter {
///     TotalRequests,
///     TotalLines,
/// }
///
/// impl CounterMetric for MyCounter {
///     fn name(&self) -> &'static str {
///         match self {
///             Self::TotalRequests => "total_requests",
///             Self::TotalLines => "total_lines",
///         }
///     }
/// }
///
/// metric!(counter(MyCounter::TotalRequests) += 1);
/// metric!(counter(MyCounter::TotalLines) += 12, class = "router");
/// ```
pub trait CounterMetric {
    /// Returns the counter metric name that will be sent to statsd.
    fn name(&self) -> &'static str;
}

/// A metric for capturing histograms.
///
/// Histograms are values whose distribution is calculated by the server.
pub trait HistogramMetric {
    /// Returns the histogram metric name that will be sent to statsd.
    fn name(&self) -> &'static str;
}

/// A metric for capturing gauges.
///
/// Gauge values are an instantaneous measurement of a value determined by the client.
pub trait GaugeMetric {
    /// Returns the gauge metric name that will be sent to statsd.
    fn name(&self) -> &'static str;
}

/// Emits a metric.
///
/// See [crate-level documentation](self) for examples.
#[macro_export]
macro_rules! metric {
    // counter increment
    (counter($id:expr) += $value:expr $(, $($k:ident).* = $v:expr)* $(,)?) => {
        match $value {
            value if value != 0 => {
                $crate::with_client(|client| {
                    use $crate::_pred::*;
                    client.send_metric(
                        client.count_with_tags(&$crate::CounterMetric::name(&$id), value)
                        $(.with_tag(stringify!($($k).*), $v))*
                    )
                })
            },
            _ => {},
        };
    };

    // gauge set
    (gauge($id:expr) = $value:expr $(, $($k:ident).* = $v:expr)* $(,)?) => {
        $crate::with_client(|client| {
            use $crate::_pred::*;
            client.send_metric(
                client.gauge_with_tags(&$crate::GaugeMetric::name(&$id), $value)
                    $(.with_tag(stringify!($($k).*), $v))*
            )
        })
    };

    // histogram
    (histogram($id:expr) = $value:expr $(, $($k:ident).* = $v:expr)* $(,)?) => {
        $crate::with_client(|client| {
            use $crate::_pred::*;
            client.send_metric(
                client.histogram_with_tags(&$crate::HistogramMetric::name(&$id), $value)
                    $(.with_tag(stringify!($($k).*), $v))*
            )
        })
    };

    // timer value
    (timer($id:expr) = $value:expr $(, $($k:ident).* = $v:expr)* $(,)?) => {
        $crate::with_client(|client| {
            use $crate::_pred::*;
            client.send_metric(
                client.histogram_with_tags(&$crate::TimerMetric::name(&$id), $value.as_nanos() as f64 / 1e6)
                    $(.with_tag(stringify!($($k).*), $v))*
            )
        })
    };

    // timed block
    (timer($id:expr), $($($k:ident).* = $v:expr,)* $block:block) => {{
        let now = std::time::Instant::now();
        let rv = {$block};
        $crate::metric!(timer($id) = now.elapsed() $(, $($k).* = $v)*);
        rv
    }};
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cadence::{NopMetricSink, StatsdClient};

    use super::*;

    enum TestGauges {
        Foo,
        Bar,
    }

    impl GaugeMetric for TestGauges {
        fn name(&self) -> &'static str {
            match self {
                Self::Foo => "foo",
                Self::Bar => "bar",
            }
        }
    }

    struct TestCounter;

    impl CounterMetric for TestCounter {
        fn name(&self) -> &'static str {
            "counter"
        }
    }

    struct TestHistogram;

    impl HistogramMetric for TestHistogram {
        fn name(&self) -> &'static str {
            "histogram"
        }
    }

    struct TestTimer;

    impl TimerMetric for TestTimer {
        fn name(&self) -> &'static str {
            "timer"
        }
    }

    #[test]
    fn test_capturing_client() {
        let captures = with_capturing_test_client(|| {
            metric!(gauge(TestGauges::Foo) = 123, tenant = "app1", class = "dyno");
            metric!(gauge(TestGauges::Bar) = 456, tenant = "app2", class = "router");
        });

        assert_eq!(
            captures,
            [
                "foo:123|g|#tenant:app1,class:dyno",
                "bar:456|g|#tenant:app2,class:router"
            ]
        )
    }

    #[test]
    fn current_client_is_global_client() {
        let client1 = with_client(|c| format!("{c:?}"));
        set_client(MetricsClient {
            statsd_client: StatsdClient::from_sink("", NopMetricSink),
            default_tags: Default::default(),
        });
        let client2 = with_client(|c| format!("{c:?}"));

        // After setting the global client, the current client must change:
        assert_ne!(client1, client2);
        disable();
    }

    #[test]
    fn test_counter_skips_zero() {
        let captures = with_capturing_test_client(|| {
            metric!(counter(TestCounter) += 0);
            metric!(counter(TestCounter) += 3, decision = "counted");
        });
        assert_eq!(captures, ["counter:3|c|#decision:counted"]);
    }

    #[test]
    fn test_histogram_tags() {
        let captures = with_capturing_test_client(|| {
            metric!(histogram(TestHistogram) = 12u64, tenant = "app1");
        });
        assert_eq!(captures, ["histogram:12|h|#tenant:app1"]);
    }

    #[test]
    fn test_timer_in_milliseconds() {
        let captures = with_capturing_test_client(|| {
            metric!(timer(TestTimer) = Duration::from_secs(2), route = "drain");
        });
        assert_eq!(captures, ["timer:2000|h|#route:drain"]);
    }

    #[test]
    fn test_timed_block() {
        let captures = with_capturing_test_client(|| {
            let value = metric!(timer(TestTimer), route = "drain", { 42 });
            assert_eq!(value, 42);
        });
        // just check the tags to not make this flaky
        assert!(captures[0].ends_with("|h|#route:drain"));
    }

    #[test]
    fn test_noop_without_client() {
        // Nothing is configured on this thread, so this must neither panic nor block.
        metric!(counter(TestCounter) += 1);
    }
}
