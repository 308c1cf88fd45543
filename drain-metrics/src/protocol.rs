use std::fmt;

use crate::tags::Tags;

/// The type of a [`MetricValue`], determining how the backend aggregates it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MetricType {
    /// A statistical distribution over reported values.
    Histogram,
    /// Counts instances of an event.
    Counter,
    /// An absolute snapshot of a value.
    Gauge,
}

impl MetricType {
    /// Return the StatsD shortcode for this metric type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Histogram => "h",
            MetricType::Counter => "c",
            MetricType::Gauge => "g",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of a [`MetricSample`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetricValue {
    /// A histogram value.
    ///
    /// `None` when the source value did not contain a number. Sinks decide what to do with it.
    Histogram(Option<f64>),
    /// A counter increment.
    Counter(i64),
    /// A gauge value.
    Gauge(i64),
}

impl MetricValue {
    /// Returns the type of this value.
    pub fn ty(&self) -> MetricType {
        match self {
            Self::Histogram(_) => MetricType::Histogram,
            Self::Counter(_) => MetricType::Counter,
            Self::Gauge(_) => MetricType::Gauge,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Histogram(Some(value)) => value.fmt(f),
            Self::Histogram(None) => f.write_str("<none>"),
            Self::Counter(value) => value.fmt(f),
            Self::Gauge(value) => value.fmt(f),
        }
    }
}

/// A single metric emission derived from a log line.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricSample {
    /// The full metric name, including the tenant's prefix.
    pub name: String,
    /// The value and its type.
    pub value: MetricValue,
    /// Tags in `key:value` form.
    pub tags: Tags,
}

impl MetricSample {
    /// Creates a histogram sample.
    pub fn histogram(name: impl Into<String>, value: Option<f64>, tags: Tags) -> Self {
        Self {
            name: name.into(),
            value: MetricValue::Histogram(value),
            tags,
        }
    }

    /// Creates a counter sample.
    pub fn counter(name: impl Into<String>, value: i64, tags: Tags) -> Self {
        Self {
            name: name.into(),
            value: MetricValue::Counter(value),
            tags,
        }
    }

    /// Creates a gauge sample.
    pub fn gauge(name: impl Into<String>, value: i64, tags: Tags) -> Self {
        Self {
            name: name.into(),
            value: MetricValue::Gauge(value),
            tags,
        }
    }
}

/// Formats the sample like a DogStatsD datagram.
impl fmt::Display for MetricSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}|{}", self.name, self.value, self.value.ty())?;
        if !self.tags.is_empty() {
            write!(f, "|#{}", self.tags)?;
        }
        Ok(())
    }
}
