//! Classification of platform log lines and emission of the metrics they carry.
//!
//! A log line goes through three stages:
//!
//!  1. [`logfmt::parse`] decodes the raw text into a [`DecodedLine`] of keys and values. Bare words
//!     become boolean flags.
//!  2. [`LineClass::of`] determines the shape of the line: dyno runtime metrics, a router request,
//!     Postgres metrics, a scaling event, or nothing of interest.
//!  3. [`MetricEmitter`] derives [`MetricSample`]s from the line and hands them to a
//!     [`MetricSink`], usually the [`StatsdSink`].
//!
//! ```
//! use std::sync::Mutex;
//!
//! use drain_metrics::{LineClass, MetricEmitter, MetricSample, MetricSink, TenantContext};
//!
//! #[derive(Default)]
//! struct Collect(Mutex<Vec<String>>);
//!
//! impl MetricSink for Collect {
//!     fn send(&self, sample: MetricSample) {
//!         self.0.lock().unwrap().push(sample.to_string());
//!     }
//! }
//!
//! let tenant = TenantContext::new("myapp", ["env:prod"], "");
//! let sink = Collect::default();
//!
//! let class = MetricEmitter::new(&tenant, &sink).process(
//!     "source=web.1 dyno=heroku.1.abc sample#load_avg_1m=0.5 heroku",
//! );
//!
//! assert_eq!(class, LineClass::DynoMetrics);
//! assert_eq!(
//!     *sink.0.lock().unwrap(),
//!     ["heroku.dyno.load.avg.1m:0.5|h|#app:myapp,dyno:web.1,env:prod"],
//! );
//! ```

#![warn(missing_docs)]

mod classify;
mod emit;
mod line;
mod number;
mod protocol;
mod sink;
mod statsd;
mod tags;
mod tenant;

pub mod logfmt;

pub use self::classify::*;
pub use self::emit::*;
pub use self::line::*;
pub use self::number::*;
pub use self::protocol::*;
pub use self::sink::*;
pub use self::tags::*;
pub use self::tenant::*;
