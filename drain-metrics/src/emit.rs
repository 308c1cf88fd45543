//! Turns classified log lines into metric samples.

use drain_statsd::metric;

use crate::classify::LineClass;
use crate::line::DecodedLine;
use crate::logfmt;
use crate::number::{extract_number, leading_integer};
use crate::protocol::MetricSample;
use crate::sink::MetricSink;
use crate::statsd::MetricCounters;
use crate::tags::Tags;
use crate::tenant::TenantContext;

/// Prefix of keys that carry a measurement in dyno and Postgres lines.
const SAMPLE_PREFIX: &str = "sample#";

/// Keys of a router line that become tags.
const ROUTER_TAG_KEYS: &[&str] = &[
    "dyno", "method", "status", "path", "host", "code", "desc", "at",
];

/// Emits the samples of decoded lines on behalf of one tenant.
#[derive(Clone, Copy)]
pub struct MetricEmitter<'a> {
    tenant: &'a TenantContext,
    sink: &'a dyn MetricSink,
}

impl<'a> MetricEmitter<'a> {
    /// Creates an emitter for `tenant` writing to `sink`.
    pub fn new(tenant: &'a TenantContext, sink: &'a dyn MetricSink) -> Self {
        Self { tenant, sink }
    }

    /// Decodes, classifies and emits a raw log line.
    ///
    /// Returns the class the line was handled as.
    pub fn process(&self, raw: &str) -> LineClass {
        let line = logfmt::parse(raw);
        let class = LineClass::of(&line);
        self.emit(class, &line);
        class
    }

    /// Emits all samples of an already classified line and returns how many were sent.
    pub fn emit(&self, class: LineClass, line: &DecodedLine) -> usize {
        metric!(
            counter(MetricCounters::LinesProcessed) += 1,
            class = class.as_str()
        );

        let samples = match class {
            LineClass::DynoMetrics => self.dyno_samples(line),
            LineClass::RouterMetrics => self.router_samples(line),
            LineClass::PostgresMetrics => self.postgres_samples(line),
            LineClass::ScalingEvent => self.scaling_samples(line),
            LineClass::Unmatched => {
                drain_log::trace!("ignoring unmatched line with {} keys", line.len());
                return 0;
            }
        };

        let count = samples.len();
        for sample in samples {
            self.sink.send(sample);
        }
        count
    }

    fn name(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.tenant.metric_prefix())
    }

    fn tags(&self, line_tags: Tags) -> Tags {
        line_tags.union(self.tenant.tags())
    }

    fn dyno_samples(&self, line: &DecodedLine) -> Vec<MetricSample> {
        let source = line.get("source").into_iter().map(|value| ("dyno", value));
        let tags = self.tags(Tags::from_pairs(source));

        line.strip_prefixed(SAMPLE_PREFIX)
            .map(|(key, value)| {
                let name = self.name(&format!("heroku.dyno.{}", key.replace('_', ".")));
                MetricSample::histogram(name, extract_number(value), tags.clone())
            })
            .collect()
    }

    fn router_samples(&self, line: &DecodedLine) -> Vec<MetricSample> {
        let pairs = ROUTER_TAG_KEYS
            .iter()
            .filter_map(|&key| line.get(key).map(|value| (key, value)));
        let tags = self.tags(Tags::from_pairs(pairs));

        let connect = line.get("connect").and_then(extract_number);
        let service = line.get("service").and_then(extract_number);

        let mut samples = vec![
            MetricSample::histogram(
                self.name("heroku.router.request.connect"),
                connect,
                tags.clone(),
            ),
            MetricSample::histogram(
                self.name("heroku.router.request.service"),
                service,
                tags.clone(),
            ),
        ];

        if line.get("at").and_then(|at| at.as_str()) == Some("error") {
            samples.push(MetricSample::counter(
                self.name("heroku.router.error"),
                1,
                tags,
            ));
        }

        samples
    }

    fn postgres_samples(&self, line: &DecodedLine) -> Vec<MetricSample> {
        let source = line.get("source").into_iter().map(|value| ("source", value));
        let tags = self.tags(Tags::from_pairs(source));

        line.strip_prefixed(SAMPLE_PREFIX)
            .map(|(key, value)| {
                let name = self.name(&format!("heroku.postgres.{key}"));
                MetricSample::histogram(name, extract_number(value), tags.clone())
            })
            .collect()
    }

    fn scaling_samples(&self, line: &DecodedLine) -> Vec<MetricSample> {
        let tags = self.tenant.tags();

        line.iter()
            .filter(|(_, value)| !value.is_true())
            .filter_map(|(key, value)| {
                let count = leading_integer(value)?;
                let name = self.name(&format!("heroku.dyno.{key}"));
                Some(MetricSample::gauge(name, count, tags.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::line::LineValue;
    use crate::sink::RecordingSink;

    fn tenant() -> TenantContext {
        TenantContext::new("myapp", ["env:prod"], "")
    }

    fn emit_lines(tenant: &TenantContext, line: DecodedLine) -> Vec<String> {
        let sink = RecordingSink::new();
        let emitter = MetricEmitter::new(tenant, &sink);
        emitter.emit(LineClass::of(&line), &line);
        sink.take_lines()
    }

    #[test]
    fn test_dyno_sample() {
        let line: DecodedLine = [
            ("heroku", LineValue::Bool(true)),
            ("source", LineValue::from("web.1")),
            ("dyno", LineValue::from("heroku.1234.abcd")),
            ("sample#load_avg_1m", LineValue::from("0.5")),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            emit_lines(&tenant(), line),
            ["heroku.dyno.load.avg.1m:0.5|h|#app:myapp,dyno:web.1,env:prod"]
        );
    }

    #[test]
    fn test_dyno_non_numeric_sample() {
        let line: DecodedLine = [
            ("heroku", LineValue::Bool(true)),
            ("source", LineValue::from("web.1")),
            ("dyno", LineValue::from("web.1")),
            ("sample#memory_total", LineValue::from("n/a")),
        ]
        .into_iter()
        .collect();

        let sink = RecordingSink::new();
        let tenant = tenant();
        MetricEmitter::new(&tenant, &sink).emit(LineClass::DynoMetrics, &line);

        let samples = sink.take();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].name, "heroku.dyno.memory.total");
        assert_eq!(
            samples[0].value,
            crate::protocol::MetricValue::Histogram(None)
        );
    }

    #[test]
    fn test_router_info() {
        let line: DecodedLine = [
            ("heroku", LineValue::Bool(true)),
            ("router", LineValue::Bool(true)),
            ("path", LineValue::from("/")),
            ("method", LineValue::from("GET")),
            ("dyno", LineValue::from("web.1")),
            ("status", LineValue::from("200")),
            ("connect", LineValue::from("1ms")),
            ("service", LineValue::from("5ms")),
            ("at", LineValue::from("info")),
        ]
        .into_iter()
        .collect();

        let tenant = TenantContext::new("myapp", Vec::<String>::new(), "");
        let tags = "#app:myapp,at:info,dyno:web.1,method:GET,path:/,status:200";
        assert_eq!(
            emit_lines(&tenant, line),
            [
                format!("heroku.router.request.connect:1|h|{tags}"),
                format!("heroku.router.request.service:5|h|{tags}"),
            ]
        );
    }

    #[test]
    fn test_router_error() {
        let line = logfmt::parse(
            "at=error code=H12 desc=\"Request timeout\" method=GET path=\"/\" host=example.com \
             dyno=web.1 connect=0ms service=30000ms status=503 heroku router",
        );
        assert_eq!(LineClass::of(&line), LineClass::RouterMetrics);

        let tenant = TenantContext::new("myapp", Vec::<String>::new(), "acme");
        let lines = emit_lines(&tenant, line);

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("acme.heroku.router.request.connect:0|h|"));
        assert!(lines[1].starts_with("acme.heroku.router.request.service:30000|h|"));
        assert!(lines[2].starts_with("acme.heroku.router.error:1|c|"));
        assert!(lines[2].contains("code:H12"));
        assert!(lines[2].contains("desc:Request timeout"));
    }

    #[test]
    fn test_postgres_keeps_underscores() {
        let line: DecodedLine = [
            ("source", LineValue::from("DATABASE")),
            ("heroku-postgres", LineValue::Bool(true)),
            ("sample#db_size", LineValue::from("8129.0bytes")),
            ("sample#active-connections", LineValue::from("3")),
        ]
        .into_iter()
        .collect();

        let tenant = TenantContext::new("myapp", Vec::<String>::new(), "");
        assert_eq!(
            emit_lines(&tenant, line),
            [
                "heroku.postgres.db_size:8129|h|#app:myapp,source:DATABASE",
                "heroku.postgres.active-connections:3|h|#app:myapp,source:DATABASE",
            ]
        );
    }

    #[test]
    fn test_scaling_event() {
        let line: DecodedLine = [
            ("api", LineValue::Bool(true)),
            ("Scale", LineValue::Bool(true)),
            ("to", LineValue::Bool(true)),
            ("web", LineValue::from("2")),
            ("worker", LineValue::from("0")),
            ("by", LineValue::from("user@example.com")),
            ("clock", LineValue::from("3abc")),
        ]
        .into_iter()
        .collect();

        let tenant = TenantContext::new("myapp", ["team:core"], "");
        assert_eq!(
            emit_lines(&tenant, line),
            [
                "heroku.dyno.web:2|g|#app:myapp,team:core",
                "heroku.dyno.worker:0|g|#app:myapp,team:core",
                "heroku.dyno.clock:3|g|#app:myapp,team:core",
            ]
        );
    }

    #[test]
    fn test_unmatched_emits_nothing() {
        let sink = RecordingSink::new();
        let tenant = tenant();
        let class = MetricEmitter::new(&tenant, &sink).process("State changed from up to down");

        assert_eq!(class, LineClass::Unmatched);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_lines_processed_metric() {
        let captures = drain_statsd::with_capturing_test_client(|| {
            let sink = RecordingSink::new();
            let tenant = tenant();
            MetricEmitter::new(&tenant, &sink).process("just some text");
        });
        assert_eq!(captures, ["lines.processed:1|c|#class:unmatched"]);
    }
}
