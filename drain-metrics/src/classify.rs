use std::fmt;

use crate::line::DecodedLine;

/// Keys identifying runtime metrics of a dyno.
const DYNO_KEYS: &[&str] = &["heroku", "source", "dyno"];

/// Keys identifying a request logged by the router.
const ROUTER_KEYS: &[&str] = &[
    "heroku", "router", "path", "method", "dyno", "status", "connect", "service", "at",
];

/// Keys identifying metrics of a Postgres add-on.
const POSTGRES_KEYS: &[&str] = &["source", "heroku-postgres"];

/// The shape of a decoded log line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineClass {
    /// Runtime metrics of a dyno, such as load average and memory usage.
    DynoMetrics,
    /// A request served by the router, with connect and service times.
    RouterMetrics,
    /// Periodic metrics of a Postgres database.
    PostgresMetrics,
    /// A formation change, e.g. `Scale to web=2, worker=1`.
    ScalingEvent,
    /// Any other line. Nothing is emitted for it.
    Unmatched,
}

impl LineClass {
    /// Classifies a line.
    ///
    /// The shapes are checked in a fixed order and the first match wins, so a line that carries
    /// the dyno keys is always [`DynoMetrics`](Self::DynoMetrics) even if it also has all router
    /// keys.
    pub fn of(line: &DecodedLine) -> Self {
        if line.has_all(DYNO_KEYS) {
            Self::DynoMetrics
        } else if line.has_all(ROUTER_KEYS) {
            Self::RouterMetrics
        } else if line.has_all(POSTGRES_KEYS) {
            Self::PostgresMetrics
        } else if line.is_true("api") && line.is_true("Scale") {
            Self::ScalingEvent
        } else {
            Self::Unmatched
        }
    }

    /// Returns the short name used in logs, tags and flood protection keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DynoMetrics => "dyno",
            Self::RouterMetrics => "router",
            Self::PostgresMetrics => "postgres",
            Self::ScalingEvent => "scaling",
            Self::Unmatched => "unmatched",
        }
    }

    /// Returns `true` for the shapes that are subject to flood protection.
    ///
    /// Scaling events are rare and always emitted.
    pub fn is_flood_protected(&self) -> bool {
        matches!(
            self,
            Self::DynoMetrics | Self::RouterMetrics | Self::PostgresMetrics
        )
    }
}

impl fmt::Display for LineClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::LineValue;

    fn router_line() -> DecodedLine {
        [
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
        .collect()
    }

    #[test]
    fn test_dyno() {
        let line: DecodedLine = [
            ("heroku", LineValue::Bool(true)),
            ("source", LineValue::from("web.1")),
            ("dyno", LineValue::from("heroku.1")),
        ]
        .into_iter()
        .collect();

        assert_eq!(LineClass::of(&line), LineClass::DynoMetrics);
    }

    #[test]
    fn test_router() {
        assert_eq!(LineClass::of(&router_line()), LineClass::RouterMetrics);
    }

    #[test]
    fn test_dyno_takes_priority_over_router() {
        let mut line = router_line();
        line.insert("source", LineValue::from("web.1"));
        assert_eq!(LineClass::of(&line), LineClass::DynoMetrics);
    }

    #[test]
    fn test_router_missing_key() {
        let mut line = router_line();
        line.insert("service", LineValue::Absent);
        assert_eq!(LineClass::of(&line), LineClass::Unmatched);
    }

    #[test]
    fn test_postgres() {
        let line: DecodedLine = [
            ("source", LineValue::from("DATABASE")),
            ("heroku-postgres", LineValue::Bool(true)),
            ("sample#db_size", LineValue::from("4347350804bytes")),
        ]
        .into_iter()
        .collect();

        assert_eq!(LineClass::of(&line), LineClass::PostgresMetrics);
    }

    #[test]
    fn test_scaling_requires_booleans() {
        let line: DecodedLine = [
            ("api", LineValue::Bool(true)),
            ("Scale", LineValue::Bool(true)),
            ("web", LineValue::from("1")),
        ]
        .into_iter()
        .collect();
        assert_eq!(LineClass::of(&line), LineClass::ScalingEvent);

        let line: DecodedLine = [("api", "true"), ("Scale", "yes")].into_iter().collect();
        assert_eq!(LineClass::of(&line), LineClass::Unmatched);
    }

    #[test]
    fn test_unmatched() {
        let line: DecodedLine = [("at", "info"), ("msg", "hello")].into_iter().collect();
        assert_eq!(LineClass::of(&line), LineClass::Unmatched);
        assert!(!LineClass::Unmatched.is_flood_protected());
        assert!(!LineClass::ScalingEvent.is_flood_protected());
    }
}
