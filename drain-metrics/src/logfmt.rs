//! Decoder for logfmt encoded log lines.
//!
//! Log drains deliver one record per line in the `key=value` format popularized by Heroku:
//!
//! ```text
//! at=info method=GET path="/" host=myapp.herokuapp.com dyno=web.1 connect=1ms service=5ms status=200
//! ```
//!
//! The dialect understood here:
//!
//!  - Pairs are separated by spaces outside of double quotes.
//!  - A bare word without `=` is a boolean `true`.
//!  - The values `true` and `false` are booleans.
//!  - `key=` with nothing after it is [`LineValue::Absent`], while `key=""` is the empty string.
//!  - A backslash escapes the character following it.
//!  - A key that occurs twice keeps the last value.

use crate::line::{DecodedLine, LineValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Key,
    Value,
}

struct Decoder {
    line: DecodedLine,
    state: State,
    key: String,
    value: String,
    in_quote: bool,
    had_quote: bool,
}

impl Decoder {
    fn new() -> Self {
        Self {
            line: DecodedLine::new(),
            state: State::Idle,
            key: String::new(),
            value: String::new(),
            in_quote: false,
            had_quote: false,
        }
    }

    fn push(&mut self, c: char) {
        match self.state {
            State::Idle => {
                self.key.push(c);
                self.state = State::Key;
            }
            State::Key => self.key.push(c),
            State::Value => self.value.push(c),
        }
    }

    fn flush(&mut self) {
        let key = std::mem::take(&mut self.key);
        let value = std::mem::take(&mut self.value);

        if !key.is_empty() {
            match self.state {
                State::Idle => (),
                State::Key => self.line.insert(key, LineValue::Bool(true)),
                State::Value => {
                    let value = match value.as_str() {
                        "true" => LineValue::Bool(true),
                        "false" => LineValue::Bool(false),
                        "" if !self.had_quote => LineValue::Absent,
                        _ => LineValue::String(value),
                    };
                    self.line.insert(key, value);
                }
            }
        }

        self.state = State::Idle;
        self.in_quote = false;
        self.had_quote = false;
    }

    fn decode(mut self, input: &str) -> DecodedLine {
        let mut chars = input.chars();

        while let Some(c) = chars.next() {
            match c {
                ' ' if !self.in_quote => self.flush(),
                '=' if !self.in_quote && self.state != State::Value => {
                    self.state = State::Value;
                }
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        self.push(escaped);
                    }
                }
                '"' => {
                    if self.state == State::Value {
                        self.had_quote = true;
                    }
                    self.in_quote = !self.in_quote;
                }
                c => self.push(c),
            }
        }

        self.flush();
        self.line
    }
}

/// Decodes a single logfmt line.
///
/// A trailing line break is ignored. Decoding never fails: malformed input yields whatever pairs
/// could be recognized.
pub fn parse(line: &str) -> DecodedLine {
    let line = line.trim_end_matches(['\n', '\r']);
    Decoder::new().decode(line)
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    fn entries(line: &DecodedLine) -> Vec<(String, LineValue)> {
        line.iter()
            .map(|(k, v)| (k.to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn test_simple_pairs() {
        let line = parse("at=info status=200 dyno=web.1\n");
        assert_eq!(
            entries(&line),
            [
                ("at".to_owned(), LineValue::from("info")),
                ("status".to_owned(), LineValue::from("200")),
                ("dyno".to_owned(), LineValue::from("web.1")),
            ]
        );
    }

    #[test]
    fn test_bare_keys_are_true() {
        let line = parse("heroku router path=/");
        assert!(line.is_true("heroku"));
        assert!(line.is_true("router"));
        assert_eq!(line.get("path"), Some(&LineValue::from("/")));
    }

    #[test]
    fn test_boolean_literals() {
        let line = parse("a=true b=false c=\"true\"");
        assert_eq!(line.get("a"), Some(&LineValue::Bool(true)));
        assert_eq!(line.get("b"), Some(&LineValue::Bool(false)));
        assert_eq!(line.get("c"), Some(&LineValue::Bool(true)));
    }

    #[test]
    fn test_empty_values() {
        let line = parse("desc= code=\"\"");
        assert_eq!(line.get("desc"), Some(&LineValue::Absent));
        assert_eq!(line.get("code"), Some(&LineValue::from("")));
    }

    #[test]
    fn test_quoted_values() {
        let line = parse(r#"desc="Request timeout" path="/a b""#);
        assert_eq!(line.get("desc"), Some(&LineValue::from("Request timeout")));
        assert_eq!(line.get("path"), Some(&LineValue::from("/a b")));
    }

    #[test]
    fn test_escapes() {
        let line = parse(r#"msg="say \"hi\"" path=a\ b"#);
        assert_eq!(line.get("msg"), Some(&LineValue::from(r#"say "hi""#)));
        assert_eq!(line.get("path"), Some(&LineValue::from("a b")));
    }

    #[test]
    fn test_equals_in_value() {
        let line = parse("path=/search?q=rust");
        assert_eq!(line.get("path"), Some(&LineValue::from("/search?q=rust")));
    }

    #[test]
    fn test_repeated_spaces() {
        let line = parse("  a=1   b  ");
        assert_eq!(line.len(), 2);
        assert_eq!(line.get("a"), Some(&LineValue::from("1")));
        assert!(line.is_true("b"));
    }

    #[test]
    fn test_last_value_wins() {
        let line = parse("a=1 a=2");
        assert_eq!(line.len(), 1);
        assert_eq!(line.get("a"), Some(&LineValue::from("2")));
    }

    #[test]
    fn test_dyno_frame() {
        let line = parse(
            "333 <45>1 2024-05-01T10:00:00.000000+00:00 host heroku web.1 - \
             source=web.1 dyno=heroku.123.abc sample#load_avg_1m=0.01 sample#memory_rss=21.22MB",
        );

        assert!(line.is_true("heroku"));
        assert_eq!(line.get("source"), Some(&LineValue::from("web.1")));
        assert_eq!(line.get("dyno"), Some(&LineValue::from("heroku.123.abc")));
        assert_eq!(
            line.get("sample#memory_rss"),
            Some(&LineValue::from("21.22MB"))
        );
    }

    #[test]
    fn test_scaling_frame() {
        let line = parse(
            "118 <45>1 2024-05-01T10:00:00.000000+00:00 host app api - \
             Scale to web=1, worker=2 by user@example.com",
        );

        assert!(line.is_true("api"));
        assert!(line.is_true("Scale"));
        assert_eq!(line.get("web"), Some(&LineValue::from("1,")));
        assert_eq!(line.get("worker"), Some(&LineValue::from("2")));
    }

    #[test]
    fn test_empty_line() {
        assert!(parse("").is_empty());
        assert!(parse("\r\n").is_empty());
    }
}
