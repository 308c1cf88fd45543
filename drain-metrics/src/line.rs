use std::fmt;

use indexmap::IndexMap;

/// The value of a single key in a [`DecodedLine`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineValue {
    /// A plain or quoted string value, e.g. `status=200`.
    String(String),
    /// A boolean, either from a bare key (`heroku`) or from the literals `true` and `false`.
    Bool(bool),
    /// The key was written with an empty, unquoted value, e.g. `desc=`.
    Absent,
}

impl LineValue {
    /// Returns `true` unless the value is [`LineValue::Absent`].
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Returns the string contents, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` if this is the boolean `true`.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }
}

impl fmt::Display for LineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Bool(b) => b.fmt(f),
            Self::Absent => Ok(()),
        }
    }
}

impl From<&str> for LineValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<bool> for LineValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One structured log record, as an ordered mapping of keys to values.
///
/// Keys keep the position of their first occurrence. Inserting a key again replaces its value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedLine {
    entries: IndexMap<String, LineValue>,
}

impl DecodedLine {
    /// Creates an empty line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`.
    pub fn insert(&mut self, key: impl Into<String>, value: LineValue) {
        self.entries.insert(key.into(), value);
    }

    /// Returns the value of `key`, including [`LineValue::Absent`] values.
    pub fn get(&self, key: &str) -> Option<&LineValue> {
        self.entries.get(key)
    }

    /// Returns the value of `key` if it exists with a present value.
    pub fn get_present(&self, key: &str) -> Option<&LineValue> {
        self.get(key).filter(|value| value.is_present())
    }

    /// Returns `true` if `key` exists with a present value.
    pub fn has(&self, key: &str) -> bool {
        self.get_present(key).is_some()
    }

    /// Returns `true` if all `keys` exist with present values.
    pub fn has_all(&self, keys: &[&str]) -> bool {
        keys.iter().all(|key| self.has(key))
    }

    /// Returns `true` if `key` holds the boolean `true`.
    pub fn is_true(&self, key: &str) -> bool {
        self.get(key).is_some_and(LineValue::is_true)
    }

    /// Iterates all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LineValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates present entries whose key starts with `prefix`, yielding the key with the prefix
    /// stripped.
    pub fn strip_prefixed<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a LineValue)> + 'a {
        self.iter().filter_map(move |(key, value)| {
            let stripped = key.strip_prefix(prefix)?;
            value.is_present().then_some((stripped, value))
        })
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the line has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for DecodedLine
where
    K: Into<String>,
    V: Into<LineValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut line = Self::new();
        for (key, value) in iter {
            line.insert(key, value.into());
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reinsert_keeps_position() {
        let mut line = DecodedLine::new();
        line.insert("a", LineValue::from("1"));
        line.insert("b", LineValue::from("2"));
        line.insert("a", LineValue::from("3"));

        let entries: Vec<_> = line.iter().map(|(k, v)| (k, v.to_string())).collect();
        assert_eq!(entries, [("a", "3".to_owned()), ("b", "2".to_owned())]);
    }

    #[test]
    fn test_absent_is_not_present() {
        let mut line = DecodedLine::new();
        line.insert("desc", LineValue::Absent);

        assert!(line.get("desc").is_some());
        assert!(!line.has("desc"));
        assert!(!line.has_all(&["desc"]));
    }

    #[test]
    fn test_false_is_present() {
        let line: DecodedLine = [("heroku", false)].into_iter().collect();
        assert!(line.has("heroku"));
        assert!(!line.is_true("heroku"));
    }

    #[test]
    fn test_strip_prefixed() {
        let mut line: DecodedLine = [
            ("source", "web.1"),
            ("sample#memory_rss", "21.22MB"),
            ("sample#load_avg_1m", "0.5"),
        ]
        .into_iter()
        .collect();
        line.insert("sample#memory_swap", LineValue::Absent);

        let samples: Vec<_> = line.strip_prefixed("sample#").map(|(k, _)| k).collect();
        assert_eq!(samples, ["memory_rss", "load_avg_1m"]);
    }
}
