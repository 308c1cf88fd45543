use std::collections::BTreeSet;
use std::fmt;

use crate::line::LineValue;

/// A set of dimensional tags in `key:value` form.
///
/// Tags are deduplicated by their exact string and iterate in sorted order, so merging is a plain
/// set union that does not depend on the order tags were added in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds tags from key/value pairs, skipping absent values.
    ///
    /// ```
    /// use drain_metrics::{LineValue, Tags};
    ///
    /// let dyno = LineValue::from("web.1");
    /// let tags = Tags::from_pairs([("dyno", &dyno), ("desc", &LineValue::Absent)]);
    /// assert_eq!(tags.to_string(), "dyno:web.1");
    /// ```
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a LineValue)>,
    {
        pairs
            .into_iter()
            .filter(|(_, value)| value.is_present())
            .map(|(key, value)| format!("{key}:{value}"))
            .collect()
    }

    /// Adds a single tag.
    pub fn insert(&mut self, tag: impl Into<String>) {
        self.0.insert(tag.into());
    }

    /// Returns the union of both tag sets.
    #[must_use]
    pub fn union(&self, other: &Tags) -> Tags {
        Tags(self.0.union(&other.0).cloned().collect())
    }

    /// Returns `true` if the exact tag is contained.
    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// Iterates the tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns the number of tags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no tags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Into<String>> FromIterator<T> for Tags {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<String>> Extend<T> for Tags {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, tag) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            f.write_str(tag)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_is_order_independent() {
        let a = LineValue::from("1");
        let line_tags = Tags::from_pairs([("a", &a)]);
        let prefix: Tags = ["b:2"].into_iter().collect();

        assert_eq!(line_tags.union(&prefix), prefix.union(&line_tags));
        assert_eq!(line_tags.union(&prefix).to_string(), "a:1,b:2");
    }

    #[test]
    fn test_union_is_idempotent() {
        let a = LineValue::from("1");
        let line_tags = Tags::from_pairs([("a", &a)]);
        let prefix: Tags = ["a:1", "b:2"].into_iter().collect();

        let once = line_tags.union(&prefix);
        let twice = once.union(&line_tags);
        assert_eq!(once, twice);
        assert_eq!(twice.len(), 2);
    }

    #[test]
    fn test_boolean_values() {
        let t = LineValue::Bool(true);
        let tags = Tags::from_pairs([("path", &t)]);
        assert!(tags.contains("path:true"));
    }

    #[test]
    fn test_no_conflict_resolution() {
        // Same key with different values are distinct tags.
        let tags: Tags = ["env:prod", "env:staging"].into_iter().collect();
        assert_eq!(tags.len(), 2);
    }
}
