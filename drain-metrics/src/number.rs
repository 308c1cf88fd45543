use std::sync::LazyLock;

use regex::Regex;

use crate::line::LineValue;

/// The first run of digits and periods, e.g. `12.3` in `12.3ms`.
static NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9.]+").unwrap());

/// Extracts a number from a possibly unit-suffixed value.
///
/// Only string values carry numbers. The first maximal run of digits and periods is parsed as a
/// floating point number, so `"21.22MB"` yields `21.22` and `"5ms"` yields `5`. Runs the float
/// parser rejects, such as `"1.2.3"` or a lone `"."`, yield `None` just like values without any
/// digits.
pub fn extract_number(value: &LineValue) -> Option<f64> {
    let s = value.as_str()?;
    let matched = NUMBER_REGEX.find(s)?;
    matched.as_str().parse().ok()
}

/// Parses the integer at the start of a value, ignoring anything after it.
///
/// Leading whitespace and a single sign are accepted, so `" -3abc"` yields `-3` and `"1,"` yields
/// `1`. Non-string values and strings that do not start with digits yield `None`.
pub fn leading_integer(value: &LineValue) -> Option<i64> {
    let s = value.as_str()?.trim_start();

    let (sign, rest) = match s.as_bytes().first()? {
        b'-' => (-1, &s[1..]),
        b'+' => (1, &s[1..]),
        _ => (1, s),
    };

    let end = rest
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len());

    if end == 0 {
        return None;
    }

    rest[..end].parse::<i64>().ok().map(|n| sign * n)
}
