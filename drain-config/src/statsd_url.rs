use url::Url;

/// The port of the StatsD server when the address does not name one.
pub const DEFAULT_STATSD_PORT: u16 = 8125;

/// An error parsing the address of a StatsD server.
#[derive(Debug, thiserror::Error)]
pub enum StatsdUrlError {
    /// The address is not a valid URL.
    #[error("invalid statsd url")]
    InvalidUrl(#[from] url::ParseError),

    /// The URL has a scheme other than `statsd` or `udp`.
    #[error("unsupported statsd url scheme `{0}`")]
    UnsupportedScheme(String),

    /// The URL has no host.
    #[error("statsd url has no host")]
    MissingHost,
}

/// Parses the address of a StatsD server into `host:port`.
///
/// Accepts `statsd://host:port`, `udp://host:port` and a bare `host:port`. The port defaults to
/// [`DEFAULT_STATSD_PORT`].
///
/// ```
/// use drain_config::parse_statsd_url;
///
/// assert_eq!(parse_statsd_url("statsd://metrics.internal").unwrap(), "metrics.internal:8125");
/// assert_eq!(parse_statsd_url("10.0.0.1:9125").unwrap(), "10.0.0.1:9125");
/// ```
pub fn parse_statsd_url(value: &str) -> Result<String, StatsdUrlError> {
    let value = value.trim();
    let url = match value.contains("://") {
        true => Url::parse(value)?,
        false => Url::parse(&format!("statsd://{value}"))?,
    };

    if !matches!(url.scheme(), "statsd" | "udp") {
        return Err(StatsdUrlError::UnsupportedScheme(url.scheme().to_owned()));
    }

    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or(StatsdUrlError::MissingHost)?;
    let port = url.port().unwrap_or(DEFAULT_STATSD_PORT);

    Ok(format!("{host}:{port}"))
}
