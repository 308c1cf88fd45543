use std::error::Error;
use std::fmt;

use tracing::Level;

/// Logs an error to the configured logger or `stderr` if not yet configured.
///
/// Prefer [`drain_log::error`](crate::error) whenever possible. This function is meant for
/// startup, where errors may need to be reported before the logger is initialized.
///
/// # Example
///
/// ```
/// if let Err(error) = std::env::var("FOO") {
///     drain_log::ensure_error(&error);
/// }
/// ```
pub fn ensure_error<E: AsRef<dyn Error>>(error: E) {
    if tracing::event_enabled!(Level::ERROR) {
        crate::error!("{}", LogError(error.as_ref()));
    } else {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("error: {}", LogError(error.as_ref()));
        }
    }
}

/// A wrapper around an [`Error`] that prints its causes.
///
/// # Example
///
/// ```
/// use drain_log::LogError;
///
/// if let Err(error) = std::env::var("FOO") {
///     drain_log::error!("env failed: {}", LogError(&error));
/// }
/// ```
pub struct LogError<'a, E: Error + ?Sized>(pub &'a E);

impl<E: Error + ?Sized> fmt::Display for LogError<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;

        let mut source = self.0.source();
        while let Some(s) = source {
            write!(f, "\n  caused by: {s}")?;
            source = s.source();
        }

        Ok(())
    }
}
