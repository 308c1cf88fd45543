//! A simple health check endpoint for load balancers.

use crate::constants;

/// Answers `OK` without authentication.
pub async fn handle() -> &'static str {
    constants::OK
}
