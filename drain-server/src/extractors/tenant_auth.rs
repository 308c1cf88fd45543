use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use data_encoding::BASE64;
use drain_metrics::TenantContext;
use drain_statsd::metric;

use crate::constants;
use crate::service::ServiceState;
use crate::statsd::ServerCounters;

/// Rejection of requests without valid HTTP Basic credentials.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The `Authorization` header is missing.
    #[error("missing authorization header")]
    MissingHeader,

    /// The `Authorization` header does not hold Basic credentials.
    #[error("malformed authorization header")]
    InvalidHeader,

    /// The credentials do not belong to a configured tenant.
    #[error("unknown tenant credentials")]
    UnknownCredentials,
}

impl AuthError {
    fn reason(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_header",
            Self::InvalidHeader => "invalid_header",
            Self::UnknownCredentials => "unknown_credentials",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        drain_log::debug!("rejecting request: {self}");
        metric!(
            counter(ServerCounters::Unauthorized) += 1,
            reason = self.reason()
        );

        (StatusCode::UNAUTHORIZED, constants::UNAUTHORIZED).into_response()
    }
}

/// The tenant that sent a request, identified by HTTP Basic authentication.
///
/// The username is the tenant name and the password its configured secret.
#[derive(Clone, Debug)]
pub struct TenantAuth(pub Arc<TenantContext>);

/// Splits the value of an `Authorization` header into username and password.
fn basic_credentials(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = BASE64.decode(encoded.trim().as_bytes()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (name, password) = decoded.split_once(':')?;

    Some((name.to_owned(), password.to_owned()))
}

impl FromRequestParts<ServiceState> for TenantAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingHeader)?;

        let value = header.to_str().map_err(|_| AuthError::InvalidHeader)?;
        let (name, password) = basic_credentials(value).ok_or(AuthError::InvalidHeader)?;

        state
            .tenants()
            .authenticate(&name, &password)
            .map(TenantAuth)
            .ok_or(AuthError::UnknownCredentials)
    }
}
