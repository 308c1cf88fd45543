use axum::http::StatusCode;

use crate::extractors::TenantAuth;

/// Responds to authenticated requests for unknown routes.
///
/// Without valid credentials the extractor rejects the request with `401` first, so unknown routes
/// do not reveal anything to unauthenticated clients.
pub async fn not_found(_: TenantAuth) -> StatusCode {
    StatusCode::NOT_FOUND
}
