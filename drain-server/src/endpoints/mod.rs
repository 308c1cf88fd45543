//! Web server endpoints.
//!
//! `GET /healthcheck` is open to everyone. All other routes require the credentials of a tenant.

use axum::Router;
use axum::routing::{get, post};

use crate::service::ServiceState;

mod drain;
mod health_check;
mod statics;

/// Builds the router with all endpoints.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/healthcheck", get(health_check::handle))
        .route("/", post(drain::handle).fallback(statics::not_found))
        .fallback(statics::not_found)
}
