//! Middlewares for the HTTP server.
//!
//! See the server startup in [`HttpServer`](crate::services::server::HttpServer) for where these
//! middlewares are registered.

mod handle_panic;
mod trace;

pub use self::handle_panic::*;
pub use self::trace::*;
