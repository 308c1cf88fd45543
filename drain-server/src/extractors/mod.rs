//! Extractors for types from the request.

mod tenant_auth;

pub use self::tenant_auth::*;
