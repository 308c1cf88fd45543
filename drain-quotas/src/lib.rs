//! Per-tenant flood protection.
//!
//! Requests of a tenant are counted in fixed windows in a shared [`FloodStore`], usually Redis. The
//! [`FloodProtector`] never rejects anything by itself. It reports an [`Admission`], and the
//! configured [`FloodPolicy`] decides whether the metrics of the request are emitted.
//!
//! Store failures never block tenants: a check that cannot read its counter reports
//! [`Admission::Unchecked`].

#![warn(missing_docs)]

mod config;
mod protector;
mod redis;
mod statsd;
mod store;

pub use self::config::*;
pub use self::protector::*;
pub use self::redis::*;
pub use self::store::*;
