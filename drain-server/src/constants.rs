include!(concat!(env!("OUT_DIR"), "/constants.gen.rs"));

/// Body of successful responses.
pub const OK: &str = "OK";

/// Body of responses to requests without valid credentials.
pub const UNAUTHORIZED: &str = "Unauthorized";
