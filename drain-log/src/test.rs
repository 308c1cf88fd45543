#[doc(hidden)]
pub fn __init_test(crate_name: &'static str) {
    let crate_name = crate_name.replace('-', "_");

    tracing_subscriber::fmt()
        .with_env_filter(format!("{crate_name}=trace"))
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}

/// Initialize the logger for testing.
///
/// This logs to the stdout registered by the Rust test runner, and only captures logs from the
/// calling crate.
///
/// # Example
///
/// ```ignore
/// drain_log::init_test!();
/// ```
#[macro_export]
macro_rules! init_test {
    () => {
        $crate::__init_test(::std::env!("CARGO_PKG_NAME"));
    };
}
