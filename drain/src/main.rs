//! The log drain binary.
//!
//! Receives application logs from a platform log drain over HTTP and reports the metrics they
//! contain to StatsD. See [`drain_server`] for the endpoints and [`drain_config`] for all settings.
//!
//! ```text
//! ALLOWED_APPS=myapp MYAPP_PASSWORD=secret STATSD_URL=statsd://localhost:8125 drain run
//! ```

mod cli;
mod cliapp;
mod setup;

use std::process;

use drain_log::Hub;

#[cfg(target_os = "linux")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

pub fn main() {
    let exit_code = match cli::execute() {
        Ok(()) => 0,
        Err(err) => {
            drain_log::ensure_error(&err);
            1
        }
    };

    Hub::current().client().map(|x| x.close(None));
    process::exit(exit_code);
}
