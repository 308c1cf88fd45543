//! The definition of the command line app.

use clap::{Arg, Command};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const ABOUT: &str = "Turns platform log drains into StatsD metrics.";

pub fn make_app() -> Command {
    Command::new("drain")
        .disable_help_subcommand(true)
        .max_term_width(79)
        .version(VERSION)
        .about(ABOUT)
        .arg(
            Arg::new("config")
                .value_name("CONFIG")
                .long("config")
                .short('c')
                .global(true)
                .env("DRAIN_CONFIG")
                .default_value(".")
                .help("The path to the folder holding config.yml."),
        )
        .subcommand(Command::new("run").about("Run the log drain").after_help(
            "This runs the drain in the foreground until it's shut down. It binds to the \
             port and network interface configured in the config file or through PORT and \
             HOST. This is the default when no command is given.",
        ))
        .subcommand(
            Command::new("config")
                .about("Manage the drain config")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("show")
                        .about("Show the effective configuration")
                        .after_help(
                            "This prints the configuration after applying environment \
                             variables. Passwords are redacted.",
                        ),
                ),
        )
}
