use std::io::Write;

use anyhow::{Context, Result};
use clap::ArgMatches;
use drain_config::{Config, OverridableConfig};

use crate::cliapp::make_app;
use crate::setup;

/// Runs the command line application.
pub fn execute() -> Result<()> {
    let app = make_app();
    let matches = app.get_matches();
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("config", matches)) => manage_config(&config, matches),
        Some(("run", _)) | None => run(config),
        Some((name, _)) => unreachable!("unknown subcommand {name}"),
    }
}

/// Loads the config folder and applies environment variables on top.
fn load_config(matches: &ArgMatches) -> Result<Config> {
    let path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(".");

    let mut config = Config::from_path(path)
        .with_context(|| format!("failed to load config from {path}"))?;
    config.apply_override(OverridableConfig::from_env())?;

    Ok(config)
}

fn manage_config(config: &Config, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => {
            let yaml = config.to_yaml_string()?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(yaml.as_bytes())?;
            Ok(())
        }
        _ => unreachable!(),
    }
}

pub fn run(config: Config) -> Result<()> {
    setup::check_config(&config)?;
    setup::init_logging(&config);
    setup::dump_spawn_infos(&config);
    setup::init_metrics(&config)?;

    drain_server::run(config)?;

    Ok(())
}
