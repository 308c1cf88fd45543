use std::collections::BTreeMap;

use anyhow::Result;
use drain_config::Config;
use drain_statsd::MetricsConfig;

/// Validates the configuration before anything is started.
pub fn check_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.worker_threads() == 0 {
        anyhow::bail!("the runtime needs at least one worker thread");
    }

    Ok(())
}

pub fn init_logging(config: &Config) {
    drain_log::init(config.logging(), config.sentry());
}

/// Print spawn infos to the log.
pub fn dump_spawn_infos(config: &Config) {
    if config.path().as_os_str().is_empty() {
        drain_log::info!("launching log drain without config folder");
    } else {
        drain_log::info!(
            "launching log drain from config folder {}",
            config.path().display()
        );
    }

    let tenants: Vec<_> = config.tenants().iter().map(|t| t.name.as_str()).collect();
    drain_log::info!("  tenants: {}", tenants.join(", "));
    drain_log::info!("  statsd: {}", config.statsd_addr());

    let flood = config.flood_protection();
    match (flood.enabled, config.redis()) {
        (true, Some(_)) => drain_log::info!(
            "  flood protection: {} per {}s ({:?}, {:?})",
            flood.limit,
            flood.window,
            flood.granularity,
            flood.policy,
        ),
        (true, None) => drain_log::info!("  flood protection: no redis configured"),
        (false, _) => drain_log::info!("  flood protection: disabled"),
    }

    drain_log::info!("  worker threads: {}", config.worker_threads());
    drain_log::info!("  log level: {}", config.logging().level);
}

/// Initialize the internal metric system.
pub fn init_metrics(config: &Config) -> Result<()> {
    if !config.internal_metrics() {
        return Ok(());
    }

    let mut default_tags = BTreeMap::new();
    if let Some(hostname) = hostname::get().ok().and_then(|s| s.into_string().ok()) {
        default_tags.insert("host".to_owned(), hostname);
    }

    drain_statsd::init(MetricsConfig {
        prefix: config.internal_metrics_prefix().to_owned(),
        host: config.statsd_addr().to_owned(),
        queue_size: config.statsd_queue_size(),
        default_tags,
    })?;

    Ok(())
}
