use crate::Cli;
use anyhow::Context;
use awtrix_sync_core::config::{Config, WarnLevel};
use awtrix_sync_core::productive::ProductiveConfig;

/// Load the config file, overlay flags and environment, then validate.
///
/// Error-level findings abort startup; warnings are only logged.
pub fn resolve(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    if let Some(device) = &cli.device {
        config.device.address = device.clone();
    }
    if let Some(dir) = &cli.state_dir {
        config.state_dir = dir.clone();
    }
    if let Some(dir) = &cli.apps_dir {
        config.apps_dir = dir.clone();
    }
    if let Some(secs) = cli.interval_secs {
        config.interval_secs = secs;
    }
    if let Some(n) = cli.concurrency {
        config.concurrency = n;
    }
    if cli.productive_api_key.is_some() || cli.productive_org_id.is_some() {
        let productive = config.productive.get_or_insert_with(ProductiveConfig::default);
        if let Some(key) = &cli.productive_api_key {
            productive.api_key = key.clone();
        }
        if let Some(org) = &cli.productive_org_id {
            productive.org_id = org.clone();
        }
    }

    let warnings = config.validate();
    for w in &warnings {
        match w.level {
            WarnLevel::Error => tracing::error!("{}", w.message),
            WarnLevel::Warning => tracing::warn!("{}", w.message),
        }
    }
    if Config::has_errors(&warnings) {
        let messages: Vec<&str> = warnings
            .iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message.as_str())
            .collect();
        anyhow::bail!("invalid configuration: {}", messages.join("; "));
    }

    Ok(config)
}
