//! Process logger installation for hosts embedding the scope tree.

use anyhow::Context;
use scopeloc_core::services::LOG_TARGET;
use scopeloc_core::LocatorConfig;

/// Builds the `env_logger` filter for `cfg`.
///
/// `RUST_LOG` wins over `log_filter`; a verbose config additionally opens the
/// tree's own target at info level.
pub fn builder(cfg: &LocatorConfig) -> env_logger::Builder {
    let mut b = env_logger::Builder::new();
    b.parse_filters(&cfg.log_filter);
    if cfg.verbose {
        b.filter_module(LOG_TARGET, log::LevelFilter::Info);
    }
    if let Ok(env) = std::env::var("RUST_LOG") {
        b.parse_filters(&env);
    }
    b
}

/// Installs the process-wide logger. Fails if one is already installed.
pub fn init(cfg: &LocatorConfig) -> anyhow::Result<()> {
    builder(cfg)
        .try_init()
        .context("scopeloc: logger already installed")?;
    log::debug!(target: LOG_TARGET, "logger installed filter='{}'", cfg.log_filter);
    Ok(())
}

/// Like [`init`], for hosts that may have installed a logger already.
pub fn init_or_keep(cfg: &LocatorConfig) {
    if init(cfg).is_err() {
        log::debug!(target: LOG_TARGET, "logger already installed, keeping it");
    }
}
