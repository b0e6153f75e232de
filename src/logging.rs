//! Log subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies
//! (`debug` when debug mode is on).

use tracing_subscriber::EnvFilter;

use crate::config::Config;

pub fn init_logging(config: &Config) {
    let level = if config.debug {
        "debug"
    } else {
        config.log_level.as_str()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A subscriber may already be installed by an embedder or another test
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
