//! Structured logging
//!
//! Alarms raised for answered API errors are emitted on the `orz_alarm`
//! target, so a deployment can route them separately, e.g.
//! `RUST_LOG`-style filters like `info,orz_alarm=error`.

use tracing_subscriber::EnvFilter;

use crate::{
    config::Config,
    error::{Error, Result},
};

/// Install a JSON subscriber filtered by `service.log_level`
///
/// Fails when a global subscriber is already installed.
pub fn init_tracing(config: &Config) -> Result<()> {
    let log_level = &config.service.log_level;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {e}")))?;

    tracing::info!(
        service = config.service_name(),
        environment = %config.service.environment,
        "Tracing initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails_without_panicking() {
        let config = Config::default();
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
