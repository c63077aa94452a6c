//! Subscriber initialisation plus span and event helpers.

pub mod events;
pub mod spans;

use levy_core::config::ObservabilityConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted before `ObservabilityConfig::log_level`.
pub const LOG_ENV: &str = "LEVY_LOG";

/// Install the global subscriber.
///
/// `LEVY_LOG` wins over the configured level. Returns `false` when a global
/// subscriber is already installed (common in tests), which is not an error.
pub fn init_tracing(config: &ObservabilityConfig) -> bool {
    let filter = build_filter(config);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if config.json {
        builder
            .with_file(true)
            .with_line_number(true)
            .json()
            .try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}

/// Filter from `LEVY_LOG`, else the configured level, else `info`.
pub fn build_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_subscriber() {
        let cfg = ObservabilityConfig::default();
        let _ = init_tracing(&cfg);
        assert!(!init_tracing(&cfg));
    }
}
