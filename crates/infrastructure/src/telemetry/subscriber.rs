//! Subscriber construction

use tracing::info;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Keeps a scoped subscriber installed while alive
///
/// Guards from [`init_telemetry`] hold nothing; the global subscriber lives
/// for the rest of the process. Guards from [`init_scoped_telemetry`]
/// restore the previous thread-local subscriber on drop.
pub struct TelemetryGuard {
    scoped: Option<DefaultGuard>,
}

impl std::fmt::Debug for TelemetryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryGuard")
            .field("scoped", &self.scoped.is_some())
            .finish_non_exhaustive()
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` overrides `config.filter` when set. Fails if a global
/// subscriber is already installed or the filter does not parse.
pub fn init_telemetry(config: &LoggingConfig) -> Result<TelemetryGuard, TelemetryError> {
    build_subscriber(config)?
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    info!(json = config.json, "Telemetry initialized");
    Ok(TelemetryGuard { scoped: None })
}

/// Install a subscriber for the current thread only
pub fn init_scoped_telemetry(config: &LoggingConfig) -> Result<TelemetryGuard, TelemetryError> {
    let scoped = tracing::subscriber::set_default(build_subscriber(config)?);
    Ok(TelemetryGuard {
        scoped: Some(scoped),
    })
}

fn build_subscriber(
    config: &LoggingConfig,
) -> Result<impl tracing::Subscriber + Send + Sync + 'static, TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| parse_filter(&config.filter))?;

    let (json_layer, text_layer) = if config.json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_writer(std::io::stderr);
        (Some(layer), None)
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr);
        (None, Some(layer))
    };

    Ok(tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer))
}

fn parse_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::Filter {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}

/// Error type for telemetry initialization
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to initialize tracing subscriber
    #[error("Failed to initialize tracing: {0}")]
    Init(String),

    /// The configured filter directive does not parse
    #[error("Invalid log filter '{directive}': {reason}")]
    Filter { directive: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        assert!(parse_filter(&LoggingConfig::default().filter).is_ok());
    }

    #[test]
    fn bad_level_is_rejected() {
        let err = parse_filter("hazardlens=loud").unwrap_err();
        assert!(matches!(err, TelemetryError::Filter { .. }));
        assert!(err.to_string().contains("hazardlens=loud"));
    }

    #[test]
    fn scoped_text_subscriber_installs() {
        let guard = init_scoped_telemetry(&LoggingConfig::default()).unwrap();
        tracing::info!("scoped text logging");
        assert!(format!("{guard:?}").contains("scoped: true"));
    }

    #[test]
    fn scoped_json_subscriber_installs() {
        let config = LoggingConfig {
            json: true,
            ..LoggingConfig::default()
        };
        let _guard = init_scoped_telemetry(&config).unwrap();
        tracing::info!(backend = "cpu", "scoped json logging");
    }
}
