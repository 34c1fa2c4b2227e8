//! Subscriber installation.

use super::tracer;
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::resource::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Name of the trace file inside the data directory.
pub const TRACE_FILE_NAME: &str = "equilink-admin-otlp.json";

const SERVICE_NAME: &str = "equilink-admin";

fn filter_for(config: &Config) -> EnvFilter {
    match config.trace_level.as_deref() {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

/// Installs the global subscriber with file-based OTLP export.
///
/// Spans go to [`TRACE_FILE_NAME`] under [`Config::data_dir`]. Tracing is
/// best-effort: if that directory cannot be created the
/// dashboard runs without it. Only the first call in a process installs a
/// subscriber; later calls are no-ops.
///
/// ```no_run
/// use equilink_admin::observability::init_tracing;
/// use equilink_admin::Config;
///
/// let config = Config {
///     trace_level: Some("equilink_admin=debug".to_string()),
///     ..Default::default()
/// };
/// init_tracing(&config);
/// ```
pub fn init_tracing(config: &Config) {
    let data_dir = config.data_dir();
    if std::fs::create_dir_all(&data_dir).is_err() {
        return;
    }

    let resource = Resource::new(vec![
        KeyValue::new("service.name", SERVICE_NAME),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);
    let provider = tracer::create_tracer_provider(data_dir.join(TRACE_FILE_NAME), resource);
    let otel_layer = OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME));

    let _ = tracing_subscriber::registry()
        .with(filter_for(config))
        .with(otel_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_wins() {
        let config = Config {
            trace_level: Some("debug".to_string()),
            ..Config::default()
        };
        assert_eq!(filter_for(&config).to_string(), "debug");
    }

    #[test]
    fn invalid_level_falls_back_to_info() {
        let config = Config {
            trace_level: Some("equilink_admin=loud".to_string()),
            ..Config::default()
        };
        assert_eq!(filter_for(&config).to_string(), "info");
    }
}
