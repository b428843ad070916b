use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::{
    METRIC_BACKEND_ERROR_TOTAL, METRIC_DRAIN_MS, METRIC_GROUP_FLUSH_TOTAL, METRIC_KEY_DELETE_TOTAL,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every metric the engine emits. Runs once.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_histogram!(
            METRIC_DRAIN_MS,
            Unit::Milliseconds,
            "Flush queue drain latency in milliseconds."
        );
        describe_counter!(
            METRIC_KEY_DELETE_TOTAL,
            Unit::Count,
            "Total number of physical page keys deleted."
        );
        describe_counter!(
            METRIC_GROUP_FLUSH_TOTAL,
            Unit::Count,
            "Total number of whole-group flushes."
        );
        describe_counter!(
            METRIC_BACKEND_ERROR_TOTAL,
            Unit::Count,
            "Total number of failed cache backend calls."
        );
    });
}
