use std::{io, sync::Once};

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::counters::{
    RELATION_CACHE_ERROR_TOTAL, RELATION_CACHE_EVICT_TOTAL, RELATION_CACHE_HIT_TOTAL,
    RELATION_CACHE_MISS_TOTAL,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Events go to stderr; stdout carries command output only.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .with_writer(io::stderr)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_writer(io::stderr)
            .compact()
            .with_target(true)
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

/// Register descriptions for the relation cache counters.
///
/// Safe to call more than once; only the first call registers.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            RELATION_CACHE_HIT_TOTAL,
            Unit::Count,
            "Existence checks answered by the relation cache."
        );
        describe_counter!(
            RELATION_CACHE_MISS_TOTAL,
            Unit::Count,
            "Existence checks that fell through to the store."
        );
        describe_counter!(
            RELATION_CACHE_ERROR_TOTAL,
            Unit::Count,
            "Relation cache operations that failed and were absorbed."
        );
        describe_counter!(
            RELATION_CACHE_EVICT_TOTAL,
            Unit::Count,
            "Relation cache entries evicted due to capacity."
        );
    });
}
