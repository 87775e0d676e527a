use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const METRIC_CACHE_WARM_MS: &str = "lectern_cache_warm_ms";
pub const METRIC_CACHE_WARM_FAILED: &str = "lectern_cache_warm_failed_total";
pub const METRIC_CACHE_SWAP: &str = "lectern_cache_swap_total";
pub const METRIC_CACHE_HIT: &str = "lectern_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "lectern_cache_miss_total";
pub const METRIC_QUERY_MS: &str = "lectern_query_ms";
pub const METRIC_QUERY_FAILED: &str = "lectern_query_failed_total";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
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
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
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

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_histogram!(
            METRIC_CACHE_WARM_MS,
            Unit::Milliseconds,
            "Site cache warm-up latency in milliseconds."
        );
        describe_counter!(
            METRIC_CACHE_WARM_FAILED,
            Unit::Count,
            "Total number of site cache warm-ups that failed before completion."
        );
        describe_counter!(
            METRIC_CACHE_SWAP,
            Unit::Count,
            "Total number of live site caches replaced by a freshly warmed instance."
        );
        describe_counter!(
            METRIC_CACHE_HIT,
            Unit::Count,
            "Total number of site cache lookups served from the cache."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Total number of site cache lookups that found no entry."
        );
        describe_histogram!(
            METRIC_QUERY_MS,
            Unit::Milliseconds,
            "Content query latency (build, search and reshape) in milliseconds."
        );
        describe_counter!(
            METRIC_QUERY_FAILED,
            Unit::Count,
            "Total number of content queries that failed."
        );
    });
}
