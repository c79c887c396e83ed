use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter,
    filter::Directive,
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Driver crates that are chatty at `info`; kept at `warn` unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: &[&str] = &["sqlx=warn", "redis=warn", "hyper=warn"];

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let mut env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        for target in QUIET_TARGETS {
            if let Ok(directive) = target.parse::<Directive>() {
                env_filter = env_filter.add_directive(directive);
            }
        }
    }

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

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "itemdir_cache_hit_total",
            Unit::Count,
            "Total number of cache hits, labelled by lookup kind."
        );
        describe_counter!(
            "itemdir_cache_miss_total",
            Unit::Count,
            "Total number of cache misses, labelled by lookup kind."
        );
        describe_counter!(
            "itemdir_cache_evict_total",
            Unit::Count,
            "Total number of in-process cache evictions due to capacity."
        );
        describe_counter!(
            "itemdir_invalidation_keys_total",
            Unit::Count,
            "Total number of cache keys submitted to invalidation sweeps."
        );
        describe_counter!(
            "itemdir_invalidation_failures_total",
            Unit::Count,
            "Total number of cache keys whose purge failed."
        );
        describe_histogram!(
            "itemdir_http_request_ms",
            Unit::Milliseconds,
            "HTTP request latency in milliseconds, labelled by method and status class."
        );
        describe_histogram!(
            "itemdir_invalidation_ms",
            Unit::Milliseconds,
            "Invalidation sweep latency in milliseconds."
        );
    });
}
