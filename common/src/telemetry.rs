// Telemetry: structured logging, metrics, and tracing

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const SERVICE_NAME: &str = "content-publisher";

/// Initialize JSON logging, optionally exporting spans over OTLP.
///
/// `RUST_LOG` takes precedence over `log_level` when set.
pub fn init_logging(log_level: &str, tracing_endpoint: Option<&str>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_filter(env_filter);

    let registry = tracing_subscriber::registry().with(json_layer);

    if let Some(endpoint) = tracing_endpoint {
        let tracer = init_tracer(endpoint)?;
        registry
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    } else {
        registry
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    }

    tracing::info!(log_level, tracing_endpoint, "Logging initialized");
    Ok(())
}

fn init_tracer(endpoint: &str) -> Result<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry_sdk::runtime::Tokio;

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .build_span_exporter()
        .map_err(|e| anyhow::anyhow!("Failed to build span exporter: {}", e))?;

    let tracer_provider = TracerProvider::builder()
        .with_batch_exporter(exporter, Tokio)
        .with_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(Resource::new(vec![
                    KeyValue::new("service.name", SERVICE_NAME),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                ])),
        )
        .build();

    global::set_tracer_provider(tracer_provider.clone());
    Ok(tracer_provider.tracer(SERVICE_NAME))
}

/// Flush remaining spans; call on graceful shutdown
pub fn shutdown_tracer() {
    global::shutdown_tracer_provider();
}

/// Install the Prometheus exporter and describe the publisher metrics
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_counter!(
        "content_published_total",
        "Content items moved from scheduled to published"
    );
    describe_counter!(
        "content_skipped_total",
        "Candidates skipped because they changed after the scan"
    );
    describe_counter!(
        "content_publish_errors_total",
        "Candidates whose publish transition failed"
    );
    describe_counter!(
        "publish_cycles_total",
        "Publication cycles by trigger and outcome"
    );
    describe_histogram!(
        "publish_cycle_duration_seconds",
        "Duration of scan and publish cycles in seconds"
    );
    describe_gauge!(
        "overdue_candidates",
        "Overdue candidates selected by the most recent scan"
    );

    tracing::info!(metrics_port, "Prometheus metrics exporter initialized");
    Ok(())
}

#[inline]
pub fn record_published(content_type: &str) {
    counter!("content_published_total", "content_type" => content_type.to_string()).increment(1);
}

#[inline]
pub fn record_skipped() {
    counter!("content_skipped_total").increment(1);
}

#[inline]
pub fn record_publish_error(reason: &str) {
    counter!("content_publish_errors_total", "reason" => reason.to_string()).increment(1);
}

/// Count a finished cycle and record how long it took
#[inline]
pub fn record_cycle(trigger: &'static str, outcome: &'static str, duration_seconds: f64) {
    counter!("publish_cycles_total", "trigger" => trigger, "outcome" => outcome).increment(1);
    histogram!("publish_cycle_duration_seconds", "trigger" => trigger).record(duration_seconds);
}

#[inline]
pub fn set_overdue_candidates(count: usize) {
    gauge!("overdue_candidates").set(count as f64);
}
