// Telemetry module for structured logging and metrics

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize structured logging with JSON formatting
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(
        log_level = log_level,
        "Structured logging initialized with JSON formatting"
    );

    Ok(())
}

/// Initialize Prometheus metrics exporter and describe the notifier metrics
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_counter!(
        "notification_sent_total",
        "Total number of messages accepted by the gateway"
    );
    describe_counter!(
        "notification_failed_total",
        "Total number of messages the gateway rejected or never received"
    );
    describe_counter!(
        "invalid_number_total",
        "Total number of agent numbers that could not be normalized"
    );
    describe_counter!(
        "new_records_total",
        "Total number of records detected as new"
    );
    describe_counter!(
        "source_fetch_failed_total",
        "Total number of failed record source fetches"
    );
    describe_histogram!(
        "cycle_duration_seconds",
        "Duration of one poll cycle in seconds"
    );
    describe_gauge!("snapshot_size", "Number of records in the latest snapshot");

    tracing::info!(
        metrics_port = metrics_port,
        metrics_endpoint = format!("http://0.0.0.0:{}/metrics", metrics_port),
        "Prometheus metrics exporter initialized"
    );

    Ok(())
}

#[inline]
pub fn record_notification_sent() {
    counter!("notification_sent_total").increment(1);
}

#[inline]
pub fn record_notification_failure(reason: &str) {
    counter!("notification_failed_total", "reason" => reason.to_string()).increment(1);
}

#[inline]
pub fn record_invalid_number() {
    counter!("invalid_number_total").increment(1);
}

#[inline]
pub fn record_source_failure() {
    counter!("source_fetch_failed_total").increment(1);
}

/// Record the outcome of a finished cycle
#[inline]
pub fn record_cycle(new_records: usize, snapshot_size: usize, duration_seconds: f64) {
    counter!("new_records_total").increment(new_records as u64);
    gauge!("snapshot_size").set(snapshot_size as f64);
    histogram!("cycle_duration_seconds").record(duration_seconds);
}
