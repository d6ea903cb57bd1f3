// Bootstrap utilities for binary initialization

use crate::config::Settings;
use crate::dispatcher::Dispatcher;
use crate::gateway::{MessagingGateway, WhapiGateway};
use crate::scheduler::{SchedulerConfig, SchedulerEngine};
use crate::source::{RecordSource, SheetsRecordSource};
use crate::telemetry;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Initialize logging and, when a port is configured, the metrics exporter
pub fn init_telemetry(settings: &Settings) -> Result<()> {
    telemetry::init_logging(&settings.observability.log_level)
        .context("Failed to initialize logging")?;

    if let Some(port) = settings.observability.metrics_port {
        telemetry::init_metrics(port).context("Failed to initialize metrics exporter")?;
    }

    Ok(())
}

/// Initialize the spreadsheet record source
///
/// # Errors
/// Returns error if the client cannot be created; the process must not start
#[tracing::instrument(skip(settings))]
pub fn init_record_source(settings: &Settings) -> Result<Arc<dyn RecordSource>> {
    info!("Initializing Google Sheets record source");

    let source = SheetsRecordSource::new(&settings.source)
        .context("Unable to start Google Sheets record source")?;

    info!(
        spreadsheet_id = %settings.source.spreadsheet_id,
        range = %settings.source.range,
        "Record source initialized"
    );
    Ok(Arc::new(source))
}

/// Initialize the messaging gateway
///
/// # Errors
/// Returns error if the HTTP client cannot be created
#[tracing::instrument(skip(settings))]
pub fn init_gateway(settings: &Settings) -> Result<Arc<dyn MessagingGateway>> {
    info!("Initializing messaging gateway");

    let gateway =
        WhapiGateway::new(&settings.gateway).context("Failed to initialize messaging gateway")?;

    info!(url = %settings.gateway.url, "Messaging gateway initialized");
    Ok(Arc::new(gateway))
}

/// Wire source, gateway and scheduler settings into an engine
pub fn init_scheduler(settings: &Settings) -> Result<SchedulerEngine> {
    let source = init_record_source(settings)?;
    let gateway = init_gateway(settings)?;

    Ok(SchedulerEngine::new(
        SchedulerConfig::from(&settings.scheduler),
        source,
        Dispatcher::new(gateway),
    ))
}
