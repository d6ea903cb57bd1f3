// Notifier binary entry point

use anyhow::Context;
use common::bootstrap;
use common::config::Settings;
use common::scheduler::Scheduler;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;

    bootstrap::init_telemetry(&settings)?;

    info!("Starting missed-appointment notifier");

    if let Err(e) = settings.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e).context("Invalid configuration");
    }

    info!(
        gateway_url = %settings.gateway.url,
        spreadsheet_id = %settings.source.spreadsheet_id,
        poll_interval_seconds = settings.scheduler.poll_interval_seconds,
        "Configuration loaded"
    );

    // Failing to build the record source is the only fatal startup condition
    let scheduler = Arc::new(bootstrap::init_scheduler(&settings).map_err(|e| {
        error!(error = %e, "Failed to initialize scheduler");
        e
    })?);

    let scheduler_for_shutdown = scheduler.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }
        info!("Received Ctrl+C signal, initiating graceful shutdown");
        if let Err(e) = scheduler_for_shutdown.stop().await {
            error!(error = %e, "Error during scheduler shutdown");
        }
    });

    info!("Starting scheduler polling loop");
    if let Err(e) = scheduler.start().await {
        error!(error = %e, "Scheduler error");
        return Err(anyhow::anyhow!(e));
    }

    info!("Notifier stopped");
    Ok(())
}
