// Scheduler engine implementation

use crate::composer::compose;
use crate::config::InvalidNumberPolicy;
use crate::differ::diff;
use crate::dispatcher::Dispatcher;
use crate::models::Snapshot;
use crate::normalizer::normalize;
use crate::source::RecordSource;
use crate::telemetry;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Configuration for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Pause between the end of one cycle and the start of the next (in seconds)
    pub poll_interval_seconds: u64,
    /// Reaction to an agent number that cannot be normalized
    pub invalid_number_policy: InvalidNumberPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 120,
            invalid_number_policy: InvalidNumberPolicy::AbortCycle,
        }
    }
}

impl From<&crate::config::SchedulerConfig> for SchedulerConfig {
    fn from(settings: &crate::config::SchedulerConfig) -> Self {
        Self {
            poll_interval_seconds: settings.poll_interval_seconds,
            invalid_number_policy: settings.invalid_number_policy,
        }
    }
}

/// Outcome of one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Records returned by the source (zero when the fetch failed)
    pub fetched: usize,
    /// Records detected as new against the previous snapshot
    pub new_records: usize,
    /// New records whose message reached every candidate
    pub notified: usize,
    /// New records whose dispatch stopped on a gateway failure
    pub dispatch_failures: usize,
    /// New records whose agent number was rejected
    pub invalid_numbers: usize,
    /// True when an invalid number stopped the remaining records
    pub aborted: bool,
    /// True when the source fetch failed and an empty snapshot was used
    pub source_failed: bool,
}

/// Scheduler trait for the polling loop
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Start the polling loop; returns after `stop` is called
    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Stop the polling loop between cycles
    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Run a single fetch, diff, notify and replace cycle
    async fn run_cycle(&self) -> CycleReport;
}

/// Main scheduler engine implementation
pub struct SchedulerEngine {
    config: SchedulerConfig,
    source: Arc<dyn RecordSource>,
    dispatcher: Dispatcher,
    previous: Mutex<Snapshot>,
    shutdown_tx: watch::Sender<bool>,
}

impl SchedulerEngine {
    /// Create a new scheduler engine with an empty previous snapshot
    pub fn new(
        config: SchedulerConfig,
        source: Arc<dyn RecordSource>,
        dispatcher: Dispatcher,
    ) -> Self {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);

        Self {
            config,
            source,
            dispatcher,
            previous: Mutex::new(Snapshot::default()),
            shutdown_tx,
        }
    }

    /// Get a shutdown flag receiver; the flag stays set once `stop` is called
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Copy of the snapshot the next cycle will compare against
    pub async fn previous_snapshot(&self) -> Snapshot {
        self.previous.lock().await.clone()
    }

    async fn fetch_current(&self, report: &mut CycleReport) -> Snapshot {
        match self.source.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                telemetry::record_source_failure();
                error!(error = %e, "Unable to retrieve data from record source");
                report.source_failed = true;
                Snapshot::default()
            }
        }
    }
}

#[async_trait]
impl Scheduler for SchedulerEngine {
    #[instrument(skip(self))]
    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(
            poll_interval_seconds = self.config.poll_interval_seconds,
            invalid_number_policy = ?self.config.invalid_number_policy,
            "Starting scheduler engine"
        );

        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds);
        let mut shutdown_rx = self.shutdown_receiver();

        loop {
            if *shutdown_rx.borrow_and_update() {
                info!("Shutdown requested, stopping scheduler");
                break;
            }

            let report = self.run_cycle().await;
            if report.new_records > 0 {
                info!(?report, "Cycle finished");
            } else {
                debug!(?report, "Cycle finished with no new records");
            }

            tokio::select! {
                _ = sleep(poll_interval) => {}
                _ = shutdown_rx.changed() => {}
            }
        }

        info!("Scheduler engine stopped");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Stopping scheduler engine");
        self.shutdown_tx.send_replace(true);
        Ok(())
    }

    #[instrument(skip(self), fields(cycle_id = %Uuid::new_v4()))]
    async fn run_cycle(&self) -> CycleReport {
        let started = Instant::now();
        // Held for the whole cycle so cycles never interleave
        let mut previous = self.previous.lock().await;
        let mut report = CycleReport::default();

        let current = self.fetch_current(&mut report).await;
        report.fetched = current.len();

        let new_records = diff(&previous, &current);
        report.new_records = new_records.len();
        debug!(
            fetched = report.fetched,
            new_records = report.new_records,
            "Compared snapshots"
        );

        for record in &new_records {
            let candidates = match normalize(&record.agent_number) {
                Ok(candidates) => candidates,
                Err(e) => {
                    telemetry::record_invalid_number();
                    report.invalid_numbers += 1;
                    match self.config.invalid_number_policy {
                        InvalidNumberPolicy::AbortCycle => {
                            warn!(
                                name = %record.name,
                                error = %e,
                                "Invalid agent number, skipping remaining new records"
                            );
                            report.aborted = true;
                            break;
                        }
                        InvalidNumberPolicy::SkipRecord => {
                            warn!(
                                name = %record.name,
                                error = %e,
                                "Invalid agent number, skipping record"
                            );
                            continue;
                        }
                    }
                }
            };

            let message = compose(&record.name, &record.address);
            match self.dispatcher.dispatch(&candidates, &message).await {
                Ok(()) => report.notified += 1,
                Err(e) => {
                    report.dispatch_failures += 1;
                    error!(name = %record.name, error = %e, "Unable to notify agent");
                }
            }
        }

        *previous = current;

        telemetry::record_cycle(
            report.new_records,
            report.fetched,
            started.elapsed().as_secs_f64(),
        );

        report
    }
}
