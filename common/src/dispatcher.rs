// Sequential message dispatch across candidate identifiers

use crate::errors::SendError;
use crate::gateway::MessagingGateway;
use crate::models::CandidateIdentifier;
use crate::telemetry;
use std::sync::Arc;
use tracing::{info, warn};

/// Dispatcher sends one message to every candidate of a record, in order
#[derive(Clone)]
pub struct Dispatcher {
    gateway: Arc<dyn MessagingGateway>,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn MessagingGateway>) -> Self {
        Self { gateway }
    }

    /// Send `message` to each candidate sequentially.
    ///
    /// The first failure is returned at once; later candidates are not attempted.
    pub async fn dispatch(
        &self,
        candidates: &[CandidateIdentifier],
        message: &str,
    ) -> Result<(), SendError> {
        for (position, candidate) in candidates.iter().enumerate() {
            match self.gateway.send(candidate, message).await {
                Ok(()) => {
                    telemetry::record_notification_sent();
                    info!(to = %candidate, position, "Message sent");
                }
                Err(e) => {
                    telemetry::record_notification_failure(e.reason());
                    warn!(
                        to = %candidate,
                        position,
                        skipped = candidates.len() - position - 1,
                        error = %e,
                        "Message delivery failed, remaining candidates skipped"
                    );
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}
