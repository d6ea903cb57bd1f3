// Gateway module for outbound message delivery
// Provides trait and implementations for messaging providers

pub mod whapi;

use crate::errors::SendError;
use crate::models::CandidateIdentifier;
use async_trait::async_trait;

pub use whapi::WhapiGateway;

/// MessagingGateway delivers one text message to one recipient per call
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send `body` to `to`, returning once the gateway accepted or rejected it
    async fn send(&self, to: &CandidateIdentifier, body: &str) -> Result<(), SendError>;
}
