// Whapi text message gateway implementation

use crate::config::GatewayConfig;
use crate::errors::SendError;
use crate::gateway::MessagingGateway;
use crate::models::CandidateIdentifier;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

/// JSON payload accepted by the text message endpoint
#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    to: &'a str,
    body: &'a str,
}

/// WhapiGateway posts text messages to a Whapi-compatible endpoint
pub struct WhapiGateway {
    client: Client,
    url: String,
    api_key: String,
}

impl WhapiGateway {
    /// Create a new gateway from settings
    pub fn new(config: &GatewayConfig) -> Result<Self, SendError> {
        let mut builder = Client::builder();
        if let Some(timeout_seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout_seconds));
        }

        let client = builder
            .build()
            .map_err(|e| SendError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, &config.url, &config.api_key))
    }

    /// Create a gateway around an existing HTTP client
    pub fn with_client(client: Client, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    fn is_accepted(status: StatusCode) -> bool {
        status == StatusCode::OK || status == StatusCode::CREATED
    }
}

#[async_trait]
impl MessagingGateway for WhapiGateway {
    #[tracing::instrument(skip(self, to, body), fields(to = %to))]
    async fn send(&self, to: &CandidateIdentifier, body: &str) -> Result<(), SendError> {
        let payload = TextMessage {
            to: to.as_str(),
            body,
        };

        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if Self::is_accepted(status) {
            tracing::debug!(status = status.as_u16(), "Gateway accepted message");
            return Ok(());
        }

        // Only read the body when its length is announced up front
        let body = match response.content_length() {
            Some(_) => Some(response.text().await?),
            None => None,
        };

        tracing::warn!(
            status = status.as_u16(),
            response_body = body.as_deref().unwrap_or(""),
            "Unable to send message"
        );

        Err(SendError::SendFailed {
            status: status.as_u16(),
            body,
        })
    }
}
