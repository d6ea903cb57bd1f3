// Error handling framework

use thiserror::Error;

/// Raised when a raw contact number cannot be turned into gateway identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("The number '{raw}' must be either 10 or 11 digits long (found {digit_count})")]
pub struct InvalidNumberError {
    pub raw: String,
    pub digit_count: usize,
}

/// Messaging gateway delivery errors
#[derive(Error, Debug)]
pub enum SendError {
    #[error("Unable to send message: gateway responded with status {status}")]
    SendFailed { status: u16, body: Option<String> },

    #[error("Gateway request failed: {0}")]
    Transport(String),
}

impl SendError {
    /// Short label used for metrics and log fields
    pub fn reason(&self) -> &'static str {
        match self {
            SendError::SendFailed { .. } => "status",
            SendError::Transport(_) => "transport",
        }
    }
}

/// Record source errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Unable to create record source client: {0}")]
    Client(String),

    #[error("Record source request failed: {0}")]
    Request(String),

    #[error("Record source responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unable to decode record source response: {0}")]
    Decode(String),
}

/// Settings validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },
}

impl From<reqwest::Error> for SendError {
    fn from(err: reqwest::Error) -> Self {
        SendError::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Decode(err.to_string())
        } else {
            SourceError::Request(err.to_string())
        }
    }
}
