// Record source module
// Provides trait and implementations for fetching the watched records

pub mod sheets;

use crate::errors::SourceError;
use crate::models::Snapshot;
use async_trait::async_trait;

pub use sheets::SheetsRecordSource;

/// RecordSource returns the full, ordered list of records on every call
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the current snapshot
    async fn fetch(&self) -> Result<Snapshot, SourceError>;
}
