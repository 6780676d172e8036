//! Mock list source for testing without network calls.

use super::{DataSourceError, ListSource};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock source that returns a predefined payload or error.
#[derive(Debug, Default)]
pub struct MockListSource {
    records: Vec<serde_json::Value>,
    error: Option<DataSourceError>,
    calls: AtomicUsize,
}

impl MockListSource {
    /// Create a new mock source with an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to the payload.
    pub fn with_record(mut self, record: serde_json::Value) -> Self {
        self.records.push(record);
        self
    }

    /// Add multiple records to the payload.
    pub fn with_records(mut self, records: Vec<serde_json::Value>) -> Self {
        self.records.extend(records);
        self
    }

    /// Make every fetch fail with `error`.
    pub fn with_error(mut self, error: DataSourceError) -> Self {
        self.error = Some(error);
        self
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListSource for MockListSource {
    async fn fetch_list(&self) -> Result<Vec<serde_json::Value>, DataSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.records.clone()),
        }
    }
}
