//! File-backed metrics sink, one JSON record per line.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use super::{MetricsError, MetricsRecord, MetricsSink};

/// Metrics sink persisting to a JSON-lines file.
///
/// State is keyed like the trait demands, and every upsert rewrites the
/// whole file, so re-processing a document replaces its line instead of
/// appending a duplicate.
pub struct JsonlMetricsSink {
    path: PathBuf,
    state: Mutex<HashMap<(String, String), MetricsRecord>>,
}

impl JsonlMetricsSink {
    /// Creates a sink persisting to the provided path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Path the sink writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads previously persisted records, if any.
    pub async fn load(&self) -> Result<(), MetricsError> {
        if !self.path.exists() {
            return Ok(());
        }
        let data = fs::read_to_string(&self.path).await?;
        let mut guard = self.state.lock().await;
        guard.clear();
        for line in data.lines().filter(|line| !line.trim().is_empty()) {
            let record: MetricsRecord = serde_json::from_str(line)?;
            guard.insert(record.key(), record);
        }
        Ok(())
    }
}

#[async_trait]
impl MetricsSink for JsonlMetricsSink {
    async fn upsert(&self, record: MetricsRecord) -> Result<(), MetricsError> {
        let mut guard = self.state.lock().await;
        guard.insert(record.key(), record);

        let mut lines = Vec::with_capacity(guard.len());
        for record in guard.values() {
            lines.push(serde_json::to_string(record)?);
        }
        drop(guard);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.path, lines.join("\n")).await?;
        Ok(())
    }
}
