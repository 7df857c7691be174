//! Storage seams for indexed chunks and document metrics.
//!
//! ```text
//!                  ┌──────────────────┐   ┌──────────────────┐
//!                  │ SearchIndex trait│   │ MetricsSink trait│
//!                  │ (merge upsert +  │   │ (keyed upsert)   │
//!                  │  vector search)  │   └────────┬─────────┘
//!                  └────────┬─────────┘            │
//!                           │               ┌──────┴──────┐
//!                           ▼               ▼             ▼
//!                    ┌─────────────┐ ┌─────────────┐ ┌─────────┐
//!                    │ InMemory    │ │ InMemory    │ │ JSONL   │
//!                    │ Index       │ │ MetricsSink │ │ file    │
//!                    └─────────────┘ └─────────────┘ └─────────┘
//! ```
//!
//! Production deployments put a hosted vector index behind [`SearchIndex`];
//! the bundled in-memory implementations keep the pipeline fully testable
//! offline.

pub mod jsonl;
pub mod memory;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::quality::ChunkMetrics;

pub use jsonl::JsonlMetricsSink;
pub use memory::{InMemoryIndex, InMemoryMetricsSink};

/// One surviving chunk, embedded and ready for indexing.
///
/// Ids are `"{file stem}-{ordinal}"`, so re-processing a document upserts
/// the same records instead of accumulating new ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: String,
    pub content: String,
    pub file_name: String,
    pub embedding: Vec<f32>,
}

impl IndexedDocument {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        file_name: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            file_name: file_name.into(),
            embedding,
        }
    }
}

/// A search hit with its relevance score, most similar first.
#[derive(Clone, Debug)]
pub struct ScoredDocument {
    pub document: IndexedDocument,
    pub score: f32,
}

/// Per-record result of a merge upsert.
#[derive(Clone, Debug)]
pub struct UpsertOutcome {
    pub id: String,
    pub succeeded: bool,
    pub message: Option<String>,
}

impl UpsertOutcome {
    pub fn success(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            succeeded: true,
            message: None,
        }
    }

    pub fn failure(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            succeeded: false,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("search index unavailable: {0}")]
    Unavailable(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Vector search index collaborator.
///
/// Upserts merge: records already present but absent from the current batch
/// are preserved, and an id-collision within or across batches replaces the
/// previous record. Record failures are reported individually; one bad
/// record never rolls back its batch siblings.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn merge_upsert(
        &self,
        documents: Vec<IndexedDocument>,
    ) -> Result<Vec<UpsertOutcome>, IndexError>;

    /// Returns up to `k` documents ranked most-similar-first. Fewer than `k`
    /// results is not an error.
    async fn vector_search(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredDocument>, IndexError>;

    async fn count(&self) -> Result<usize, IndexError>;
}

/// Persisted metrics envelope for one processed document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub file_name: String,
    pub file_type: String,
    pub original_size_bytes: usize,
    #[serde(flatten)]
    pub metrics: ChunkMetrics,
    pub slow: bool,
    pub processed_at: DateTime<Utc>,
}

impl MetricsRecord {
    /// Builds the envelope, deriving the file type from the extension and
    /// the slow flag from the configured threshold.
    pub fn new(
        file_name: impl Into<String>,
        original_size_bytes: usize,
        metrics: ChunkMetrics,
        config: &PipelineConfig,
    ) -> Self {
        let file_name = file_name.into();
        let file_type = Path::new(&file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let slow = metrics.processing_time_s > config.slow_threshold.as_secs_f64();
        Self {
            file_name,
            file_type,
            original_size_bytes,
            metrics,
            slow,
            processed_at: Utc::now(),
        }
    }

    /// Upsert key: records sharing it overwrite each other.
    pub fn key(&self) -> (String, String) {
        (self.file_type.clone(), self.file_name.clone())
    }
}

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metrics sink failed: {0}")]
    Sink(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("metrics serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Metrics storage collaborator, idempotent by [`MetricsRecord::key`].
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn upsert(&self, record: MetricsRecord) -> Result<(), MetricsError>;
}
