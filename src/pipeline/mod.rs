//! Per-document processing orchestration.
//!
//! One [`DocumentPipeline`] owns the injected collaborators and runs each
//! document through the full pass: extract → filter → normalize → chunk →
//! evaluate → embed → index → record metrics. Documents are independent
//! units of work; [`DocumentPipeline::process_batch`] isolates failures so
//! one bad document never takes down its batch, and [`queue`] adds the
//! fire-and-forget trigger used by upload surfaces.

pub mod queue;

use std::path::Path;
use std::sync::Arc;

use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::embeddings::EmbeddingProvider;
use crate::extract::{DocumentAnalyzer, filter_structural_blocks, is_supported_file};
use crate::keyphrases::KeyPhraseExtractor;
use crate::quality::{self, ChunkMetrics};
use crate::segmentation::{HeadingDetector, ListNormalizer, chunk_segments};
use crate::stores::{IndexedDocument, MetricsRecord, MetricsSink, SearchIndex, UpsertOutcome};
use crate::types::PipelineError;

pub use queue::{IngestJob, IngestQueue, QueueError};

/// Outcome of one successfully processed document.
#[derive(Debug)]
pub struct DocumentReport {
    pub file_name: String,
    pub metrics: ChunkMetrics,
    /// Number of chunk records accepted by the index.
    pub indexed: usize,
    /// Upsert outcomes for records the index rejected.
    pub index_failures: Vec<UpsertOutcome>,
}

/// Outcome of a batch run; failed documents are reported, not retried.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<DocumentReport>,
    pub failed: Vec<(String, PipelineError)>,
}

/// End-to-end processing for one document class, collaborators injected.
pub struct DocumentPipeline {
    analyzer: Arc<dyn DocumentAnalyzer>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn SearchIndex>,
    metrics: Arc<dyn MetricsSink>,
    detector: HeadingDetector,
    normalizer: ListNormalizer,
    config: PipelineConfig,
}

impl DocumentPipeline {
    /// Create a new builder for constructing a `DocumentPipeline`.
    pub fn builder() -> DocumentPipelineBuilder {
        DocumentPipelineBuilder::default()
    }

    /// Runs the full pass over one document.
    ///
    /// Extraction is bounded by the configured timeout; an expiry fails the
    /// document without emitting partial chunks. Index rejections of
    /// individual records are logged and reported but do not fail the
    /// document.
    pub async fn process(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<DocumentReport, PipelineError> {
        if !is_supported_file(file_name) {
            return Err(PipelineError::UnsupportedFile(file_name.to_string()));
        }

        let extraction = timeout(
            self.config.extraction_timeout,
            self.analyzer.analyze(bytes, self.config.analyze_mode),
        )
        .await
        .map_err(|_| PipelineError::ExtractionTimeout(self.config.extraction_timeout))?
        .map_err(|err| PipelineError::Extraction(err.to_string()))?;

        let blocks = filter_structural_blocks(extraction.blocks);
        let segments = self.normalizer.normalize(&blocks);
        let chunks = chunk_segments(&segments, &self.detector).await;
        let (metrics, unique) = quality::evaluate(
            &blocks,
            chunks,
            &extraction.image_sizes,
            &self.config.limits,
        );

        if metrics.num_chunks > 0 && metrics.coverage_pct < self.config.coverage_threshold_pct {
            warn!(
                file = file_name,
                coverage = metrics.coverage_pct,
                threshold = self.config.coverage_threshold_pct,
                "chunk coverage below threshold"
            );
        }

        let stem = file_stem(file_name);
        let mut documents = Vec::with_capacity(unique.len());
        for (ordinal, chunk) in unique.iter().enumerate() {
            let content = chunk.joined_text();
            let embedding = self.embedder.embed(&content).await?;
            documents.push(IndexedDocument::new(
                format!("{stem}-{ordinal}"),
                content,
                file_name,
                embedding,
            ));
        }

        let mut indexed = 0usize;
        let mut index_failures = Vec::new();
        if !documents.is_empty() {
            for outcome in self.index.merge_upsert(documents).await? {
                if outcome.succeeded {
                    indexed += 1;
                } else {
                    warn!(
                        id = %outcome.id,
                        message = outcome.message.as_deref().unwrap_or("unknown"),
                        "chunk record rejected by index"
                    );
                    index_failures.push(outcome);
                }
            }
        }

        let record = MetricsRecord::new(file_name, bytes.len(), metrics.clone(), &self.config);
        self.metrics.upsert(record).await?;

        info!(
            file = file_name,
            chunks = metrics.num_chunks,
            indexed,
            duplicates = metrics.num_duplicates_removed,
            coverage = metrics.coverage_pct,
            "document processed"
        );

        Ok(DocumentReport {
            file_name: file_name.to_string(),
            metrics,
            indexed,
            index_failures,
        })
    }

    /// Processes a batch sequentially with per-document failure isolation.
    pub async fn process_batch(
        &self,
        documents: impl IntoIterator<Item = (String, Vec<u8>)>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for (file_name, bytes) in documents {
            match self.process(&file_name, &bytes).await {
                Ok(document) => report.succeeded.push(document),
                Err(err) => {
                    error!(file = %file_name, error = %err, "document processing failed");
                    report.failed.push((file_name, err));
                }
            }
        }
        report
    }
}

fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name)
}

/// Builder for constructing [`DocumentPipeline`] instances.
#[derive(Default)]
pub struct DocumentPipelineBuilder {
    analyzer: Option<Arc<dyn DocumentAnalyzer>>,
    key_phrases: Option<Arc<dyn KeyPhraseExtractor>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<Arc<dyn SearchIndex>>,
    metrics: Option<Arc<dyn MetricsSink>>,
    config: Option<PipelineConfig>,
}

impl DocumentPipelineBuilder {
    #[must_use]
    pub fn analyzer(mut self, analyzer: Arc<dyn DocumentAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    #[must_use]
    pub fn key_phrases(mut self, extractor: Arc<dyn KeyPhraseExtractor>) -> Self {
        self.key_phrases = Some(extractor);
        self
    }

    #[must_use]
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    #[must_use]
    pub fn index(mut self, index: Arc<dyn SearchIndex>) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Defaults to [`PipelineConfig::default`] when not set.
    #[must_use]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the [`DocumentPipeline`].
    ///
    /// # Panics
    ///
    /// Panics if any collaborator was not provided.
    pub fn build(self) -> DocumentPipeline {
        let config = self.config.unwrap_or_default();
        let key_phrases = self
            .key_phrases
            .expect("DocumentPipelineBuilder requires a key-phrase extractor");
        DocumentPipeline {
            analyzer: self
                .analyzer
                .expect("DocumentPipelineBuilder requires an analyzer"),
            embedder: self
                .embedder
                .expect("DocumentPipelineBuilder requires an embedder"),
            index: self
                .index
                .expect("DocumentPipelineBuilder requires an index"),
            metrics: self
                .metrics
                .expect("DocumentPipelineBuilder requires a metrics sink"),
            detector: HeadingDetector::new(config.heading.clone(), key_phrases),
            normalizer: ListNormalizer::new(),
            config,
        }
    }
}
