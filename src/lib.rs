//! Heading-aware document chunking and retrieval utilities.
//!
//! ```text
//! Document bytes ──► extract::DocumentAnalyzer ──► TextBlock stream
//!                                                      │
//!                       segmentation::ListNormalizer ──┤
//!                                                      │
//!                  Segment stream ──► segmentation::chunk_segments
//!                                     (HeadingDetector decides the cuts)
//!                                                      │
//!                    Chunk list ──► quality::evaluate ─┴─► ChunkMetrics
//!                                                      │
//!        survivors ──► embeddings ──► stores::SearchIndex (merge upsert)
//!
//! Question ──► retrieval::RetrievalAssembler ──► ranked context strings
//! ```
//!
//! Every external capability — extraction, key phrases, embeddings, vector
//! search, metrics storage — is an injected trait, so the full pipeline runs
//! against the bundled mocks and in-memory stores without network access.

pub mod config;
pub mod embeddings;
pub mod extract;
pub mod keyphrases;
pub mod pipeline;
pub mod quality;
pub mod retrieval;
pub mod segmentation;
pub mod stores;
pub mod types;

pub use config::{HeadingRules, PipelineConfig, QualityLimits};
pub use pipeline::{BatchReport, DocumentPipeline, DocumentReport};
pub use quality::ChunkMetrics;
pub use retrieval::RetrievalAssembler;
pub use segmentation::{HeadingDetector, ListNormalizer, chunk_segments};
pub use types::{BlockKind, Chunk, ListNode, PipelineError, Segment, TextBlock};
