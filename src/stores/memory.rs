//! In-memory store implementations for tests and offline runs.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{
    IndexError, IndexedDocument, MetricsError, MetricsRecord, MetricsSink, ScoredDocument,
    SearchIndex, UpsertOutcome,
};

/// Cosine-ranked vector index over a process-local map.
#[derive(Default)]
pub struct InMemoryIndex {
    documents: RwLock<HashMap<String, IndexedDocument>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct lookup by record id.
    pub fn get(&self, id: &str) -> Option<IndexedDocument> {
        self.documents.read().get(id).cloned()
    }
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    async fn merge_upsert(
        &self,
        documents: Vec<IndexedDocument>,
    ) -> Result<Vec<UpsertOutcome>, IndexError> {
        let mut outcomes = Vec::with_capacity(documents.len());
        let mut guard = self.documents.write();
        for document in documents {
            if document.id.is_empty() {
                outcomes.push(UpsertOutcome::failure(
                    document.id,
                    "record id must not be empty",
                ));
                continue;
            }
            let id = document.id.clone();
            guard.insert(document.id.clone(), document);
            outcomes.push(UpsertOutcome::success(id));
        }
        Ok(outcomes)
    }

    async fn vector_search(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredDocument>, IndexError> {
        if vector.is_empty() {
            return Err(IndexError::InvalidQuery(
                "query vector must not be empty".to_string(),
            ));
        }
        let guard = self.documents.read();
        let mut scored: Vec<ScoredDocument> = guard
            .values()
            .map(|document| ScoredDocument {
                score: cosine_similarity(vector, &document.embedding),
                document: document.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.documents.read().len())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Keyed metrics map guarding the upsert contract.
#[derive(Default)]
pub struct InMemoryMetricsSink {
    records: RwLock<HashMap<(String, String), MetricsRecord>>,
}

impl InMemoryMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_type: &str, file_name: &str) -> Option<MetricsRecord> {
        self.records
            .read()
            .get(&(file_type.to_string(), file_name.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl MetricsSink for InMemoryMetricsSink {
    async fn upsert(&self, record: MetricsRecord) -> Result<(), MetricsError> {
        self.records.write().insert(record.key(), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, embedding: Vec<f32>) -> IndexedDocument {
        IndexedDocument::new(id, format!("content of {id}"), "file.pdf", embedding)
    }

    #[tokio::test]
    async fn merge_upsert_preserves_absent_records() {
        let index = InMemoryIndex::new();
        index
            .merge_upsert(vec![doc("a-0", vec![1.0, 0.0]), doc("a-1", vec![0.0, 1.0])])
            .await
            .unwrap();
        index
            .merge_upsert(vec![doc("b-0", vec![1.0, 1.0])])
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), 3);
        assert!(index.get("a-0").is_some());
        assert!(index.get("b-0").is_some());
    }

    #[tokio::test]
    async fn upsert_replaces_same_id_and_reports_per_record() {
        let index = InMemoryIndex::new();
        let outcomes = index
            .merge_upsert(vec![
                doc("a-0", vec![1.0, 0.0]),
                IndexedDocument::new("", "no id", "file.pdf", vec![1.0]),
            ])
            .await
            .unwrap();

        assert!(outcomes[0].succeeded);
        assert!(!outcomes[1].succeeded);
        assert_eq!(index.count().await.unwrap(), 1);

        let replacement = IndexedDocument::new("a-0", "new content", "file.pdf", vec![0.5, 0.5]);
        index.merge_upsert(vec![replacement]).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 1);
        assert_eq!(index.get("a-0").unwrap().content, "new content");
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_similarity() {
        let index = InMemoryIndex::new();
        index
            .merge_upsert(vec![
                doc("far", vec![0.0, 1.0]),
                doc("near", vec![1.0, 0.05]),
                doc("middle", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = index.vector_search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.id, "near");
        assert_eq!(hits[1].document.id, "middle");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn search_returns_fewer_than_k_without_error() {
        let index = InMemoryIndex::new();
        index
            .merge_upsert(vec![doc("only", vec![1.0, 0.0])])
            .await
            .unwrap();
        let hits = index.vector_search(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn empty_query_vector_is_rejected() {
        let index = InMemoryIndex::new();
        assert!(matches!(
            index.vector_search(&[], 3).await,
            Err(IndexError::InvalidQuery(_))
        ));
    }

    #[test]
    fn cosine_handles_degenerate_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
