//! Chunk deduplication and quality metrics.

use std::hash::{Hash, Hasher};
use std::time::Instant;

use rustc_hash::{FxHashSet, FxHasher};
use serde::{Deserialize, Serialize};

use crate::config::QualityLimits;
use crate::types::{Chunk, TextBlock};

/// Aggregate quality statistics for one processed document.
///
/// Computed once per document over the deduplicated chunk set; never
/// mutated afterwards. All averages and extrema are 0 for empty inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetrics {
    pub num_chunks: usize,
    pub chunk_size_avg: f64,
    pub chunk_size_min: usize,
    pub chunk_size_max: usize,
    /// Share of the original extracted text retained across surviving
    /// chunks, in percent. Reported unclamped: joining artifacts can push
    /// it slightly past 100 (observed up to ~110 on noisy OCR input).
    pub coverage_pct: f64,
    pub num_duplicates_removed: usize,
    pub num_chunks_too_small: usize,
    pub num_chunks_too_large: usize,
    pub num_images_generated: usize,
    pub avg_image_size_bytes: f64,
    pub processing_time_s: f64,
}

/// Deduplicates chunks and derives [`ChunkMetrics`] over the survivors.
///
/// The dedup key is the hashed leading prefix of the space-joined paragraph
/// text; the first occurrence in document order wins and relative order is
/// preserved. Chunk size is the character length of the joined text;
/// coverage relates surviving size to the character length of all original
/// extracted blocks. Pure computation: degenerate inputs (no blocks, no
/// chunks, everything duplicated) produce zeroed metrics, never an error.
pub fn evaluate(
    blocks: &[TextBlock],
    chunks: Vec<Chunk>,
    image_sizes: &[usize],
    limits: &QualityLimits,
) -> (ChunkMetrics, Vec<Chunk>) {
    let started = Instant::now();

    let total_len: usize = blocks
        .iter()
        .map(|block| block.content.chars().count())
        .sum();

    let mut seen: FxHashSet<u64> = FxHashSet::default();
    let mut duplicates = 0usize;
    let mut unique = Vec::new();
    for chunk in chunks {
        if chunk.paragraphs.is_empty() {
            continue;
        }
        let key: String = chunk
            .joined_text()
            .chars()
            .take(limits.dedup_prefix_chars)
            .collect();
        if !seen.insert(hash_key(&key)) {
            duplicates += 1;
            continue;
        }
        unique.push(chunk);
    }

    let sizes: Vec<usize> = unique.iter().map(Chunk::char_len).collect();
    let total_chunk_len: usize = sizes.iter().sum();

    let metrics = ChunkMetrics {
        num_chunks: sizes.len(),
        chunk_size_avg: if sizes.is_empty() {
            0.0
        } else {
            total_chunk_len as f64 / sizes.len() as f64
        },
        chunk_size_min: sizes.iter().copied().min().unwrap_or(0),
        chunk_size_max: sizes.iter().copied().max().unwrap_or(0),
        coverage_pct: if total_len == 0 {
            0.0
        } else {
            total_chunk_len as f64 / total_len as f64 * 100.0
        },
        num_duplicates_removed: duplicates,
        num_chunks_too_small: sizes.iter().filter(|&&s| s < limits.min_chunk_size).count(),
        num_chunks_too_large: sizes.iter().filter(|&&s| s > limits.max_chunk_size).count(),
        num_images_generated: image_sizes.len(),
        avg_image_size_bytes: if image_sizes.is_empty() {
            0.0
        } else {
            image_sizes.iter().sum::<usize>() as f64 / image_sizes.len() as f64
        },
        processing_time_s: started.elapsed().as_secs_f64(),
    };

    (metrics, unique)
}

fn hash_key(key: &str) -> u64 {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> QualityLimits {
        QualityLimits {
            min_chunk_size: 10,
            max_chunk_size: 40,
            dedup_prefix_chars: 100,
        }
    }

    fn chunk(paragraphs: &[&str]) -> Chunk {
        Chunk {
            heading: Some("h".into()),
            paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn source_blocks(contents: &[&str]) -> Vec<TextBlock> {
        contents
            .iter()
            .map(|content| TextBlock::paragraph(*content, 1))
            .collect()
    }

    #[test]
    fn empty_inputs_yield_zeroed_metrics() {
        let (metrics, unique) = evaluate(&[], vec![], &[], &limits());
        assert_eq!(metrics.num_chunks, 0);
        assert_eq!(metrics.chunk_size_avg, 0.0);
        assert_eq!(metrics.chunk_size_min, 0);
        assert_eq!(metrics.chunk_size_max, 0);
        assert_eq!(metrics.coverage_pct, 0.0);
        assert_eq!(metrics.avg_image_size_bytes, 0.0);
        assert!(unique.is_empty());
    }

    #[test]
    fn duplicate_prefix_keeps_first_occurrence() {
        let shared = "x".repeat(100);
        let chunks = vec![
            chunk(&[&format!("{shared}tail-one")]),
            chunk(&["completely different text"]),
            chunk(&[&format!("{shared}tail-two")]),
        ];
        let (metrics, unique) = evaluate(&[], chunks, &[], &limits());

        assert_eq!(metrics.num_duplicates_removed, 1);
        assert_eq!(unique.len(), 2);
        assert!(unique[0].joined_text().ends_with("tail-one"));
        assert_eq!(unique[1].joined_text(), "completely different text");
    }

    #[test]
    fn short_chunks_differing_within_prefix_both_survive() {
        let chunks = vec![chunk(&["alpha"]), chunk(&["beta"])];
        let (metrics, unique) = evaluate(&[], chunks, &[], &limits());
        assert_eq!(metrics.num_duplicates_removed, 0);
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn empty_paragraph_chunks_are_dropped_silently() {
        let chunks = vec![Chunk::with_heading("lonely heading"), chunk(&["body"])];
        let (metrics, unique) = evaluate(&[], chunks, &[], &limits());
        assert_eq!(metrics.num_chunks, 1);
        assert_eq!(metrics.num_duplicates_removed, 0);
        assert_eq!(unique.len(), 1);
    }

    #[test]
    fn size_thresholds_are_strict_inequalities() {
        let chunks = vec![
            chunk(&["tiny"]),                     // 4 chars, under 10
            chunk(&["exactly ten"]),              // 11 chars, inside
            chunk(&[&"y".repeat(41)]),            // over 40
            chunk(&[&"z".repeat(40)]),            // exactly 40, inside
        ];
        let (metrics, _) = evaluate(&[], chunks, &[], &limits());
        assert_eq!(metrics.num_chunks_too_small, 1);
        assert_eq!(metrics.num_chunks_too_large, 1);
    }

    #[test]
    fn coverage_relates_chunks_to_original_text() {
        let blocks = source_blocks(&["12345678901234567890"]); // 20 chars
        let chunks = vec![chunk(&["1234567890"])]; // 10 chars
        let (metrics, _) = evaluate(&blocks, chunks, &[], &limits());
        assert!((metrics.coverage_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn coverage_may_exceed_one_hundred_unclamped() {
        let blocks = source_blocks(&["abcd"]);
        let chunks = vec![chunk(&["abcd"]), chunk(&["extra text on top"])];
        let (metrics, _) = evaluate(&blocks, chunks, &[], &limits());
        assert!(metrics.coverage_pct > 100.0);
    }

    #[test]
    fn image_statistics_average_byte_sizes() {
        let (metrics, _) = evaluate(&[], vec![], &[100, 300], &limits());
        assert_eq!(metrics.num_images_generated, 2);
        assert_eq!(metrics.avg_image_size_bytes, 200.0);
    }

    #[test]
    fn evaluating_twice_is_idempotent() {
        let blocks = source_blocks(&["some source text for coverage"]);
        let chunks = vec![
            chunk(&["first chunk body"]),
            chunk(&["first chunk body"]),
            chunk(&["second chunk body"]),
        ];
        let (first_metrics, first_unique) =
            evaluate(&blocks, chunks.clone(), &[50], &limits());
        let (second_metrics, second_unique) = evaluate(&blocks, chunks, &[50], &limits());

        assert_eq!(first_unique, second_unique);
        // processing time is wall-clock; everything else must agree exactly
        assert_eq!(first_metrics.num_chunks, second_metrics.num_chunks);
        assert_eq!(first_metrics.chunk_size_avg, second_metrics.chunk_size_avg);
        assert_eq!(first_metrics.coverage_pct, second_metrics.coverage_pct);
        assert_eq!(
            first_metrics.num_duplicates_removed,
            second_metrics.num_duplicates_removed
        );
    }
}
