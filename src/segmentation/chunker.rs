//! Heading-delimited chunk assembly.

use crate::segmentation::headings::HeadingDetector;
use crate::types::{Chunk, Segment};

/// Cuts the normalized segment stream into heading-delimited chunks.
///
/// One accumulator walks the stream: a heading flushes it (only if it has
/// gathered paragraphs — consecutive headings with nothing between them
/// leave no empty chunk behind) and opens a new one under the heading's
/// text. Textual blocks and rendered list groups append to the open
/// accumulator. Content before the first heading lands in a chunk with no
/// heading. Output order follows document order.
pub async fn chunk_segments(segments: &[Segment], detector: &HeadingDetector) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = Chunk::untitled();

    for segment in segments {
        match segment {
            Segment::Block(block) => {
                if detector.is_heading(block).await {
                    flush(&mut chunks, &mut current, block.content.clone());
                } else if block.kind.is_textual() {
                    current.paragraphs.push(block.content.clone());
                }
            }
            Segment::List(node) => {
                let rendered = node.render();
                if !rendered.is_empty() {
                    current.paragraphs.push(rendered);
                }
            }
        }
    }

    if !current.paragraphs.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn flush(chunks: &mut Vec<Chunk>, current: &mut Chunk, next_heading: String) {
    let finished = std::mem::replace(current, Chunk::with_heading(next_heading));
    if !finished.paragraphs.is_empty() {
        chunks.push(finished);
    }
}
