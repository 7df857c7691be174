//! Core data model shared across the pipeline stages.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embeddings::EmbeddingError;
use crate::stores::{IndexError, MetricsError};

/// Block roles assigned by document understanding services.
pub mod roles {
    pub const TITLE: &str = "title";
    pub const SECTION_HEADING: &str = "sectionHeading";
    pub const PAGE_FOOTER: &str = "pageFooter";
    pub const PAGE_NUMBER: &str = "pageNumber";
}

/// Structural category of an extracted text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    ListItem,
    ListText,
    /// Anything else the extraction service emits (tables, figures, ...).
    /// Skipped during chunk assembly but still breaks list continuation.
    #[serde(other)]
    Other,
}

impl BlockKind {
    /// Whether this kind of block contributes its text to chunk bodies.
    pub fn is_textual(self) -> bool {
        !matches!(self, BlockKind::Other)
    }
}

/// One unit of extracted document text with role and page metadata.
///
/// Produced by the extraction collaborator; immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub content: String,
    pub page: u32,
}

impl TextBlock {
    /// Creates a paragraph block on the given page.
    pub fn paragraph(content: impl Into<String>, page: u32) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            role: None,
            content: content.into(),
            page,
        }
    }

    /// Sets the role reported by the extraction service.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Returns `true` when the block carries exactly the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }

    /// Whether role metadata marks this block as a structural heading.
    pub fn has_heading_role(&self) -> bool {
        self.has_role(roles::TITLE) || self.has_role(roles::SECTION_HEADING)
    }
}

/// A node in a reconstructed nested list.
///
/// Invariant: a child's indentation level was strictly greater than its
/// parent's when the tree was built, so depth is bounded by the input's
/// indentation depth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListNode {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ListNode>,
}

impl ListNode {
    /// Creates a node with no children.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            children: Vec::new(),
        }
    }

    /// Renders the node and its descendants as indented lines, children
    /// following their parent in document order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        if !out.is_empty() {
            out.push('\n');
        }
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(&self.text);
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}

/// Output element of list normalization: either a pass-through block or the
/// root of a reconstructed list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Block(TextBlock),
    List(ListNode),
}

/// A heading-delimited grouping of paragraph text, one retrieval unit.
///
/// Only chunks with non-empty `paragraphs` are ever retained. The first
/// chunk of a document may have `heading = None` when content precedes the
/// first detected heading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub heading: Option<String>,
    pub paragraphs: Vec<String>,
}

impl Chunk {
    /// An empty accumulator with no heading.
    pub fn untitled() -> Self {
        Self::default()
    }

    /// An empty accumulator under the given heading.
    pub fn with_heading(heading: impl Into<String>) -> Self {
        Self {
            heading: Some(heading.into()),
            paragraphs: Vec::new(),
        }
    }

    /// The space-joined paragraph text, as embedded and indexed.
    pub fn joined_text(&self) -> String {
        self.paragraphs.join(" ")
    }

    /// Chunk size in characters of the joined text.
    pub fn char_len(&self) -> usize {
        // paragraphs.len() - 1 joining spaces, avoiding the full join
        let text: usize = self.paragraphs.iter().map(|p| p.chars().count()).sum();
        text + self.paragraphs.len().saturating_sub(1)
    }
}

/// Error surface of a document-processing run.
///
/// Environmental failures (extraction, embedding, indexing) carry enough
/// context to log and skip the affected document; they never abort sibling
/// documents in a batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("extraction timed out after {0:?}")]
    ExtractionTimeout(Duration),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
