//! Contract with the document extraction collaborator.
//!
//! Extraction (layout analysis or OCR) is a black box that turns document
//! bytes into an ordered [`TextBlock`] sequence plus, in OCR mode, the byte
//! sizes of the per-page rasterizations it produced along the way.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{TextBlock, roles};

/// File extensions accepted by the pipeline.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "tiff"];

/// How the analyzer should read the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzeMode {
    /// Native layout analysis over the original bytes.
    Layout,
    /// Rasterize page by page and extract each page image independently.
    Ocr,
}

impl FromStr for AnalyzeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "layout" => Ok(AnalyzeMode::Layout),
            "ocr" => Ok(AnalyzeMode::Ocr),
            other => Err(format!("unknown analyze mode '{other}'")),
        }
    }
}

/// Everything an analyzer reports for one document.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub blocks: Vec<TextBlock>,
    /// Byte sizes of page images rendered in OCR mode; empty in layout mode.
    pub image_sizes: Vec<usize>,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document rejected: {0}")]
    Rejected(String),

    #[error("extraction backend unavailable: {0}")]
    Unavailable(String),
}

/// Document extraction collaborator.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, bytes: &[u8], mode: AnalyzeMode) -> Result<Extraction, ExtractError>;
}

/// Whether the file name carries a processable extension.
pub fn is_supported_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Drops non-structural blocks (page footers, page numbers) before
/// segmentation. Everything downstream, including coverage, sees only the
/// blocks that survive this filter.
pub fn filter_structural_blocks(blocks: Vec<TextBlock>) -> Vec<TextBlock> {
    blocks
        .into_iter()
        .filter(|block| {
            !block.has_role(roles::PAGE_FOOTER) && !block.has_role(roles::PAGE_NUMBER)
        })
        .collect()
}
