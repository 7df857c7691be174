//! Turning a flat block stream into structure: lists, headings, chunks.
//!
//! The three stages run in order inside one document-processing pass:
//!
//! * [`lists`] — rebuilds nested list trees from indentation and markers.
//! * [`headings`] — decides which blocks function as structural headings.
//! * [`chunker`] — cuts the normalized stream into heading-delimited chunks.

pub mod chunker;
pub mod headings;
pub mod lists;

pub use chunker::chunk_segments;
pub use headings::HeadingDetector;
pub use lists::ListNormalizer;
