//! Query-time context assembly.

use std::sync::Arc;

use tracing::debug;

use crate::embeddings::EmbeddingProvider;
use crate::stores::SearchIndex;
use crate::types::PipelineError;

/// Separator between chunk contents in an assembled prompt context.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Assembles ranked chunk context for a question.
///
/// The assembler embeds the question, asks the search collaborator for the
/// top `k` hits and hands their contents through in the collaborator's
/// order — it imposes no re-ranking of its own. Fewer than `k` hits (or
/// none at all) is a normal outcome the downstream generation step must
/// handle, not an error.
pub struct RetrievalAssembler {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn SearchIndex>,
}

impl RetrievalAssembler {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn SearchIndex>) -> Self {
        Self { embedder, index }
    }

    /// Returns the contents of the top `k` chunks, most relevant first.
    pub async fn answer_context(
        &self,
        question: &str,
        k: usize,
    ) -> Result<Vec<String>, PipelineError> {
        let vector = self.embedder.embed(question).await?;
        let hits = self.index.vector_search(&vector, k).await?;
        debug!(requested = k, returned = hits.len(), "vector search completed");
        Ok(hits.into_iter().map(|hit| hit.document.content).collect())
    }

    /// Renders the context as one prompt block, separator-joined.
    pub async fn prompt_context(
        &self,
        question: &str,
        k: usize,
    ) -> Result<String, PipelineError> {
        Ok(self.answer_context(question, k).await?.join(CONTEXT_SEPARATOR))
    }
}
