//! Collaborators the orchestrator hands work to.
//!
//! Chunking policy, index storage and question answering live behind these
//! traits. The [`store`](crate::store) module has file-backed defaults.

use crate::error::Result;
use crate::model::{SourceDocument, TextDocument};

/// Splits one logical document into ordered chunks.
pub trait ChunkSplitter: Send + Sync {
    fn split_into_chunks(&self, document: &TextDocument) -> Result<Vec<TextDocument>>;
}

/// Destination for chunks.
///
/// Implementations dedup chunks themselves. Concurrent callers need an
/// implementation that tolerates concurrent writes.
pub trait ChunkIndex: Send + Sync {
    /// Add chunks to the index.
    fn add_to_index(&self, chunks: &[TextDocument]) -> Result<()>;

    /// Remove every chunk.
    fn clear_index(&self) -> Result<()>;
}

/// Lists the documents a full re-index starts from.
pub trait DocumentSource: Send + Sync {
    fn load_documents(&self) -> Result<Vec<SourceDocument>>;
}

/// Answers a free-text question from the index.
pub trait QueryEngine: Send + Sync {
    fn answer_query(&self, question: &str) -> Result<String>;
}
