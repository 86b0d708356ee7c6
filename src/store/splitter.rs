//! Word-window chunk splitting.

use crate::error::{Error, Result};
use crate::ingest::ChunkSplitter;
use crate::model::TextDocument;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 80;

/// Greedy splitter on whitespace-separated words.
///
/// Each chunk holds at most `chunk_size` characters unless a single word is
/// longer. Every chunk after the first starts with the trailing words of the
/// previous one, up to `chunk_overlap` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Create a splitter.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Check that the sizes can make progress.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Chunking("chunk size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Chunking(format!(
                "chunk overlap {} must be smaller than chunk size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Split text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_len = 0usize;

        for word in text.split_whitespace() {
            let word_len = word.chars().count();
            if !current.is_empty() && current_len + 1 + word_len > self.chunk_size {
                chunks.push(current.join(" "));
                let (tail, tail_len) = self.overlap_tail(&current);
                if tail_len + 1 + word_len > self.chunk_size {
                    current.clear();
                    current_len = 0;
                } else {
                    current = tail;
                    current_len = tail_len;
                }
            }
            current_len = if current.is_empty() {
                word_len
            } else {
                current_len + 1 + word_len
            };
            current.push(word);
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }
        chunks
    }

    /// Trailing words of a chunk that fit in the overlap.
    fn overlap_tail<'a>(&self, words: &[&'a str]) -> (Vec<&'a str>, usize) {
        let mut tail = Vec::new();
        let mut len = 0usize;
        for word in words.iter().rev() {
            let word_len = word.chars().count();
            let next = if tail.is_empty() { word_len } else { len + 1 + word_len };
            if next > self.chunk_overlap {
                break;
            }
            tail.push(*word);
            len = next;
        }
        tail.reverse();
        (tail, len)
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl ChunkSplitter for TextSplitter {
    fn split_into_chunks(&self, document: &TextDocument) -> Result<Vec<TextDocument>> {
        self.validate()?;
        Ok(self
            .split_text(&document.content)
            .into_iter()
            .enumerate()
            .map(|(i, content)| {
                let mut chunk = TextDocument::new(content);
                chunk.metadata = document.metadata.clone();
                chunk.with_metadata("chunk", i.to_string())
            })
            .collect())
    }
}
