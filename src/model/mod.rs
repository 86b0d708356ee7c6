//! Data model shared by detection, extraction and ingestion.
//!
//! Documents enter as [`SourceDocument`]s (bytes plus path), page 1 is
//! described by [`PageBlock`]s during layout detection, and the normalized
//! text leaves as a [`TextDocument`] handed to the chunk splitter.

mod block;
mod document;

pub use block::{BBox, PageBlock};
pub use document::{SourceDocument, TextDocument};

pub(crate) use document::{file_name_of, hash_bytes};
