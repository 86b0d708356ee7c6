//! File-backed chunk index with lemma-overlap retrieval.

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ingest::{ChunkIndex, QueryEngine};
use crate::model::{hash_bytes, TextDocument};
use crate::normalize::TextNormalizer;

/// Reply when no stored chunk shares a lemma with the question.
pub const NO_ANSWER: &str = "Aucun passage pertinent trouvé.";

/// Passages returned per answer.
pub const DEFAULT_TOP_K: usize = 3;

/// One line of the store file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredChunk {
    /// SHA-256 of the content
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub indexed_at: DateTime<Utc>,
}

impl StoredChunk {
    fn from_document(chunk: &TextDocument) -> Self {
        Self {
            id: hash_bytes(chunk.content.as_bytes()),
            content: chunk.content.clone(),
            metadata: chunk.metadata.clone(),
            indexed_at: Utc::now(),
        }
    }

    /// The `source` metadata entry, if any.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").map(String::as_str)
    }
}

/// A retrieval hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredChunk {
    /// Distinct question lemmas found in the chunk
    pub score: usize,
    pub chunk: StoredChunk,
}

/// Chunks kept in memory and appended to a JSON-lines file.
///
/// Chunk identity is the hash of its content: adding the same text twice
/// stores it once.
#[derive(Debug)]
pub struct ChunkStore {
    path: PathBuf,
    normalizer: TextNormalizer,
    top_k: usize,
    chunks: Mutex<Vec<StoredChunk>>,
}

impl ChunkStore {
    /// Open the store at `path`, loading existing chunks.
    pub fn open<P: AsRef<Path>>(path: P, normalizer: TextNormalizer) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let chunks = if path.exists() {
            read_chunks(&path)?
        } else {
            Vec::new()
        };
        log::debug!("Opened chunk store {} ({} chunks)", path.display(), chunks.len());
        Ok(Self {
            path,
            normalizer,
            top_k: DEFAULT_TOP_K,
            chunks: Mutex::new(chunks),
        })
    }

    /// Set how many passages an answer quotes.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Path of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored chunks.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Whether the store holds no chunk.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Snapshot of the stored chunks in insertion order.
    pub fn chunks(&self) -> Result<Vec<StoredChunk>> {
        Ok(self.lock()?.clone())
    }

    /// Chunks sharing at least one lemma with `question`, best first.
    ///
    /// Ties keep insertion order.
    pub fn search(&self, question: &str, limit: usize) -> Result<Vec<ScoredChunk>> {
        let normalized = self.normalizer.normalize(question);
        let wanted: HashSet<&str> = normalized.split_whitespace().collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let chunks = self.lock()?;
        let mut hits: Vec<ScoredChunk> = chunks
            .iter()
            .filter_map(|chunk| {
                let present: HashSet<&str> = chunk.content.split_whitespace().collect();
                let score = wanted.iter().filter(|w| present.contains(*w)).count();
                (score > 0).then(|| ScoredChunk {
                    score,
                    chunk: chunk.clone(),
                })
            })
            .collect();
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<StoredChunk>>> {
        self.chunks
            .lock()
            .map_err(|_| Error::Store("chunk store lock poisoned".to_string()))
    }
}

fn read_chunks(path: &Path) -> Result<Vec<StoredChunk>> {
    let reader = BufReader::new(File::open(path)?);
    let mut chunks = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let chunk = serde_json::from_str(&line)
            .map_err(|e| Error::Store(format!("{}:{}: {}", path.display(), i + 1, e)))?;
        chunks.push(chunk);
    }
    Ok(chunks)
}

impl ChunkIndex for ChunkStore {
    fn add_to_index(&self, chunks: &[TextDocument]) -> Result<()> {
        let mut stored = self.lock()?;
        let mut known: HashSet<String> = stored.iter().map(|c| c.id.clone()).collect();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::Indexing(format!("{}: {}", self.path.display(), e)))?;

        for chunk in chunks {
            let record = StoredChunk::from_document(chunk);
            if !known.insert(record.id.clone()) {
                log::debug!("Chunk {} already indexed", &record.id[..12]);
                continue;
            }
            let line = serde_json::to_string(&record)?;
            writeln!(file, "{}", line)
                .map_err(|e| Error::Indexing(format!("{}: {}", self.path.display(), e)))?;
            stored.push(record);
        }
        Ok(())
    }

    fn clear_index(&self) -> Result<()> {
        let mut stored = self.lock()?;
        File::create(&self.path)?;
        log::info!("Cleared {} chunks from {}", stored.len(), self.path.display());
        stored.clear();
        Ok(())
    }
}

impl QueryEngine for ChunkStore {
    fn answer_query(&self, question: &str) -> Result<String> {
        if question.trim().is_empty() {
            return Err(Error::InputValidation("empty question".to_string()));
        }
        let hits = self.search(question, self.top_k)?;
        if hits.is_empty() {
            return Ok(NO_ANSWER.to_string());
        }
        let passages: Vec<String> = hits
            .iter()
            .map(|hit| match hit.chunk.source() {
                Some(source) => format!("[{}] {}", source, hit.chunk.content),
                None => hit.chunk.content.clone(),
            })
            .collect();
        Ok(passages.join("\n\n"))
    }
}
