//! End-to-end ingestion through the bundled store.

mod common;

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use common::*;
use juripdf::store::{ChunkStore, PdfDirectory, TextSplitter};
use juripdf::{
    ChunkIndex, DedupPolicy, Error, IngestOptions, IngestState, Ingestor, Layout, QueryEngine,
    Result, TextDocument, TextNormalizer,
};

fn normalizer() -> TextNormalizer {
    TextNormalizer::french().unwrap()
}

fn setup(data: &Path, splitter: TextSplitter) -> (Ingestor, Arc<ChunkStore>) {
    let store = Arc::new(ChunkStore::open(data.join("index/chunks.jsonl"), normalizer()).unwrap());
    let ingestor = Ingestor::new(
        IngestOptions::new().with_data_dir(data.join("data")),
        normalizer(),
        Arc::new(splitter),
        store.clone(),
    );
    (ingestor, store)
}

/// Accepts a fixed number of calls, then refuses.
struct FlakyIndex {
    accepted: Mutex<Vec<TextDocument>>,
    limit: usize,
}

impl ChunkIndex for FlakyIndex {
    fn add_to_index(&self, chunks: &[TextDocument]) -> Result<()> {
        let mut accepted = self.accepted.lock().unwrap();
        if accepted.len() >= self.limit {
            return Err(Error::Indexing("disk full".to_string()));
        }
        accepted.extend_from_slice(chunks);
        Ok(())
    }

    fn clear_index(&self) -> Result<()> {
        self.accepted.lock().unwrap().clear();
        Ok(())
    }
}

#[test]
fn test_single_column_runs_to_indexed() {
    let src = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let path = write_pdf(src.path(), "contrat.pdf", &single_column_contract());
    let (ingestor, store) = setup(work.path(), TextSplitter::default());

    let outcome = ingestor.ingest(&path).unwrap();
    assert_eq!(
        outcome.history,
        vec![
            IngestState::Unseen,
            IngestState::Copied,
            IngestState::FormatDetected,
            IngestState::Extracted,
            IngestState::Chunked,
            IngestState::Indexed,
        ]
    );
    assert_eq!(outcome.layout, Some(Layout::Simple));
    assert_eq!(outcome.chunks_indexed, outcome.chunks_total);
    assert!(outcome.error.is_none());
    assert_eq!(
        fs::read(&outcome.destination).unwrap(),
        fs::read(&path).unwrap()
    );

    let answer = store.answer_query("Qui verse le loyer au bailleur ?").unwrap();
    assert!(answer.starts_with("[contrat.pdf]"), "{}", answer);
}

#[test]
fn test_same_name_is_skipped() {
    let src = tempfile::tempdir().unwrap();
    let other = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let first = write_pdf(src.path(), "contrat.pdf", &single_column_contract());
    let second = write_pdf(other.path(), "contrat.pdf", &double_column_contract());
    let (ingestor, store) = setup(work.path(), TextSplitter::default());

    assert!(ingestor.ingest(&first).unwrap().is_indexed());
    let chunks = store.len().unwrap();

    let outcome = ingestor.ingest(&second).unwrap();
    assert_eq!(outcome.state, IngestState::SkippedDuplicate);
    assert!(outcome.layout.is_none());
    assert_eq!(store.len().unwrap(), chunks);
    assert_eq!(
        fs::read(&outcome.destination).unwrap(),
        single_column_contract()
    );
}

#[test]
fn test_encrypted_document_fails_after_copy() {
    let src = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let path = write_pdf(src.path(), "secret.pdf", &encrypted_pdf());
    let (ingestor, store) = setup(work.path(), TextSplitter::default());

    let outcome = ingestor.ingest(&path).unwrap();
    assert_eq!(outcome.state, IngestState::Failed);
    assert!(outcome.visited(IngestState::Copied));
    assert!(!outcome.visited(IngestState::FormatDetected));
    assert!(outcome.layout.as_ref().is_some_and(Layout::is_error));
    assert!(ingestor.is_processed("secret.pdf"));
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_invalid_input_is_rejected() {
    let src = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let txt = src.path().join("contrat.txt");
    fs::write(&txt, "texte").unwrap();
    let (ingestor, _) = setup(work.path(), TextSplitter::default());

    assert!(matches!(ingestor.ingest(&txt), Err(Error::InputValidation(_))));
    assert!(matches!(
        ingestor.ingest(src.path().join("absent.pdf")),
        Err(Error::InputValidation(_))
    ));
    assert!(!ingestor.is_processed("contrat.txt"));
}

#[test]
fn test_splitter_error_fails_after_extraction() {
    let src = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let path = write_pdf(src.path(), "contrat.pdf", &single_column_contract());
    let (ingestor, store) = setup(work.path(), TextSplitter::new(0, 0));

    let outcome = ingestor.ingest(&path).unwrap();
    assert_eq!(outcome.state, IngestState::Failed);
    assert!(outcome.visited(IngestState::Extracted));
    assert!(!outcome.visited(IngestState::Chunked));
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_index_failure_keeps_earlier_chunks() {
    let src = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let path = write_pdf(src.path(), "contrat.pdf", &single_column_contract());
    let index = Arc::new(FlakyIndex {
        accepted: Mutex::new(Vec::new()),
        limit: 2,
    });
    let ingestor = Ingestor::new(
        IngestOptions::new().with_data_dir(work.path()),
        normalizer(),
        Arc::new(TextSplitter::new(30, 0)),
        index.clone(),
    );

    let outcome = ingestor.ingest(&path).unwrap();
    assert!(outcome.chunks_total > 2);
    assert_eq!(outcome.state, IngestState::Chunked);
    assert_eq!(outcome.chunks_indexed, 2);
    assert!(outcome.error.as_deref().is_some_and(|e| e.contains("disk full")));
    assert_eq!(index.accepted.lock().unwrap().len(), 2);
}

#[test]
fn test_content_hash_skips_renamed_copy() {
    let src = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let bytes = double_column_contract();
    let original = write_pdf(src.path(), "bail.pdf", &bytes);
    let renamed = write_pdf(src.path(), "bail-copie.pdf", &bytes);

    let store = Arc::new(ChunkStore::open(work.path().join("chunks.jsonl"), normalizer()).unwrap());
    let ingestor = Ingestor::new(
        IngestOptions::new()
            .with_data_dir(work.path().join("data"))
            .with_dedup(DedupPolicy::ContentHash),
        normalizer(),
        Arc::new(TextSplitter::default()),
        store,
    );

    let outcome = ingestor.ingest(&original).unwrap();
    assert_eq!(outcome.layout, Some(Layout::Double));
    assert!(outcome.is_indexed());
    assert!(ingestor.ingest(&renamed).unwrap().is_duplicate());
    assert!(!ingestor.is_processed("bail-copie.pdf"));
}

#[test]
fn test_ingest_many_in_parallel() {
    let src = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let paths = vec![
        write_pdf(src.path(), "a.pdf", &single_column_contract()),
        write_pdf(src.path(), "b.pdf", &double_column_contract()),
        write_pdf(src.path(), "c.pdf", &encrypted_pdf()),
    ];
    let store = Arc::new(ChunkStore::open(work.path().join("chunks.jsonl"), normalizer()).unwrap());
    let ingestor = Ingestor::new(
        IngestOptions::new()
            .with_data_dir(work.path().join("data"))
            .with_parallel(true),
        normalizer(),
        Arc::new(TextSplitter::default()),
        store,
    );

    let outcomes: Vec<_> = ingestor
        .ingest_many(&paths)
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_indexed());
    assert!(outcomes[1].is_indexed());
    assert_eq!(outcomes[2].state, IngestState::Failed);
}

#[test]
fn test_reindex_rebuilds_from_working_directory() {
    let src = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let (ingestor, store) = setup(work.path(), TextSplitter::new(60, 10));
    for (name, bytes) in [
        ("a.pdf", single_column_contract()),
        ("b.pdf", double_column_contract()),
    ] {
        let path = write_pdf(src.path(), name, &bytes);
        assert!(ingestor.ingest(&path).unwrap().is_indexed());
    }
    let before = store.chunks().unwrap();

    let outcomes = ingestor
        .reindex(&PdfDirectory::new(work.path().join("data")))
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    for outcome in &outcomes {
        assert_eq!(outcome.history[0], IngestState::Copied);
        assert!(outcome.is_indexed());
    }

    let after = store.chunks().unwrap();
    let ids = |chunks: &[juripdf::store::StoredChunk]| {
        chunks.iter().map(|c| c.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&after), ids(&before));
}
