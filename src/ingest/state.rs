//! Per-document ingestion state machine.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::detect::Layout;

/// Where a submitted document is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestState {
    Unseen,
    /// A document with the same identity was already in the working directory
    SkippedDuplicate,
    Copied,
    FormatDetected,
    Extracted,
    Chunked,
    Indexed,
    Failed,
}

impl IngestState {
    /// Whether `next` may follow this state.
    pub fn can_transition_to(self, next: IngestState) -> bool {
        use IngestState::*;
        matches!(
            (self, next),
            (Unseen, SkippedDuplicate)
                | (Unseen, Copied)
                | (Copied, FormatDetected)
                | (Copied, Failed)
                | (FormatDetected, Extracted)
                | (FormatDetected, Failed)
                | (Extracted, Chunked)
                | (Extracted, Failed)
                | (Chunked, Indexed)
        )
    }

    /// No further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            IngestState::SkippedDuplicate | IngestState::Indexed | IngestState::Failed
        )
    }
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestState::Unseen => "unseen",
            IngestState::SkippedDuplicate => "skipped (duplicate)",
            IngestState::Copied => "copied",
            IngestState::FormatDetected => "format detected",
            IngestState::Extracted => "extracted",
            IngestState::Chunked => "chunked",
            IngestState::Indexed => "indexed",
            IngestState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Result of ingesting one document.
///
/// A document whose indexing stopped partway stays in
/// [`IngestState::Chunked`] with `error` set and `chunks_indexed` counting
/// the chunks that made it into the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOutcome {
    /// Dedup key
    pub file_name: String,
    /// Location in the working directory
    pub destination: PathBuf,
    /// Final state
    pub state: IngestState,
    /// Every state visited, in order
    pub history: Vec<IngestState>,
    /// Page-1 classification, once detection ran
    pub layout: Option<Layout>,
    /// Chunks produced by the splitter
    pub chunks_total: usize,
    /// Chunks accepted by the index
    pub chunks_indexed: usize,
    /// Human-readable failure, if any
    pub error: Option<String>,
}

impl IngestOutcome {
    /// A fresh outcome at [`IngestState::Unseen`].
    pub fn new(file_name: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self::starting_at(file_name, destination, IngestState::Unseen)
    }

    pub(crate) fn starting_at(
        file_name: impl Into<String>,
        destination: impl Into<PathBuf>,
        state: IngestState,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            destination: destination.into(),
            state,
            history: vec![state],
            layout: None,
            chunks_total: 0,
            chunks_indexed: 0,
            error: None,
        }
    }

    pub(crate) fn advance(&mut self, next: IngestState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {:?} -> {:?}",
            self.state,
            next
        );
        log::debug!("{}: {} -> {}", self.file_name, self.state, next);
        self.state = next;
        self.history.push(next);
    }

    pub(crate) fn fail(&mut self, error: impl fmt::Display) {
        let message = error.to_string();
        log::warn!("{}: failed after {}: {}", self.file_name, self.state, message);
        self.error = Some(message);
        self.advance(IngestState::Failed);
    }

    /// Whether the state was ever reached.
    pub fn visited(&self, state: IngestState) -> bool {
        self.history.contains(&state)
    }

    /// Whether the document went all the way through.
    pub fn is_indexed(&self) -> bool {
        self.state == IngestState::Indexed
    }

    /// Whether the document was skipped as already processed.
    pub fn is_duplicate(&self) -> bool {
        self.state == IngestState::SkippedDuplicate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        use IngestState::*;
        let path = [Unseen, Copied, FormatDetected, Extracted, Chunked, Indexed];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?}", pair);
        }
    }

    #[test]
    fn test_failed_is_reachable_only_mid_pipeline() {
        use IngestState::*;
        assert!(Copied.can_transition_to(Failed));
        assert!(FormatDetected.can_transition_to(Failed));
        assert!(Extracted.can_transition_to(Failed));
        assert!(!Unseen.can_transition_to(Failed));
        assert!(!Chunked.can_transition_to(Failed));
        assert!(!Indexed.can_transition_to(Failed));
    }

    #[test]
    fn test_no_state_is_revisited() {
        use IngestState::*;
        let all = [
            Unseen,
            SkippedDuplicate,
            Copied,
            FormatDetected,
            Extracted,
            Chunked,
            Indexed,
            Failed,
        ];
        for state in all {
            assert!(!state.can_transition_to(state));
            assert!(!state.can_transition_to(Unseen));
            if state.is_terminal() {
                assert!(all.iter().all(|next| !state.can_transition_to(*next)));
            }
        }
    }

    #[test]
    fn test_outcome_history() {
        let mut outcome = IngestOutcome::new("bail.pdf", "data/bail.pdf");
        outcome.advance(IngestState::Copied);
        outcome.fail("Format detection failed: not a PDF file");
        assert_eq!(outcome.state, IngestState::Failed);
        assert_eq!(
            outcome.history,
            vec![IngestState::Unseen, IngestState::Copied, IngestState::Failed]
        );
        assert!(!outcome.visited(IngestState::FormatDetected));
        assert_eq!(
            outcome.error.as_deref(),
            Some("Format detection failed: not a PDF file")
        );
    }

    #[test]
    fn test_outcome_serializes_states() {
        let outcome = IngestOutcome::new("bail.pdf", "data/bail.pdf");
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"state\":\"unseen\""));
    }
}
