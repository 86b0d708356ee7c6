//! Dual-column extraction and column reorganization.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::normalize::TextNormalizer;
use crate::parser::PdfBackend;

use super::{ColumnOrder, Extractor};

/// A gap of at least this many whitespace characters separates columns.
pub const MIN_COLUMN_GAP: usize = 4;

static COLUMN_GAP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\s{{{},}}", MIN_COLUMN_GAP)).unwrap());

fn gap_byte_starts(text: &str) -> Vec<usize> {
    COLUMN_GAP_REGEX.find_iter(text).map(|m| m.start()).collect()
}

/// Character offsets where each run of 4+ whitespace characters starts.
pub fn column_markers(text: &str) -> Vec<usize> {
    let starts = gap_byte_starts(text);
    let mut markers = Vec::with_capacity(starts.len());
    let mut next = starts.iter().peekable();
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        match next.peek() {
            Some(&&start) if start == byte_idx => {
                markers.push(char_idx);
                next.next();
            }
            Some(_) => {}
            None => break,
        }
    }
    markers
}

/// Split `text` at the character offsets in `markers` into trimmed segments
/// joined by newlines.
///
/// With k markers there are k+1 segments, empty ones included. Text without
/// markers is returned unchanged, as is text whose markers are out of order
/// or past its end.
pub fn reorganize_columns(text: &str, markers: &[usize]) -> String {
    match byte_offsets(text, markers) {
        Some(offsets) => column_segments(text, &offsets).join("\n"),
        None => {
            log::debug!("Ignoring {} unusable column markers", markers.len());
            text.to_string()
        }
    }
}

/// Map ascending character offsets to byte offsets. `None` when the offsets
/// decrease or one lies past the end of `text`.
fn byte_offsets(text: &str, markers: &[usize]) -> Option<Vec<usize>> {
    if markers.windows(2).any(|w| w[0] > w[1]) {
        return None;
    }
    let char_count = text.chars().count();
    if markers.last().is_some_and(|&last| last > char_count) {
        return None;
    }
    let bytes: Vec<usize> = text
        .char_indices()
        .map(|(byte_idx, _)| byte_idx)
        .chain(std::iter::once(text.len()))
        .collect();
    Some(markers.iter().map(|&m| bytes[m]).collect())
}

fn column_segments<'a>(text: &'a str, markers: &[usize]) -> Vec<&'a str> {
    if markers.is_empty() {
        return vec![text];
    }
    let mut segments = Vec::with_capacity(markers.len() + 1);
    let mut start = 0;
    for &marker in markers {
        segments.push(text[start..marker].trim());
        start = marker;
    }
    segments.push(text[start..].trim());
    segments
}

/// Processes pages one at a time, reordering column text on each.
#[derive(Debug, Clone)]
pub struct DoubleColumnExtractor {
    normalizer: TextNormalizer,
    order: ColumnOrder,
}

impl DoubleColumnExtractor {
    /// Create an extractor with the default [`ColumnOrder`].
    pub fn new(normalizer: TextNormalizer) -> Self {
        Self {
            normalizer,
            order: ColumnOrder::default(),
        }
    }

    /// Set the order of normalization and column splitting.
    pub fn with_order(mut self, order: ColumnOrder) -> Self {
        self.order = order;
        self
    }

    /// Current order.
    pub fn order(&self) -> ColumnOrder {
        self.order
    }

    /// Turn one page's raw text into its normalized, column-ordered form.
    pub fn process_page(&self, raw: &str) -> String {
        match self.order {
            ColumnOrder::NormalizeThenSplit => {
                let normalized = self.normalizer.normalize(raw);
                let markers = column_markers(&normalized);
                reorganize_columns(&normalized, &markers)
            }
            ColumnOrder::SplitThenNormalize => {
                let markers = gap_byte_starts(raw);
                log::debug!("{} column markers in raw page text", markers.len());
                column_segments(raw, &markers)
                    .into_iter()
                    .map(|segment| self.normalizer.normalize(segment))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
    }
}

impl Extractor for DoubleColumnExtractor {
    fn name(&self) -> &str {
        "double-column"
    }

    fn extract_backend(&self, backend: &dyn PdfBackend) -> Result<String> {
        let mut pages = Vec::new();
        for page_num in backend.pages().keys() {
            let raw = backend.page_text(*page_num)?;
            if raw.is_empty() {
                log::debug!("Page {}: no text", page_num);
                continue;
            }
            pages.push(self.process_page(&raw));
        }
        log::debug!(
            "Double-column extraction ({}): {} of {} pages with text",
            self.order,
            pages.len(),
            backend.page_count()
        );
        Ok(pages.join("\n"))
    }
}
