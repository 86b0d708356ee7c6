//! Text extraction for classified documents.
//!
//! Each [`Layout`] has a matching [`Extractor`]. Both variants return one
//! normalized string for the whole document.
//!
//! # Example
//!
//! ```no_run
//! use juripdf::extract::{extractor_for, ColumnOrder};
//! use juripdf::{LayoutDetector, TextNormalizer};
//!
//! fn main() -> juripdf::Result<()> {
//!     let normalizer = TextNormalizer::french()?;
//!     let layout = LayoutDetector::new().detect("contrat.pdf");
//!     let extractor = extractor_for(&layout, normalizer, ColumnOrder::default())?;
//!     println!("{}", extractor.extract("contrat.pdf".as_ref())?);
//!     Ok(())
//! }
//! ```

mod double_column;
mod simple;

pub use double_column::{column_markers, reorganize_columns, DoubleColumnExtractor};
pub use simple::SimpleExtractor;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::detect::Layout;
use crate::error::{Error, Result};
use crate::normalize::TextNormalizer;
use crate::parser::{LopdfBackend, PdfBackend};

/// Order of normalization and column splitting on dual-column pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnOrder {
    /// Normalize each page, then split columns. Normalization collapses the
    /// whitespace gaps, so the split never fires on real pages.
    #[default]
    NormalizeThenSplit,
    /// Split the raw page text at column gaps, then normalize each segment.
    SplitThenNormalize,
}

impl fmt::Display for ColumnOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnOrder::NormalizeThenSplit => write!(f, "normalize-then-split"),
            ColumnOrder::SplitThenNormalize => write!(f, "split-then-normalize"),
        }
    }
}

impl FromStr for ColumnOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "normalize-then-split" => Ok(ColumnOrder::NormalizeThenSplit),
            "split-then-normalize" => Ok(ColumnOrder::SplitThenNormalize),
            other => Err(Error::InputValidation(format!(
                "unknown column order '{}'",
                other
            ))),
        }
    }
}

/// Produces normalized text from a PDF.
pub trait Extractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Extract from an opened backend.
    fn extract_backend(&self, backend: &dyn PdfBackend) -> Result<String>;

    /// Extract the document at `path`.
    fn extract(&self, path: &Path) -> Result<String> {
        let backend = LopdfBackend::load_file(path)?;
        self.extract_backend(&backend)
    }

    /// Extract a document held in memory.
    fn extract_bytes(&self, data: &[u8]) -> Result<String> {
        let backend = LopdfBackend::load_bytes(data)?;
        self.extract_backend(&backend)
    }
}

/// Pick the extractor matching a layout.
///
/// [`Layout::Error`] has no extractor and is returned as
/// [`Error::FormatDetection`].
pub fn extractor_for(
    layout: &Layout,
    normalizer: TextNormalizer,
    order: ColumnOrder,
) -> Result<Box<dyn Extractor>> {
    match layout {
        Layout::Simple => Ok(Box::new(SimpleExtractor::new(normalizer))),
        Layout::Double => Ok(Box::new(
            DoubleColumnExtractor::new(normalizer).with_order(order),
        )),
        Layout::Error(msg) => Err(Error::FormatDetection(msg.clone())),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::PageTexts;
    use super::*;

    #[test]
    fn test_column_order_parse_and_display() {
        for order in [ColumnOrder::NormalizeThenSplit, ColumnOrder::SplitThenNormalize] {
            assert_eq!(order.to_string().parse::<ColumnOrder>().unwrap(), order);
        }
        assert!("sideways".parse::<ColumnOrder>().is_err());
        assert_eq!(ColumnOrder::default(), ColumnOrder::NormalizeThenSplit);
    }

    #[test]
    fn test_extractor_for_layout() {
        let normalizer = TextNormalizer::french().unwrap();
        let simple = extractor_for(&Layout::Simple, normalizer.clone(), ColumnOrder::default());
        assert_eq!(simple.unwrap().name(), "simple");
        let double = extractor_for(&Layout::Double, normalizer.clone(), ColumnOrder::default());
        assert_eq!(double.unwrap().name(), "double-column");

        let err = extractor_for(&Layout::Error("bad".into()), normalizer, ColumnOrder::default());
        assert!(matches!(err, Err(Error::FormatDetection(_))));
    }

    #[test]
    fn test_simple_normalizes_concatenated_pages() {
        let pages = PageTexts::new(&["Le Contrat de bail", "est conclu pour neuf ans."]);
        let extractor = SimpleExtractor::new(TextNormalizer::french().unwrap());
        assert_eq!(
            extractor.raw_text(&pages).unwrap(),
            "Le Contrat de bail\nest conclu pour neuf ans.\n"
        );
        assert_eq!(
            extractor.extract_backend(&pages).unwrap(),
            "contrat bail conclure an"
        );
    }
}
