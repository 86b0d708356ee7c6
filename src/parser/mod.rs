//! PDF access and page geometry.

pub mod backend;
mod layout;

pub use backend::{LopdfBackend, PageBox, PageId, PdfBackend};
pub use layout::{LayoutAnalyzer, TextSpan};
