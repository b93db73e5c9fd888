use std::path::Path;

use thiserror::Error;

pub mod cleaner;
pub mod config;
pub mod cursor;
pub mod extractor;
pub mod locator;
pub mod segmenter;
pub mod style;
pub mod tokenizer;

pub use cleaner::{CleanedReference, MergedLine, Run};
pub use config::{ListOverride, ParsingConfig, ParsingConfigBuilder};
pub use extractor::ReferenceExtractor;
pub use locator::BibliographyStart;
pub use segmenter::ReferenceGroup;
pub use style::CitationStyle;
pub use tokenizer::{FieldTokenizer, ReferenceFields, TokenizeError, TokenizeOutcome};
// Re-export domain types from core (canonical definitions live there)
pub use refscout_core::{ExtractionResult, ExtractionStats, ParsedReference};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("Citations section was not found")]
    NoBibliography,
    #[error(transparent)]
    Backend(#[from] refscout_core::BackendError),
}

/// Extract the bibliography of a document using `backend` for its text layer.
///
/// Pipeline:
/// 1. Open the document as a page source
/// 2. Locate the last `[1]` marker
/// 3. Segment numbered references across pages
/// 4. Merge font runs, strip the marker and trailing artifacts
/// 5. Tokenize authors, year, title and venue
pub fn extract_references(
    path: &Path,
    backend: &dyn refscout_core::PdfBackend,
) -> Result<ExtractionResult, ParsingError> {
    let source = backend.open(path)?;
    ReferenceExtractor::new().extract(&*source)
}
