use serde::{Deserialize, Serialize};

pub mod backend;
pub mod config_file;
pub mod lookup;

pub use backend::{BackendError, PageSource, PdfBackend, TextPages};
pub use lookup::{LookupError, WorkCandidate, WorkLookup};

/// Smallest unit of text produced by a page text layer.
///
/// Sources attach inter-line spacing to the text themselves: a line-ending
/// token whose text ends in `-` carries no trailing space, every other
/// line-ending token carries exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub ends_line: bool,
    /// Opaque identifier; only equality is meaningful.
    pub font_id: String,
}

impl Token {
    pub fn new(text: impl Into<String>, ends_line: bool, font_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ends_line,
            font_id: font_id.into(),
        }
    }
}

/// The tokens of one page, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub tokens: Vec<Token>,
}

impl Page {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

/// A bibliography entry split into structured fields.
///
/// A reference the field tokenizer could not segment keeps its
/// `original_text` with empty `authors`, `title` and `venue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReference {
    pub original_text: String,
    pub authors: String,
    pub title: String,
    pub venue: String,
    pub year: Option<String>,
}

impl ParsedReference {
    /// Record for a reference whose fields could not be extracted.
    pub fn unparsed(original_text: impl Into<String>) -> Self {
        Self {
            original_text: original_text.into(),
            authors: String::new(),
            title: String::new(),
            venue: String::new(),
            year: None,
        }
    }

    /// True when authors, title and venue were all recovered.
    pub fn is_complete(&self) -> bool {
        !self.authors.is_empty() && !self.title.is_empty() && !self.venue.is_empty()
    }

    /// True when no structured field was recovered.
    pub fn is_unparsed(&self) -> bool {
        self.authors.is_empty() && self.title.is_empty() && self.venue.is_empty()
    }
}

/// Counters describing how the references of one document were parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Number of numbered entries found by segmentation.
    pub total: usize,
    /// Entries with authors, title and venue.
    pub parsed: usize,
    /// Entries where at least one field came back empty.
    pub incomplete: usize,
    /// Entries the tokenizer gave up on.
    pub unparsed: usize,
}

/// Result of extracting references from a document.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub references: Vec<ParsedReference>,
    pub stats: ExtractionStats,
}
