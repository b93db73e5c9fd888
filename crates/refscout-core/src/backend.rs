use std::path::Path;

use thiserror::Error;

use crate::{Page, Token};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("page {index} out of range ({count} pages)")]
    PageOutOfRange { index: usize, count: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supplies the text tokens of a document, one page at a time.
///
/// Pages are decoded on demand so the bibliography locator can walk the
/// document backwards without decoding the body first.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Decode page `index` (0-based).
    fn page(&self, index: usize) -> Result<Page, BackendError>;
}

/// Trait for PDF text-layer backends.
///
/// Implementors turn a file into a [`PageSource`]; reference location,
/// segmentation and field tokenizing live in `refscout_parsing`.
pub trait PdfBackend: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn PageSource>, BackendError>;
}

impl PageSource for [Page] {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn page(&self, index: usize) -> Result<Page, BackendError> {
        self.get(index)
            .cloned()
            .ok_or(BackendError::PageOutOfRange {
                index,
                count: self.len(),
            })
    }
}

impl PageSource for Vec<Page> {
    fn page_count(&self) -> usize {
        self.as_slice().page_count()
    }

    fn page(&self, index: usize) -> Result<Page, BackendError> {
        self.as_slice().page(index)
    }
}

/// Page source over plain text: pages are separated by form feeds and every
/// non-blank line becomes one line-ending token with an empty font id.
#[derive(Debug, Clone, Default)]
pub struct TextPages {
    pages: Vec<Page>,
}

impl TextPages {
    pub fn from_text(text: &str) -> Self {
        let pages = text
            .split('\u{0C}')
            .map(|page| Page::new(page.lines().filter_map(line_token).collect()))
            .collect();
        Self { pages }
    }

    pub fn from_path(path: &Path) -> Result<Self, BackendError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }
}

impl PageSource for TextPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<Page, BackendError> {
        self.pages.page(index)
    }
}

fn line_token(line: &str) -> Option<Token> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let text = if line.ends_with('-') {
        line.to_string()
    } else {
        format!("{line} ")
    };
    Some(Token::new(text, true, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_pages_split_on_form_feed() {
        let pages = TextPages::from_text("first page\nline two\u{0C}second page\n");
        assert_eq!(pages.page_count(), 2);
        let first = pages.page(0).unwrap();
        assert_eq!(first.tokens.len(), 2);
        assert_eq!(first.tokens[0].text, "first page ");
        assert!(first.tokens[0].ends_line);
        assert_eq!(pages.page(1).unwrap().tokens[0].text, "second page ");
    }

    #[test]
    fn test_text_pages_keep_hyphen_without_space() {
        let pages = TextPages::from_text("under-\nstanding\n");
        let page = pages.page(0).unwrap();
        assert_eq!(page.tokens[0].text, "under-");
        assert_eq!(page.tokens[1].text, "standing ");
    }

    #[test]
    fn test_text_pages_skip_blank_lines() {
        let pages = TextPages::from_text("a\n\n   \nb\n");
        assert_eq!(pages.page(0).unwrap().tokens.len(), 2);
    }

    #[test]
    fn test_page_out_of_range() {
        let pages: Vec<Page> = vec![Page::default()];
        match pages.page(3) {
            Err(BackendError::PageOutOfRange { index, count }) => {
                assert_eq!(index, 3);
                assert_eq!(count, 1);
            }
            other => panic!("expected PageOutOfRange, got {:?}", other),
        }
    }
}
