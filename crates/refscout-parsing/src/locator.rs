use refscout_core::{BackendError, PageSource};

/// Literal that opens a numbered reference list.
pub const FIRST_MARKER: &str = "[1]";

/// Position of the token that opens the bibliography.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BibliographyStart {
    pub page: usize,
    pub token: usize,
}

/// Locate the `[1]` that opens the reference list.
///
/// Pages are scanned last to first and tokens bottom to top: reference
/// lists close the document, and in-body citations that also render as
/// `[1]` sit earlier. Returns `Ok(None)` when no page has such a token.
pub fn find_bibliography_start(
    source: &dyn PageSource,
) -> Result<Option<BibliographyStart>, BackendError> {
    for page_index in (0..source.page_count()).rev() {
        let page = source.page(page_index)?;
        let hit = page
            .tokens
            .iter()
            .rposition(|t| t.text.trim().starts_with(FIRST_MARKER));
        if let Some(token) = hit {
            return Ok(Some(BibliographyStart {
                page: page_index,
                token,
            }));
        }
    }
    Ok(None)
}
