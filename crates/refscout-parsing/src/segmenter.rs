use refscout_core::{BackendError, PageSource, Token};

use crate::locator::BibliographyStart;

/// All tokens of one numbered reference, marker token first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceGroup {
    pub tokens: Vec<Token>,
}

impl ReferenceGroup {
    /// Raw concatenation of the token texts.
    pub fn raw_text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

/// Segmentation state carried from one page to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentState {
    /// Number whose `[n]` marker opens the next group.
    pub next_number: usize,
    /// Tokens of the group currently being accumulated.
    pub open: Vec<Token>,
}

impl Default for SegmentState {
    fn default() -> Self {
        Self {
            next_number: 1,
            open: Vec::new(),
        }
    }
}

impl SegmentState {
    fn marker(&self) -> String {
        format!("[{}]", self.next_number)
    }
}

/// Feed one page's tokens through the segmenter.
///
/// Returns the advanced state together with every group closed on this
/// page. A token opens a new group only when it starts with the marker of
/// the next expected number, so stray `[k]` citations inside an entry stay
/// part of that entry.
pub fn segment_page(
    mut state: SegmentState,
    tokens: &[Token],
) -> (SegmentState, Vec<ReferenceGroup>) {
    let mut closed = Vec::new();
    let mut marker = state.marker();

    for token in tokens {
        if token.text.trim_start().starts_with(&marker) {
            let finished = std::mem::take(&mut state.open);
            if !finished.is_empty() {
                closed.push(ReferenceGroup { tokens: finished });
            }
            state.open.push(token.clone());
            state.next_number += 1;
            marker = state.marker();
        } else {
            state.open.push(token.clone());
        }
    }

    (state, closed)
}

/// Close the group still open at end of document, if any.
pub fn finish(state: SegmentState) -> Option<ReferenceGroup> {
    if state.open.is_empty() {
        None
    } else {
        Some(ReferenceGroup { tokens: state.open })
    }
}

/// Walk from `start` to the end of the document and split the token stream
/// into one group per numbered reference.
pub fn segment_references(
    source: &dyn PageSource,
    start: BibliographyStart,
) -> Result<Vec<ReferenceGroup>, BackendError> {
    let mut state = SegmentState::default();
    let mut groups = Vec::new();

    for page_index in start.page..source.page_count() {
        let page = source.page(page_index)?;
        let first = if page_index == start.page {
            start.token.min(page.tokens.len())
        } else {
            0
        };
        let (next, closed) = segment_page(state, &page.tokens[first..]);
        tracing::debug!(
            page = page_index,
            closed = closed.len(),
            next_number = next.next_number,
            "segmented page"
        );
        state = next;
        groups.extend(closed);
    }

    groups.extend(finish(state));
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use refscout_core::Page;

    fn tok(text: &str) -> Token {
        Token::new(text, true, "F1")
    }

    fn page(lines: &[&str]) -> Page {
        Page::new(lines.iter().map(|l| tok(l)).collect())
    }

    #[test]
    fn test_segment_page_splits_on_sequential_markers() {
        let tokens = vec![tok("[1] First "), tok("cont. "), tok("[2] Second "), tok("[3] Third ")];
        let (state, closed) = segment_page(SegmentState::default(), &tokens);
        assert_eq!(closed.len(), 2);
        assert_eq!(closed[0].raw_text(), "[1] First cont. ");
        assert_eq!(closed[1].raw_text(), "[2] Second ");
        assert_eq!(state.next_number, 4);
        assert_eq!(finish(state).unwrap().raw_text(), "[3] Third ");
    }

    #[test]
    fn test_out_of_sequence_marker_stays_in_group() {
        let tokens = vec![tok("[1] First see "), tok("[5] inline "), tok("[2] Second ")];
        let (state, closed) = segment_page(SegmentState::default(), &tokens);
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].tokens.len(), 2);
        assert_eq!(finish(state).unwrap().raw_text(), "[2] Second ");
    }

    #[test]
    fn test_state_carries_across_pages() {
        let pages = vec![
            page(&["body ", "[1] One ", "wraps "]),
            page(&["onto next page. ", "[2] Two "]),
        ];
        let start = BibliographyStart { page: 0, token: 1 };
        let groups = segment_references(&pages, start).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].raw_text(), "[1] One wraps onto next page. ");
        assert_eq!(groups[1].raw_text(), "[2] Two ");
    }

    #[test]
    fn test_group_count_matches_highest_marker() {
        let lines: Vec<String> = (1..=12).map(|n| format!("[{n}] Entry {n}. ")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let pages = vec![page(&refs[..5]), page(&refs[5..])];
        let groups =
            segment_references(&pages, BibliographyStart { page: 0, token: 0 }).unwrap();
        assert_eq!(groups.len(), 12);
        for (i, group) in groups.iter().enumerate() {
            let marker = format!("[{}]", i + 1);
            assert!(group.tokens[0].text.starts_with(&marker));
        }
    }

    #[test]
    fn test_marker_split_from_text_at_page_boundary() {
        let pages = vec![page(&["[1] One. "]), page(&["[2]", " Two. "])];
        let groups =
            segment_references(&pages, BibliographyStart { page: 0, token: 0 }).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].raw_text(), "[2] Two. ");
    }

    #[test]
    fn test_empty_tail_yields_nothing() {
        assert!(finish(SegmentState::default()).is_none());
    }
}
