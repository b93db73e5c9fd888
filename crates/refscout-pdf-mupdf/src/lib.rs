use std::path::Path;

use mupdf::{Document, TextPageFlags};

use refscout_core::{BackendError, Page, PageSource, PdfBackend, Token};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so that the parsing pipeline does not transitively
/// depend on it.
///
/// By default, text in the bottom 5% of each page (footers) and top 4%
/// (headers) is excluded so running heads and page numbers do not end up
/// inside a reference that spans a page break.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MupdfBackend {
    /// Fraction of page height from bottom to exclude as footer (0.0–1.0).
    /// Default 0.05. `None` disables footer exclusion.
    footer_exclusion_ratio: Option<f32>,
    /// Fraction of page height from top to exclude as header (0.0–1.0).
    /// Default 0.04. `None` disables header exclusion.
    header_exclusion_ratio: Option<f32>,
}

impl Default for MupdfBackend {
    fn default() -> Self {
        Self {
            footer_exclusion_ratio: Some(0.05),
            header_exclusion_ratio: Some(0.04),
        }
    }
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of page height dropped at the bottom. `0.0` keeps footers.
    pub fn with_footer_exclusion(self, ratio: f32) -> Self {
        Self {
            footer_exclusion_ratio: band_ratio(ratio),
            ..self
        }
    }

    /// Fraction of page height dropped at the top. `0.0` keeps headers.
    pub fn with_header_exclusion(self, ratio: f32) -> Self {
        Self {
            header_exclusion_ratio: band_ratio(ratio),
            ..self
        }
    }

    fn band(&self, y0: f32, y1: f32) -> TextBand {
        TextBand::new(y0, y1, self.header_exclusion_ratio, self.footer_exclusion_ratio)
    }
}

/// Ratios outside `(0, 1)` disable the band.
fn band_ratio(ratio: f32) -> Option<f32> {
    (ratio > 0.0 && ratio < 1.0).then_some(ratio)
}

impl PdfBackend for MupdfBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PageSource>, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;
        let page_count = document
            .page_count()
            .map_err(|e| BackendError::OpenError(e.to_string()))?;

        tracing::debug!(path = %path.display(), pages = page_count, "opened PDF");

        Ok(Box::new(MupdfPages {
            document,
            page_count: usize::try_from(page_count).unwrap_or(0),
            settings: *self,
        }))
    }
}

/// An open document; pages are decoded on every [`PageSource::page`] call.
struct MupdfPages {
    document: Document,
    page_count: usize,
    settings: MupdfBackend,
}

impl PageSource for MupdfPages {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page(&self, index: usize) -> Result<Page, BackendError> {
        if index >= self.page_count {
            return Err(BackendError::PageOutOfRange {
                index,
                count: self.page_count,
            });
        }
        let page_no =
            i32::try_from(index).map_err(|e| BackendError::ExtractionError(e.to_string()))?;

        let page = self
            .document
            .load_page(page_no)
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

        let bounds = page
            .bounds()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        let band = self.settings.band(bounds.y0, bounds.y1);

        let mut tokens = Vec::new();
        for block in text_page.blocks() {
            let rect = block.bounds();
            if !band.keeps(rect.y0, rect.y1) {
                continue;
            }

            for line in block.lines() {
                tokens.extend(line_tokens(
                    line.chars()
                        .map(|c| (c.char().unwrap_or('\u{FFFD}'), c.size())),
                ));
            }
        }

        Ok(Page::new(tokens))
    }
}

/// Vertical span of a page whose blocks are kept; blocks lying wholly in
/// the header band or starting in the footer band are dropped.
#[derive(Debug, Clone, Copy)]
struct TextBand {
    top: Option<f32>,
    bottom: Option<f32>,
}

impl TextBand {
    fn new(y0: f32, y1: f32, header: Option<f32>, footer: Option<f32>) -> Self {
        let height = y1 - y0;
        Self {
            top: header.map(|r| y0 + height * r),
            bottom: footer.map(|r| y1 - height * r),
        }
    }

    fn keeps(&self, block_y0: f32, block_y1: f32) -> bool {
        let below_header = self.top.is_none_or(|top| block_y1 > top);
        let above_footer = self.bottom.is_none_or(|bottom| block_y0 < bottom);
        below_header && above_footer
    }
}

/// Font identity of a glyph. The text layer exposes no stable font name per
/// glyph, so the rendered size stands in for it.
fn font_id(size: f32) -> String {
    format!("{size:.1}")
}

/// Split one text line into tokens at every font change.
///
/// The last token ends the line and carries one trailing space unless it
/// ends in `-`. Blank lines produce no tokens.
fn line_tokens(glyphs: impl IntoIterator<Item = (char, f32)>) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();

    for (c, size) in glyphs {
        let font = font_id(size);
        match tokens.last_mut() {
            Some(token) if token.font_id == font => token.text.push(c),
            _ => tokens.push(Token::new(c.to_string(), false, font)),
        }
    }

    while tokens.last().is_some_and(|t| t.text.trim().is_empty()) {
        tokens.pop();
    }

    if let Some(last) = tokens.last_mut() {
        let trimmed = last.text.trim_end().len();
        last.text.truncate(trimmed);
        if !last.text.ends_with('-') {
            last.text.push(' ');
        }
        last.ends_line = true;
    }

    tokens
}
