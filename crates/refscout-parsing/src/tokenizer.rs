use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use refscout_core::ParsedReference;

use crate::cleaner::{CleanedReference, Run};
use crate::config::ParsingConfig;
use crate::cursor::Cursor;
use crate::style::{self, CitationStyle};

/// A year segment: four digits, optionally disambiguated (`2017a`).
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}[a-z]?$").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("reference has no text")]
    EmptyInput,
    #[error("no delimiter closes the {0} field")]
    MissingDelimiter(&'static str),
}

/// Fields recovered from one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFields {
    pub style: CitationStyle,
    pub authors: String,
    pub year: Option<String>,
    pub title: String,
    pub venue: String,
}

/// Result of tokenizing one reference. Never an error: a reference the
/// tokenizer gives up on is still reported with its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizeOutcome {
    Parsed {
        fields: ReferenceFields,
        original_text: String,
    },
    Unparsed {
        original_text: String,
        reason: TokenizeError,
    },
}

impl TokenizeOutcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed { .. })
    }
}

impl From<TokenizeOutcome> for ParsedReference {
    fn from(outcome: TokenizeOutcome) -> Self {
        match outcome {
            TokenizeOutcome::Parsed {
                fields,
                original_text,
            } => ParsedReference {
                original_text,
                authors: fields.authors,
                title: fields.title,
                venue: fields.venue,
                year: fields.year,
            },
            TokenizeOutcome::Unparsed { original_text, .. } => {
                ParsedReference::unparsed(original_text)
            }
        }
    }
}

/// State machine splitting a cleaned reference into authors, year, title and
/// venue.
///
/// Stages run in a fixed order over one forward-only [`Cursor`]:
/// 1. authors, with the boundary chosen by [`CitationStyle`];
/// 2. an optional year (`(2011, September).`, `, 2002.`, `2017.`);
/// 3. the title, closed by the next dot;
/// 4. the venue, closed by the next comma or end of text.
pub struct FieldTokenizer<'a> {
    cursor: Cursor,
    config: &'a ParsingConfig,
}

impl<'a> FieldTokenizer<'a> {
    pub fn new(runs: &[Run], config: &'a ParsingConfig) -> Self {
        Self {
            cursor: Cursor::new(runs.iter().map(|r| r.text.as_str())),
            config,
        }
    }

    pub fn tokenize(mut self) -> Result<ReferenceFields, TokenizeError> {
        self.cursor.skip_whitespace();
        if self.cursor.is_at_end() {
            return Err(TokenizeError::EmptyInput);
        }

        let style = CitationStyle::classify(self.cursor.ahead());
        let authors = self.parse_authors(style)?;
        self.cursor.consume();

        let year = self.parse_year();
        self.cursor.skip_whitespace();

        let title = self.cursor.consume_until(|_, c| c == '.');
        self.cursor.consume();
        self.cursor.skip_whitespace();

        let venue = self.cursor.consume_until(|_, c| c == ',');

        Ok(ReferenceFields {
            style,
            authors: authors.trim().to_string(),
            year,
            title: title.trim().to_string(),
            venue: venue.trim().to_string(),
        })
    }

    /// Consume the author list. On success the cursor rests on the stop that
    /// closes it.
    fn parse_authors(&mut self, style: CitationStyle) -> Result<String, TokenizeError> {
        let authors = match style {
            CitationStyle::MlaChicago => self.mla_authors(),
            _ => self.consume_by_rules(style.author_boundaries()),
        };

        match authors {
            Some(authors) if self.cursor.peek().is_some_and(style::is_stop) => Ok(authors),
            _ => Err(TokenizeError::MissingDelimiter("authors")),
        }
    }

    fn consume_by_rules(&mut self, rules: &[style::Boundary]) -> Option<String> {
        let at = rules
            .iter()
            .find_map(|&rule| style::find_boundary(self.cursor.ahead(), rule))?;
        let taken = self.cursor.consume_n(at);
        tracing::trace!(position = ?self.cursor.position(), "field boundary");
        Some(taken)
    }

    /// `Surname, Given.` alone, or followed by `, Other Name, and Last Name.`
    fn mla_authors(&mut self) -> Option<String> {
        let mut authors = self.cursor.consume_until(|_, c| c == ',');
        authors.push_str(&self.cursor.consume_until(|_, c| c == '.'));

        if self.cursor.ahead().get(1) != Some(&',') {
            return Some(authors);
        }

        let rest = self.consume_by_rules(CitationStyle::MlaChicago.author_boundaries())?;
        authors.push_str(&rest);
        Some(authors)
    }

    /// Take the year if the text before the next dot is one. Leaves the
    /// cursor untouched otherwise.
    fn parse_year(&mut self) -> Option<String> {
        let incoming = self.cursor.peek_until(|_, c| c == '.');
        let unbracketed: String = incoming.chars().filter(|c| !matches!(c, '(' | ')')).collect();
        let candidate = unbracketed.trim().trim_start_matches(',').trim();
        let first = candidate.split(',').next().unwrap_or_default().trim();

        let year_re = self.config.year_re.as_ref().unwrap_or(&YEAR_RE);
        if !year_re.is_match(first) {
            return None;
        }

        let year = candidate.to_string();
        self.cursor.consume_until(|_, c| c == '.');
        self.cursor.consume();
        Some(year)
    }
}

/// Tokenize a cleaned reference, degrading to an unparsed record on failure.
pub fn tokenize_reference(reference: &CleanedReference, config: &ParsingConfig) -> TokenizeOutcome {
    match FieldTokenizer::new(&reference.runs, config).tokenize() {
        Ok(fields) => {
            tracing::debug!(style = %fields.style, title = %fields.title, "tokenized reference");
            TokenizeOutcome::Parsed {
                fields,
                original_text: reference.original_text.clone(),
            }
        }
        Err(reason) => {
            tracing::warn!(%reason, text = %reference.original_text, "reference left unparsed");
            TokenizeOutcome::Unparsed {
                original_text: reference.original_text.clone(),
                reason,
            }
        }
    }
}

/// Tokenize a single already-cleaned reference string.
pub fn parse_reference_text(text: &str, config: &ParsingConfig) -> TokenizeOutcome {
    let reference = CleanedReference {
        runs: vec![Run {
            font_id: String::new(),
            text: text.to_string(),
        }],
        original_text: text.trim().to_string(),
    };
    tokenize_reference(&reference, config)
}
