use refscout_core::{ExtractionResult, ExtractionStats, PageSource, ParsedReference};

use crate::ParsingError;
use crate::cleaner::{self, CleanedReference};
use crate::config::ParsingConfig;
use crate::locator::{self, BibliographyStart};
use crate::segmenter::{self, ReferenceGroup};
use crate::tokenizer::{self, TokenizeOutcome};

/// A configurable bibliography extraction pipeline.
///
/// Holds a [`ParsingConfig`] and exposes each pipeline step as a method.
/// The default constructor uses built-in defaults; use
/// [`ReferenceExtractor::with_config`] to supply custom patterns.
pub struct ReferenceExtractor {
    config: ParsingConfig,
}

impl Default for ReferenceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceExtractor {
    pub fn new() -> Self {
        Self {
            config: ParsingConfig::default(),
        }
    }

    pub fn with_config(config: ParsingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    /// Find the token that opens the reference list (step 1).
    pub fn locate(&self, source: &dyn PageSource) -> Result<BibliographyStart, ParsingError> {
        locator::find_bibliography_start(source)?.ok_or(ParsingError::NoBibliography)
    }

    /// Split the token stream after `start` into numbered entries (step 2).
    pub fn segment(
        &self,
        source: &dyn PageSource,
        start: BibliographyStart,
    ) -> Result<Vec<ReferenceGroup>, ParsingError> {
        Ok(segmenter::segment_references(source, start)?)
    }

    /// Merge a group into font runs and strip marker and artifacts (step 3).
    pub fn clean(&self, group: &ReferenceGroup) -> CleanedReference {
        let merged = cleaner::merge_runs(group, self.config.dehyphenate());
        cleaner::clean(merged, &self.config)
    }

    /// Split one cleaned reference into fields (step 4).
    pub fn tokenize(&self, reference: &CleanedReference) -> TokenizeOutcome {
        tokenizer::tokenize_reference(reference, &self.config)
    }

    /// Run the full pipeline over a paged document.
    ///
    /// Fails only when the document has no `[1]` marker or the page source
    /// itself fails; references the tokenizer cannot split are still
    /// returned, with just their text.
    pub fn extract(&self, source: &dyn PageSource) -> Result<ExtractionResult, ParsingError> {
        let start = self.locate(source)?;
        tracing::info!(page = start.page, token = start.token, "bibliography located");

        let groups = self.segment(source, start)?;

        let mut stats = ExtractionStats {
            total: groups.len(),
            ..Default::default()
        };
        let mut references = Vec::with_capacity(groups.len());

        for group in &groups {
            let outcome = self.tokenize(&self.clean(group));
            let parsed = outcome.is_parsed();
            let reference = ParsedReference::from(outcome);

            if !parsed {
                stats.unparsed += 1;
            } else if reference.is_complete() {
                stats.parsed += 1;
            } else {
                stats.incomplete += 1;
            }
            references.push(reference);
        }

        tracing::info!(
            total = stats.total,
            parsed = stats.parsed,
            incomplete = stats.incomplete,
            unparsed = stats.unparsed,
            "extraction finished"
        );

        Ok(ExtractionResult { references, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParsingConfigBuilder;
    use refscout_core::{Page, Token};

    fn page(lines: &[&str]) -> Page {
        Page::new(lines.iter().map(|l| Token::new(*l, true, "F1")).collect())
    }

    #[test]
    fn test_locate_missing_bibliography() {
        let pages = vec![page(&["Only body text. "])];
        let err = ReferenceExtractor::new().locate(&pages).unwrap_err();
        assert!(matches!(err, ParsingError::NoBibliography));
        assert_eq!(err.to_string(), "Citations section was not found");
    }

    #[test]
    fn test_clean_and_tokenize_one_group() {
        let ext = ReferenceExtractor::new();
        let group = ReferenceGroup {
            tokens: vec![
                Token::new("[1] Conover MB. Understanding electro-", true, "F1"),
                Token::new("cardiography. Springer, ", true, "F1"),
            ],
        };
        let cleaned = ext.clean(&group);
        assert_eq!(
            cleaned.original_text,
            "Conover MB. Understanding electrocardiography. Springer,"
        );
        let r = ParsedReference::from(ext.tokenize(&cleaned));
        assert_eq!(r.title, "Understanding electrocardiography");
    }

    #[test]
    fn test_extract_counts_outcomes() {
        let pages = vec![page(&[
            "References ",
            "[1] Conover MB. Understanding electrocardiography. Springer, ",
            "[2] no punctuation at all ",
            "[3] Smith J. A title only. ",
        ])];
        let result = ReferenceExtractor::new().extract(&pages).unwrap();
        assert_eq!(result.stats.total, 3);
        assert_eq!(result.stats.parsed, 1);
        assert_eq!(result.stats.unparsed, 1);
        assert_eq!(result.stats.incomplete, 1);
        assert_eq!(result.references[1].original_text, "no punctuation at all");
    }

    #[test]
    fn test_extract_without_dehyphenation() {
        let config = ParsingConfigBuilder::new().dehyphenate(false).build().unwrap();
        let pages = vec![page(&[
            "[1] Conover MB. Understanding electro-",
            "cardiography. Springer, ",
        ])];
        let result = ReferenceExtractor::with_config(config).extract(&pages).unwrap();
        assert_eq!(result.references[0].title, "Understanding electro-cardiography");
    }

    #[test]
    fn test_with_config_is_kept() {
        let config = ParsingConfigBuilder::new().dehyphenate(false).build().unwrap();
        assert!(!ReferenceExtractor::with_config(config).config().dehyphenate());
        assert!(ReferenceExtractor::new().config().dehyphenate());
    }
}
