use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ParsingConfig;
use crate::segmenter::ReferenceGroup;

/// Default marker pattern: `[12]` plus any whitespace after it.
static MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\[\d+\]\s*").unwrap());

/// A run ending in ". In" is a venue intro ("In: Proceedings ...") wrapped onto
/// the next line; it is cut back to the dot.
static DEFAULT_TRAILING_ARTIFACTS: Lazy<Vec<Regex>> =
    Lazy::new(|| vec![Regex::new(r"(?i)\.\s*in\s*$").unwrap()]);

static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Text of consecutive tokens sharing one font, up to a line break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub font_id: String,
    pub text: String,
}

/// A reference group folded into font runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedLine {
    pub runs: Vec<Run>,
}

impl MergedLine {
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Merged runs after marker and artifact cleanup, ready for the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedReference {
    pub runs: Vec<Run>,
    /// Display text: marker stripped, whitespace collapsed and trimmed,
    /// artifacts kept. Unlike [`MergedLine::text`] this is not an exact
    /// concatenation of the run texts.
    pub original_text: String,
}

/// Fold a group's tokens into runs.
///
/// A new run starts when the font changes or after a line break. A
/// line-ending token that ends in `-` loses the hyphen and the next token
/// continues the same run (when `dehyphenate` is set). No separator is
/// inserted: tokens carry their own spacing.
pub fn merge_runs(group: &ReferenceGroup, dehyphenate: bool) -> MergedLine {
    let mut runs = Vec::new();
    let mut open: Option<Run> = None;
    let mut pending_hyphen = false;

    for token in &group.tokens {
        if pending_hyphen {
            if let Some(run) = open.as_mut() {
                run.text.pop();
            }
            pending_hyphen = false;
        }

        match open.as_mut() {
            Some(run) if run.font_id == token.font_id => run.text.push_str(&token.text),
            _ => {
                runs.extend(open.take());
                open = Some(Run {
                    font_id: token.font_id.clone(),
                    text: token.text.clone(),
                });
            }
        }

        if token.ends_line {
            if dehyphenate && token.text.ends_with('-') {
                pending_hyphen = true;
            } else {
                runs.extend(open.take());
            }
        }
    }

    runs.extend(open);
    MergedLine { runs }
}

/// Remove the leading `[n]` marker. Applying it twice changes nothing.
pub fn strip_marker(text: &str, config: &ParsingConfig) -> String {
    let re = config.marker_strip_re.as_ref().unwrap_or(&MARKER_RE);
    re.replace(text, "").into_owned()
}

/// Cut a run back to the dot that starts a trailing artifact.
fn truncate_artifacts(text: &mut String, patterns: &[Regex]) {
    for re in patterns {
        if let Some(m) = re.find(text) {
            let keep = if text[m.start()..].starts_with('.') {
                m.start() + 1
            } else {
                m.start()
            };
            text.truncate(keep);
        }
    }
}

/// Strip the marker from the first run and truncate trailing artifacts.
/// Runs are rewritten in place; none are added, removed or reordered.
pub fn clean(merged: MergedLine, config: &ParsingConfig) -> CleanedReference {
    let mut runs = merged.runs;

    if let Some(first) = runs.first_mut() {
        first.text = strip_marker(&first.text, config);
    }

    let joined: String = runs.iter().map(|r| r.text.as_str()).collect();
    let original_text = WS_RE.replace_all(joined.trim(), " ").into_owned();

    let patterns = config
        .trailing_artifacts
        .resolve(&DEFAULT_TRAILING_ARTIFACTS);
    for run in &mut runs {
        truncate_artifacts(&mut run.text, &patterns);
    }

    CleanedReference {
        runs,
        original_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParsingConfigBuilder;
    use refscout_core::Token;

    fn group(tokens: &[(&str, bool, &str)]) -> ReferenceGroup {
        ReferenceGroup {
            tokens: tokens
                .iter()
                .map(|(t, e, f)| Token::new(*t, *e, *f))
                .collect(),
        }
    }

    #[test]
    fn test_merge_same_font_within_line() {
        let g = group(&[("[1] Conover, ", false, "R"), ("Mary. ", true, "R")]);
        let merged = merge_runs(&g, true);
        assert_eq!(merged.runs.len(), 1);
        assert_eq!(merged.runs[0].text, "[1] Conover, Mary. ");
    }

    #[test]
    fn test_font_change_starts_new_run() {
        let g = group(&[
            ("Conover, Mary. ", false, "R"),
            ("Understanding electrocardiography", false, "I"),
            (". Springer, ", true, "R"),
        ]);
        let merged = merge_runs(&g, true);
        let fonts: Vec<&str> = merged.runs.iter().map(|r| r.font_id.as_str()).collect();
        assert_eq!(fonts, vec!["R", "I", "R"]);
    }

    #[test]
    fn test_line_break_starts_new_run() {
        let g = group(&[("Title. In ", true, "R"), ("Proceedings, ", true, "R")]);
        let merged = merge_runs(&g, true);
        assert_eq!(merged.runs.len(), 2);
    }

    #[test]
    fn test_hyphenated_line_end_joins() {
        let g = group(&[("Understanding electro-", true, "R"), ("cardiography. ", true, "R")]);
        let merged = merge_runs(&g, true);
        assert_eq!(merged.runs.len(), 1);
        assert_eq!(merged.runs[0].text, "Understanding electrocardiography. ");
    }

    #[test]
    fn test_dehyphenation_disabled_keeps_hyphen() {
        let g = group(&[("electro-", true, "R"), ("cardiography. ", true, "R")]);
        let merged = merge_runs(&g, false);
        assert_eq!(merged.text(), "electro-cardiography. ");
        assert_eq!(merged.runs.len(), 2);
    }

    #[test]
    fn test_trailing_hyphen_on_last_token_kept() {
        let g = group(&[("pp. 1-", true, "R")]);
        assert_eq!(merge_runs(&g, true).text(), "pp. 1-");
    }

    #[test]
    fn test_merge_round_trip_without_hyphens() {
        let g = group(&[
            ("[3] Sel, A., ", false, "R"),
            ("Azevedo, R. T. ", true, "R"),
            ("Heartfelt self", false, "I"),
            (". Proc. B, ", true, "R"),
            ("284, 2017. ", true, "R"),
        ]);
        assert_eq!(merge_runs(&g, true).text(), g.raw_text());
    }

    #[test]
    fn test_strip_marker_idempotent() {
        let config = ParsingConfig::default();
        let once = strip_marker("[12]   Conover, M. B. (2002).", &config);
        assert_eq!(once, "Conover, M. B. (2002).");
        assert_eq!(strip_marker(&once, &config), once);
    }

    #[test]
    fn test_custom_marker_pattern() {
        let config = ParsingConfigBuilder::new()
            .marker_strip_regex(r"^\s*\(\d+\)\s*")
            .build()
            .unwrap();
        assert_eq!(strip_marker("(3) Doe, J.", &config), "Doe, J.");
        assert_eq!(strip_marker("[3] Doe, J.", &config), "[3] Doe, J.");

        let merged = MergedLine {
            runs: vec![Run { font_id: "R".into(), text: "(3)  Doe, J. A title. ".into() }],
        };
        assert_eq!(clean(merged, &config).original_text, "Doe, J. A title.");
    }

    #[test]
    fn test_clean_strips_marker_only_from_first_run() {
        let merged = MergedLine {
            runs: vec![
                Run { font_id: "R".into(), text: "[4] Einstein, A. ".into() },
                Run { font_id: "R".into(), text: "[5] cited inline ".into() },
            ],
        };
        let cleaned = clean(merged, &ParsingConfig::default());
        assert_eq!(cleaned.runs[0].text, "Einstein, A. ");
        assert_eq!(cleaned.runs[1].text, "[5] cited inline ");
    }

    #[test]
    fn test_clean_truncates_in_artifact() {
        let merged = MergedLine {
            runs: vec![
                Run { font_id: "R".into(), text: "[1] Doe, J. Some title. In ".into() },
                Run { font_id: "R".into(), text: "Proceedings of X, 2020. ".into() },
            ],
        };
        let cleaned = clean(merged, &ParsingConfig::default());
        assert_eq!(cleaned.runs.len(), 2);
        assert_eq!(cleaned.runs[0].text, "Doe, J. Some title.");
        assert_eq!(
            cleaned.original_text,
            "Doe, J. Some title. In Proceedings of X, 2020."
        );
    }

    #[test]
    fn test_clean_artifact_is_case_insensitive() {
        let merged = MergedLine {
            runs: vec![Run { font_id: "R".into(), text: "Title .IN".into() }],
        };
        let cleaned = clean(merged, &ParsingConfig::default());
        assert_eq!(cleaned.runs[0].text, "Title .");
    }

    #[test]
    fn test_clean_leaves_words_ending_in_in() {
        let merged = MergedLine {
            runs: vec![Run { font_id: "R".into(), text: "Springer, Berlin ".into() }],
        };
        let cleaned = clean(merged, &ParsingConfig::default());
        assert_eq!(cleaned.runs[0].text, "Springer, Berlin ");
    }

    #[test]
    fn test_custom_trailing_artifact() {
        let config = ParsingConfigBuilder::new()
            .add_trailing_artifact(r"(?i)\.\s*pp\s*$".to_string())
            .build()
            .unwrap();
        let merged = MergedLine {
            runs: vec![
                Run { font_id: "R".into(), text: "Venue. pp ".into() },
                Run { font_id: "R".into(), text: "Title. In ".into() },
            ],
        };
        let cleaned = clean(merged, &config);
        assert_eq!(cleaned.runs[0].text, "Venue.");
        assert_eq!(cleaned.runs[1].text, "Title.");
    }
}
