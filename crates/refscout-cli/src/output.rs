use std::io::Write;

use owo_colors::OwoColorize;
use refscout_core::{ExtractionStats, ParsedReference, WorkCandidate};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Longest raw citation shown before it is cut with an ellipsis.
const RAW_DISPLAY_CHARS: usize = 200;

/// Print the line that opens a document's listing.
pub fn print_header(
    w: &mut dyn Write,
    file_name: &str,
    stats: &ExtractionStats,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(
            w,
            "{} {} ({} references segmented)\n",
            "EXTRACT:".bold().cyan(),
            file_name.bold(),
            stats.total
        )
    } else {
        writeln!(
            w,
            "EXTRACT: {} ({} references segmented)\n",
            file_name, stats.total
        )
    }
}

/// Print one reference with its fields. `index` is 0-based.
pub fn print_reference(
    w: &mut dyn Write,
    index: usize,
    reference: &ParsedReference,
    color: ColorMode,
) -> std::io::Result<()> {
    let label = format!("[{}]", index + 1);
    if color.enabled() {
        writeln!(w, "{}", label.bold().yellow())?;
    } else {
        writeln!(w, "{}", label)?;
    }

    if reference.is_unparsed() {
        if color.enabled() {
            writeln!(w, "  {}", "UNPARSED".red())?;
        } else {
            writeln!(w, "  UNPARSED")?;
        }
    } else {
        writeln!(w, "  Authors: {}", or_none(&reference.authors))?;
        if let Some(ref year) = reference.year {
            writeln!(w, "  Year:    {}", year)?;
        }
        writeln!(w, "  Title:   {}", or_none(&reference.title))?;
        writeln!(w, "  Venue:   {}", or_none(&reference.venue))?;
    }

    let raw = truncate_chars(&reference.original_text, RAW_DISPLAY_CHARS);
    if color.enabled() {
        writeln!(w, "  Raw:     {}", raw.dimmed())?;
    } else {
        writeln!(w, "  Raw:     {}", raw)?;
    }
    Ok(())
}

/// Print the works a title lookup returned, best match first.
pub fn print_candidates(
    w: &mut dyn Write,
    service: &str,
    candidates: &[WorkCandidate],
    color: ColorMode,
) -> std::io::Result<()> {
    if candidates.is_empty() {
        if color.enabled() {
            writeln!(w, "  {} ({})", "NOT FOUND".red(), service)?;
        } else {
            writeln!(w, "  NOT FOUND ({})", service)?;
        }
        return Ok(());
    }

    for candidate in candidates {
        let year = candidate
            .publication_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "n.d.".to_string());
        if color.enabled() {
            writeln!(
                w,
                "  {} {} ({}, cited by {})",
                "->".green(),
                candidate.display_name,
                year,
                candidate.cited_by_count
            )?;
        } else {
            writeln!(
                w,
                "  -> {} ({}, cited by {})",
                candidate.display_name, year, candidate.cited_by_count
            )?;
        }
    }
    Ok(())
}

/// Print a lookup failure for one reference without aborting the run.
pub fn print_lookup_error(
    w: &mut dyn Write,
    service: &str,
    message: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "  {} {}: {}", "WARNING:".yellow(), service, message)
    } else {
        writeln!(w, "  WARNING: {}: {}", service, message)
    }
}

/// Print the closing totals line.
pub fn print_summary(
    w: &mut dyn Write,
    stats: &ExtractionStats,
    color: ColorMode,
) -> std::io::Result<()> {
    let line = format!(
        "Total: {} references ({} parsed, {} incomplete, {} unparsed)",
        stats.total, stats.parsed, stats.incomplete, stats.unparsed
    );
    if color.enabled() {
        writeln!(w, "{}", line.bold())
    } else {
        writeln!(w, "{}", line)
    }
}

fn or_none(field: &str) -> &str {
    if field.is_empty() { "(none)" } else { field }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut dyn Write) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn reference() -> ParsedReference {
        ParsedReference {
            original_text: "Conover MB. Understanding electrocardiography. Springer,".into(),
            authors: "Conover MB".into(),
            title: "Understanding electrocardiography".into(),
            venue: "Springer".into(),
            year: None,
        }
    }

    #[test]
    fn test_print_reference_plain() {
        let out = render(|w| print_reference(w, 0, &reference(), ColorMode(false)));
        assert!(out.starts_with("[1]\n"));
        assert!(out.contains("  Authors: Conover MB\n"));
        assert!(out.contains("  Venue:   Springer\n"));
        assert!(!out.contains("Year:"));
    }

    #[test]
    fn test_print_unparsed_reference() {
        let r = ParsedReference::unparsed("no punctuation here");
        let out = render(|w| print_reference(w, 4, &r, ColorMode(false)));
        assert!(out.contains("[5]"));
        assert!(out.contains("UNPARSED"));
        assert!(out.contains("Raw:     no punctuation here"));
    }

    #[test]
    fn test_print_candidates_plain() {
        let candidates = vec![WorkCandidate {
            id: "https://openalex.org/W1".into(),
            display_name: "Understanding Electrocardiography".into(),
            publication_year: Some(2003),
            cited_by_count: 42,
        }];
        let out = render(|w| print_candidates(w, "OpenAlex", &candidates, ColorMode(false)));
        assert_eq!(out, "  -> Understanding Electrocardiography (2003, cited by 42)\n");
        let none = render(|w| print_candidates(w, "OpenAlex", &[], ColorMode(false)));
        assert_eq!(none, "  NOT FOUND (OpenAlex)\n");
    }

    #[test]
    fn test_print_summary_plain() {
        let stats = ExtractionStats {
            total: 5,
            parsed: 3,
            incomplete: 1,
            unparsed: 1,
        };
        let out = render(|w| print_summary(w, &stats, ColorMode(false)));
        assert_eq!(
            out,
            "Total: 5 references (3 parsed, 1 incomplete, 1 unparsed)\n"
        );
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("Müller", 3), "Mül...");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
