use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub parsing: Option<ParsingSection>,
    pub lookup: Option<LookupSection>,
    pub display: Option<DisplaySection>,
    pub pdf: Option<PdfSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsingSection {
    /// Extra trailing-artifact regexes, appended to the built-in ones.
    pub trailing_artifacts: Option<Vec<String>>,
    pub dehyphenate: Option<bool>,
    /// Replaces the `[n]` marker pattern stripped from each reference.
    pub marker_pattern: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupSection {
    pub openalex_url: Option<String>,
    pub mailto: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplaySection {
    pub color: Option<bool>,
}

/// Page-band exclusion for the PDF text layer, as fractions of page height.
/// `0.0` keeps the whole band.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfSection {
    pub header_exclusion: Option<f32>,
    pub footer_exclusion: Option<f32>,
}

/// Platform config directory path: `<config_dir>/refscout/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("refscout").join("config.toml"))
}

/// Load config by cascading CWD `.refscout.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".refscout.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let pick = |o: Option<&ParsingSection>, b: Option<&ParsingSection>| ParsingSection {
        trailing_artifacts: o
            .and_then(|p| p.trailing_artifacts.clone())
            .or_else(|| b.and_then(|p| p.trailing_artifacts.clone())),
        dehyphenate: o
            .and_then(|p| p.dehyphenate)
            .or_else(|| b.and_then(|p| p.dehyphenate)),
        marker_pattern: o
            .and_then(|p| p.marker_pattern.clone())
            .or_else(|| b.and_then(|p| p.marker_pattern.clone())),
    };

    ConfigFile {
        parsing: Some(pick(overlay.parsing.as_ref(), base.parsing.as_ref())),
        lookup: Some(LookupSection {
            openalex_url: overlay
                .lookup
                .as_ref()
                .and_then(|l| l.openalex_url.clone())
                .or_else(|| base.lookup.as_ref().and_then(|l| l.openalex_url.clone())),
            mailto: overlay
                .lookup
                .as_ref()
                .and_then(|l| l.mailto.clone())
                .or_else(|| base.lookup.as_ref().and_then(|l| l.mailto.clone())),
            timeout_secs: overlay
                .lookup
                .as_ref()
                .and_then(|l| l.timeout_secs)
                .or_else(|| base.lookup.as_ref().and_then(|l| l.timeout_secs)),
        }),
        display: Some(DisplaySection {
            color: overlay
                .display
                .as_ref()
                .and_then(|d| d.color)
                .or_else(|| base.display.as_ref().and_then(|d| d.color)),
        }),
        pdf: Some(PdfSection {
            header_exclusion: overlay
                .pdf
                .as_ref()
                .and_then(|p| p.header_exclusion)
                .or_else(|| base.pdf.as_ref().and_then(|p| p.header_exclusion)),
            footer_exclusion: overlay
                .pdf
                .as_ref()
                .and_then(|p| p.footer_exclusion)
                .or_else(|| base.pdf.as_ref().and_then(|p| p.footer_exclusion)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_parses() {
        let toml_str = "[lookup]\nmailto = \"me@example.org\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let lookup = parsed.lookup.unwrap();
        assert_eq!(lookup.mailto.as_deref(), Some("me@example.org"));
        assert!(lookup.openalex_url.is_none());
        assert!(parsed.parsing.is_none());
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigFile {
            parsing: Some(ParsingSection {
                trailing_artifacts: Some(vec![r"(?i)\.\s*pp\s*$".to_string()]),
                dehyphenate: Some(false),
                marker_pattern: None,
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_merge_overlay_wins() {
        let base = ConfigFile {
            lookup: Some(LookupSection {
                openalex_url: Some("https://base.example".into()),
                timeout_secs: Some(30),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            lookup: Some(LookupSection {
                openalex_url: Some("https://overlay.example".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).lookup.unwrap();
        assert_eq!(merged.openalex_url.as_deref(), Some("https://overlay.example"));
        assert_eq!(merged.timeout_secs, Some(30));
    }

    #[test]
    fn test_merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            parsing: Some(ParsingSection {
                dehyphenate: Some(false),
                ..Default::default()
            }),
            display: Some(DisplaySection { color: Some(false) }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(merged.parsing.unwrap().dehyphenate, Some(false));
        assert_eq!(merged.display.unwrap().color, Some(false));
    }

    #[test]
    fn test_pdf_and_marker_sections_parse_and_merge() {
        let base: ConfigFile = toml::from_str(
            "[pdf]\nheader_exclusion = 0.1\nfooter_exclusion = 0.0\n[parsing]\nmarker_pattern = '^\\(\\d+\\)'\n",
        )
        .unwrap();
        let overlay: ConfigFile = toml::from_str("[pdf]\nfooter_exclusion = 0.08\n").unwrap();
        let merged = merge(base, overlay);
        let pdf = merged.pdf.unwrap();
        assert_eq!(pdf.header_exclusion, Some(0.1));
        assert_eq!(pdf.footer_exclusion, Some(0.08));
        assert_eq!(
            merged.parsing.unwrap().marker_pattern.as_deref(),
            Some(r"^\(\d+\)")
        );
    }

    #[test]
    fn test_load_missing_file_is_none() {
        assert!(load_from_path(Path::new("/nonexistent/refscout/config.toml")).is_none());
    }
}
