use regex::Regex;

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// Configuration for the reference extraction pipeline.
///
/// Regex fields set to `None` fall back to the built-in patterns.
/// Use [`ParsingConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── cleaner.rs ──
    /// Leading marker stripped from the first run of every reference.
    pub(crate) marker_strip_re: Option<Regex>,
    /// Run-ending artifacts truncated back to their leading dot.
    pub(crate) trailing_artifacts: ListOverride<Regex>,
    /// Drop the hyphen of a line-ending token and join the next line.
    pub(crate) dehyphenate: bool,

    // ── tokenizer.rs ──
    /// Pattern a comma-segment must match to count as a year.
    pub(crate) year_re: Option<Regex>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            marker_strip_re: None,
            trailing_artifacts: ListOverride::Default,
            dehyphenate: true,
            year_re: None,
        }
    }
}

impl ParsingConfig {
    pub fn dehyphenate(&self) -> bool {
        self.dehyphenate
    }
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    marker_strip_re: Option<String>,
    trailing_artifacts: ListOverride<String>,
    dehyphenate: Option<bool>,
    year_re: Option<String>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker_strip_regex(mut self, pattern: &str) -> Self {
        self.marker_strip_re = Some(pattern.to_string());
        self
    }

    pub fn set_trailing_artifacts(mut self, patterns: Vec<String>) -> Self {
        self.trailing_artifacts = ListOverride::Replace(patterns);
        self
    }

    pub fn add_trailing_artifact(mut self, pattern: String) -> Self {
        match &mut self.trailing_artifacts {
            ListOverride::Extend(v) | ListOverride::Replace(v) => v.push(pattern),
            ListOverride::Default => self.trailing_artifacts = ListOverride::Extend(vec![pattern]),
        }
        self
    }

    pub fn dehyphenate(mut self, enabled: bool) -> Self {
        self.dehyphenate = Some(enabled);
        self
    }

    pub fn year_regex(mut self, pattern: &str) -> Self {
        self.year_re = Some(pattern.to_string());
        self
    }

    /// Compile all string patterns into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let compile = |opt: Option<String>| -> Result<Option<Regex>, regex::Error> {
            opt.map(|p| Regex::new(&p)).transpose()
        };

        let compile_all = |patterns: Vec<String>| -> Result<Vec<Regex>, regex::Error> {
            patterns.iter().map(|p| Regex::new(p)).collect()
        };

        let trailing_artifacts = match self.trailing_artifacts {
            ListOverride::Default => ListOverride::Default,
            ListOverride::Replace(patterns) => ListOverride::Replace(compile_all(patterns)?),
            ListOverride::Extend(patterns) => ListOverride::Extend(compile_all(patterns)?),
        };

        Ok(ParsingConfig {
            marker_strip_re: compile(self.marker_strip_re)?,
            trailing_artifacts,
            dehyphenate: self.dehyphenate.unwrap_or(true),
            year_re: compile(self.year_re)?,
        })
    }
}
