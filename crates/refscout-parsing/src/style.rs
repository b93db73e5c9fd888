//! Citation style families and the author-list boundary rules for each.
//!
//! Classification looks only at punctuation near the start of a reference:
//!
//! | style       | example opening                         |
//! |-------------|-----------------------------------------|
//! | Unknown     | `M. B. Conover.`                        |
//! | Vancouver   | `Conover MB.` / `Sel A, Azevedo RT.`    |
//! | APA/Harvard | `Conover, M. B. (2002).` / `Conover, M.B., 2002.` |
//! | MLA/Chicago | `Conover, Mary Boudreau.`               |

use std::fmt;

/// A boundary rule: `true` when the author list ends right before `ahead[0]`.
/// `consumed` is the author text collected so far.
pub type Boundary = fn(consumed: &str, ahead: &[char]) -> bool;

const UNKNOWN_RULES: &[Boundary] = &[initials_end];
const YEAR_RULES: &[Boundary] = &[stop_before_year, any_stop];
const MLA_RULES: &[Boundary] = &[sentence_stop];

/// Punctuation-based author-list conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CitationStyle {
    /// Leading initials: `M. B. Conover.`
    Unknown,
    /// Surname plus run-on initials: `Conover MB.`
    Vancouver,
    /// Surname, comma, initials: `Conover, M. B.`
    ApaHarvard,
    /// Surname, comma, given names: `Conover, Mary Boudreau.`
    MlaChicago,
}

impl CitationStyle {
    /// Pick the style family from the unconsumed start of a reference.
    pub fn classify(ahead: &[char]) -> Self {
        let head: Vec<char> = ahead
            .iter()
            .copied()
            .take_while(|c| !matches!(c, ',' | '.' | ':'))
            .collect();

        if head.len() == 1 {
            Self::Unknown
        } else if head.contains(&' ') {
            Self::Vancouver
        } else if opens_with_surname_and_initial(ahead) {
            Self::ApaHarvard
        } else {
            Self::MlaChicago
        }
    }

    /// Boundary rules tried in order; the first one that finds a boundary wins.
    ///
    /// MLA/Chicago lists are not a single scan: the tokenizer first takes the
    /// lead author (`Surname, Given.`) and only applies these rules when a
    /// comma follows that dot.
    pub fn author_boundaries(self) -> &'static [Boundary] {
        match self {
            Self::Unknown => UNKNOWN_RULES,
            Self::Vancouver | Self::ApaHarvard => YEAR_RULES,
            Self::MlaChicago => MLA_RULES,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Vancouver => "vancouver",
            Self::ApaHarvard => "apa/harvard",
            Self::MlaChicago => "mla/chicago",
        }
    }
}

impl fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A full stop or a colon; either can close an author list.
pub fn is_stop(c: char) -> bool {
    c == '.' || c == ':'
}

/// `Surname,` longer than one character followed by a single initial before
/// the next dot (`Anisi, D.` but not `Anisi, David A.`).
fn opens_with_surname_and_initial(ahead: &[char]) -> bool {
    let Some(comma) = ahead.iter().position(|&c| c == ',') else {
        return false;
    };
    if comma < 2 {
        return false;
    }
    let rest = &ahead[comma + 1..];
    let Some(dot) = rest.iter().position(|&c| c == '.') else {
        return false;
    };
    rest[..dot].iter().filter(|c| !c.is_whitespace()).count() == 1
}

/// Stop preceded by two letters, which skips single-letter initials.
pub fn initials_end(consumed: &str, ahead: &[char]) -> bool {
    let mut last = consumed.chars().rev();
    let two_letters = matches!(
        (last.next(), last.next()),
        (Some(a), Some(b)) if a.is_alphabetic() && b.is_alphabetic()
    );
    two_letters && ahead.first().is_some_and(|&c| is_stop(c))
}

/// Stop whose next alphanumeric character is a digit, i.e. a year follows.
pub fn stop_before_year(_consumed: &str, ahead: &[char]) -> bool {
    match ahead.split_first() {
        Some((&c, rest)) if is_stop(c) => rest
            .iter()
            .find(|c| c.is_alphanumeric())
            .is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// First stop of any kind.
pub fn any_stop(_consumed: &str, ahead: &[char]) -> bool {
    ahead.first().is_some_and(|&c| is_stop(c))
}

/// Dot after a lower-case letter: a sentence end rather than an initial.
pub fn sentence_stop(consumed: &str, ahead: &[char]) -> bool {
    ahead.first() == Some(&'.') && consumed.chars().last().is_some_and(char::is_lowercase)
}

/// Index in `ahead` at which `rule` first holds, if anywhere.
pub fn find_boundary(ahead: &[char], rule: Boundary) -> Option<usize> {
    let mut consumed = String::new();
    for (i, &c) in ahead.iter().enumerate() {
        if rule(&consumed, &ahead[i..]) {
            return Some(i);
        }
        consumed.push(c);
    }
    None
}
