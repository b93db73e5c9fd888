//! Title lookup against scholarly-metadata services.
//!
//! The extraction pipeline never calls these; front ends feed each parsed
//! title into a [`WorkLookup`] and render whatever comes back.

pub mod openalex;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use openalex::OpenAlexLookup;

/// Titles this long are rejected before any request is made.
pub const MAX_TITLE_CHARS: usize = 500;

/// A published work returned for a title query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCandidate {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub cited_by_count: u64,
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("invalid title: {0}")]
    InvalidTitle(String),
    #[error("rate limited (429)")]
    RateLimited,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A metadata service that can search for works by title.
pub trait WorkLookup: Send + Sync {
    /// Name of the service, for display.
    fn name(&self) -> &str;

    /// Zero or more candidate works for `title`.
    fn search<'a>(
        &'a self,
        title: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WorkCandidate>, LookupError>> + Send + 'a>>;
}

/// Reject titles no service should be asked about.
pub fn validate_title(title: &str) -> Result<&str, LookupError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(LookupError::InvalidTitle("Title is required".into()));
    }
    if title.chars().count() >= MAX_TITLE_CHARS {
        return Err(LookupError::InvalidTitle(format!(
            "The title's length is too big (over {} characters)",
            MAX_TITLE_CHARS
        )));
    }
    Ok(title)
}

/// The part of a title before its first colon, used as a second query when
/// the full title finds nothing ("Heartfelt self: cardio-visual ..." → "Heartfelt self").
pub fn colon_fallback(title: &str) -> Option<&str> {
    let (head, _) = title.split_once(':')?;
    let head = head.trim();
    if head.is_empty() { None } else { Some(head) }
}
