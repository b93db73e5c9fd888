use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;

use super::{LookupError, WorkCandidate, WorkLookup, colon_fallback, validate_title};

pub const DEFAULT_BASE_URL: &str = "https://api.openalex.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const SELECT_FIELDS: &str = "id,display_name,publication_year,cited_by_count";

#[derive(Deserialize)]
struct OpenAlexResponse {
    #[serde(default)]
    results: Vec<WorkCandidate>,
}

/// OpenAlex `works` title search.
pub struct OpenAlexLookup {
    base_url: String,
    mailto: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl Default for OpenAlexLookup {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl OpenAlexLookup {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            mailto: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            client: reqwest::Client::new(),
        }
    }

    /// Contact address for OpenAlex's polite pool.
    pub fn with_mailto(mut self, mailto: impl Into<String>) -> Self {
        self.mailto = Some(mailto.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the request URL for one title query. Commas are dropped because
    /// OpenAlex treats them as filter separators.
    pub fn search_url(&self, title: &str) -> String {
        let commaless = title.replace(',', "");
        let mut url = format!(
            "{}/works?filter=title.search:{}&select={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&format!("\"{}\"", commaless)),
            SELECT_FIELDS,
        );
        if let Some(ref mailto) = self.mailto {
            url.push_str("&mailto=");
            url.push_str(&urlencoding::encode(mailto));
        }
        url
    }

    async fn perform_search(&self, title: &str) -> Result<Vec<WorkCandidate>, LookupError> {
        let url = self.search_url(title);
        tracing::debug!(%url, "querying OpenAlex");

        let resp = self
            .client
            .get(&url)
            .header("User-Agent", "refscout")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(LookupError::RateLimited);
        }
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body: OpenAlexResponse = resp.json().await?;
        Ok(body.results)
    }
}

impl WorkLookup for OpenAlexLookup {
    fn name(&self) -> &str {
        "OpenAlex"
    }

    fn search<'a>(
        &'a self,
        title: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WorkCandidate>, LookupError>> + Send + 'a>> {
        Box::pin(async move {
            let title = validate_title(title)?;

            let results = self.perform_search(title).await?;
            if !results.is_empty() {
                return Ok(results);
            }

            match colon_fallback(title) {
                Some(head) => {
                    tracing::debug!(head, "no results for full title, retrying before colon");
                    self.perform_search(head).await
                }
                None => Ok(results),
            }
        })
    }
}
