//! Web search and page reading with provider fallback.

use crate::error::SearchError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Timeout for a search request.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the page reader service.
const READER_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for fetching a page directly.
const DIRECT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Results kept per search.
const MAX_RESULTS: usize = 5;

/// Characters kept from each result's body.
const MAX_EXCERPT_CHARS: usize = 500;

/// Characters kept from a page.
const MAX_PAGE_CHARS: usize = 3000;

const TRUNCATION_MARKER: &str = "\n... [content truncated]";

pub const DEFAULT_JINA_SEARCH_URL: &str = "https://s.jina.ai";
pub const DEFAULT_JINA_READER_URL: &str = "https://r.jina.ai";
pub const DEFAULT_EXA_URL: &str = "https://api.exa.ai";

pub const SEARCH_APOLOGY: &str =
    "Sorry, I couldn't perform a web search right now. No search API keys are configured.";
pub const READ_APOLOGY: &str = "Sorry, I couldn't read that webpage.";

/// One search result, normalized across providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    /// Short summary line, when the provider has one.
    pub description: Option<String>,
    pub excerpt: String,
    pub url: String,
}

impl SearchHit {
    fn render(&self) -> String {
        match &self.description {
            Some(description) => format!(
                "**{}**\n{}\n{}\nSource: {}",
                self.title, description, self.excerpt, self.url
            ),
            None => format!("**{}**\n{}\nSource: {}", self.title, self.excerpt, self.url),
        }
    }
}

/// Keeps the first `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Caps page content at [`MAX_PAGE_CHARS`], marking the cut.
fn cap_page(text: &str) -> String {
    if text.chars().count() > MAX_PAGE_CHARS {
        format!("{}{}", truncate_chars(text, MAX_PAGE_CHARS), TRUNCATION_MARKER)
    } else {
        text.to_string()
    }
}

/// A web search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct JinaSearchResponse {
    #[serde(default)]
    data: Vec<JinaRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JinaRecord {
    title: String,
    description: String,
    url: String,
    content: String,
}

/// Jina search: `GET {base}/{query}` with bearer auth.
pub struct JinaSearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl JinaSearch {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    fn query_url(&self, query: &str) -> Result<reqwest::Url, SearchError> {
        let mut url =
            reqwest::Url::parse(&self.base_url).map_err(|e| SearchError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| SearchError::Url(self.base_url.clone()))?
            .pop_if_empty()
            .push(query);
        Ok(url)
    }
}

#[async_trait]
impl SearchProvider for JinaSearch {
    fn name(&self) -> &'static str {
        "jina"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let response = self
            .client
            .get(self.query_url(query)?)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Status {
                provider: self.name(),
                status: response.status().as_u16(),
            });
        }

        let body: JinaSearchResponse = response.json().await?;
        Ok(body
            .data
            .into_iter()
            .take(MAX_RESULTS)
            .map(|r| SearchHit {
                title: r.title,
                description: Some(r.description),
                excerpt: truncate_chars(&r.content, MAX_EXCERPT_CHARS),
                url: r.url,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ExaSearchResponse {
    #[serde(default)]
    results: Vec<ExaRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExaRecord {
    title: String,
    text: String,
    url: String,
}

/// Exa search: `POST {base}/search` with an API key header.
pub struct ExaSearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ExaSearch {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for ExaSearch {
    fn name(&self) -> &'static str {
        "exa"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let payload = json!({
            "query": query,
            "num_results": MAX_RESULTS,
            "type": "auto",
            "contents": { "text": { "max_characters": MAX_EXCERPT_CHARS } },
        });

        let response = self
            .client
            .post(format!("{}/search", self.base_url.trim_end_matches('/')))
            .header("x-api-key", &self.api_key)
            .json(&payload)
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Status {
                provider: self.name(),
                status: response.status().as_u16(),
            });
        }

        let body: ExaSearchResponse = response.json().await?;
        Ok(body
            .results
            .into_iter()
            .take(MAX_RESULTS)
            .map(|r| SearchHit {
                title: r.title,
                description: None,
                excerpt: truncate_chars(&r.text, MAX_EXCERPT_CHARS),
                url: r.url,
            })
            .collect())
    }
}

/// Tries each provider in order until one returns results.
#[derive(Default)]
pub struct WebSearch {
    providers: Vec<Box<dyn SearchProvider>>,
}

impl WebSearch {
    pub fn new(providers: Vec<Box<dyn SearchProvider>>) -> Self {
        Self { providers }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Searches for `query`, returning formatted results or the apology text.
    pub async fn search(&self, query: &str) -> String {
        tracing::info!(query, "web search");

        for provider in &self.providers {
            match provider.search(query).await {
                Ok(hits) if !hits.is_empty() => {
                    tracing::info!(provider = provider.name(), count = hits.len(), "search returned results");
                    return hits
                        .iter()
                        .map(SearchHit::render)
                        .collect::<Vec<_>>()
                        .join("\n\n---\n\n");
                }
                Ok(_) => {
                    tracing::info!(provider = provider.name(), "search returned no results");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), "search failed: {}", e);
                }
            }
        }

        SEARCH_APOLOGY.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct JinaReaderResponse {
    #[serde(default)]
    data: JinaPage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JinaPage {
    title: String,
    content: String,
}

/// Extracts readable page content, via the reader service when a key is set,
/// otherwise (or on failure) by fetching the page directly.
pub struct PageReader {
    client: reqwest::Client,
    jina_api_key: Option<String>,
    reader_url: String,
}

impl PageReader {
    pub fn new(client: reqwest::Client, jina_api_key: Option<String>, reader_url: impl Into<String>) -> Self {
        Self {
            client,
            jina_api_key,
            reader_url: reader_url.into(),
        }
    }

    pub async fn read(&self, url: &str) -> String {
        tracing::info!(url, "reading page");

        if let Some(key) = &self.jina_api_key {
            match self.read_via_reader(key, url).await {
                Ok(page) => return page,
                Err(e) => tracing::warn!(url, "page reader failed: {}", e),
            }
        }

        match self.fetch_direct(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(url, "direct fetch failed: {}", e);
                READ_APOLOGY.to_string()
            }
        }
    }

    async fn read_via_reader(&self, key: &str, url: &str) -> Result<String, SearchError> {
        let response = self
            .client
            .get(format!("{}/{}", self.reader_url.trim_end_matches('/'), url))
            .bearer_auth(key)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(READER_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Status {
                provider: "jina-reader",
                status: response.status().as_u16(),
            });
        }

        let body: JinaReaderResponse = response.json().await?;
        tracing::info!(title = %body.data.title, "read page");
        Ok(format!("**{}**\n\n{}", body.data.title, cap_page(&body.data.content)))
    }

    async fn fetch_direct(&self, url: &str) -> Result<String, SearchError> {
        let response = self
            .client
            .get(url)
            .timeout(DIRECT_FETCH_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Status {
                provider: "direct",
                status: response.status().as_u16(),
            });
        }

        Ok(cap_page(&response.text().await?))
    }
}
