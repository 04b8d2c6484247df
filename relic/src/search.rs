//! Web search backends for the research pipeline.
//!
//! The research step feeds free-text search results into the text
//! model. Backends are pluggable behind [`SearchProvider`]:
//!
//! - [`DuckDuckGoProvider`] (DuckDuckGo Lite HTML, no API key)
//! - [`TavilyProvider`] (AI-optimised search API, requires a key)
//!
//! [`WebSearch`] wraps a provider and formats the top results as
//! numbered markdown for prompt assembly.

use std::fmt;
use std::fmt::Write as _;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::error::{PipelineError, Result};

/// Percent-encode a query string value (minimal subset for URL safety).
fn url_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

/// A single web search result.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Title of the search result.
    pub title: String,
    /// URL of the search result.
    pub url: String,
    /// Snippet / description text.
    pub snippet: String,
}

/// Pluggable search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync + fmt::Debug {
    /// A human-readable name for this backend.
    fn provider_name(&self) -> &str;

    /// Execute one query and return up to `max_results` results.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;
}

// Pre-compiled regex patterns for parsing DuckDuckGo Lite HTML.
static DDG_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"class="result-link"[^>]*href="([^"]+)"[^>]*>([^<]+)</a>"#)
        .expect("valid DDG link regex")
});

static DDG_SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"class="result-snippet"[^>]*>([^<]+)"#).expect("valid DDG snippet regex")
});

/// Search backend using the DuckDuckGo Lite HTML interface.
///
/// No API key required. DuckDuckGo may occasionally serve a CAPTCHA
/// page instead of results, so this backend suits the low-volume
/// sequential queries the research step issues.
#[derive(Debug, Clone)]
pub struct DuckDuckGoProvider {
    client: reqwest::Client,
}

impl Default for DuckDuckGoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckDuckGoProvider {
    /// Create a new DuckDuckGo backend with a browser-like User-Agent.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
            )
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Parse DuckDuckGo Lite HTML into search results.
    fn parse_html(html: &str) -> Vec<SearchResult> {
        let links: Vec<_> = DDG_LINK_RE.captures_iter(html).collect();
        let snippets: Vec<_> = DDG_SNIPPET_RE.captures_iter(html).collect();

        links
            .iter()
            .enumerate()
            .filter_map(|(i, cap)| {
                let url = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
                let title = cap.get(2).map(|m| m.as_str()).unwrap_or_default();
                let snippet = snippets
                    .get(i)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().trim())
                    .unwrap_or_default();

                if url.is_empty() || title.is_empty() {
                    None
                } else {
                    Some(SearchResult {
                        title: title.trim().to_owned(),
                        url: url.to_owned(),
                        snippet: snippet.to_owned(),
                    })
                }
            })
            .collect()
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn provider_name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let url = format!("https://lite.duckduckgo.com/lite/?q={}", url_encode(query));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PipelineError::search(format!("DuckDuckGo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PipelineError::search(format!(
                "DuckDuckGo error (HTTP {})",
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| PipelineError::search(format!("failed to read DuckDuckGo response: {e}")))?;

        Ok(Self::parse_html(&html)
            .into_iter()
            .take(max_results)
            .collect())
    }
}

/// Search backend using the [Tavily](https://tavily.com) API.
///
/// The API key is sent via the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct TavilyProvider {
    api_key: String,
    client: reqwest::Client,
}

impl TavilyProvider {
    /// Create a new Tavily backend with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }
}

// Tavily API response types (private).
#[derive(Deserialize)]
struct TavilyResponse {
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    content: String,
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn provider_name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let body = serde_json::json!({
            "query": query,
            "max_results": max_results,
        });

        let response = self
            .client
            .post("https://api.tavily.com/search")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::search(format!("Tavily request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::search(format!(
                "Tavily API error (HTTP {status}): {text}"
            )));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::search(format!("failed to parse Tavily response: {e}")))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|r| SearchResult {
                title: r.title,
                url: r.url,
                snippet: r.content,
            })
            .collect())
    }
}

/// Web search front: one provider plus a result cap, producing
/// markdown-formatted result text for prompt assembly.
pub struct WebSearch {
    provider: Box<dyn SearchProvider>,
    max_results: usize,
}

impl fmt::Debug for WebSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSearch")
            .field("provider", &self.provider.provider_name())
            .field("max_results", &self.max_results)
            .finish()
    }
}

impl WebSearch {
    /// Create a web search front with the given backend.
    pub fn new(provider: impl SearchProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            max_results: 5,
        }
    }

    /// DuckDuckGo-backed search. No API key required.
    #[must_use]
    pub fn duckduckgo() -> Self {
        Self::new(DuckDuckGoProvider::new())
    }

    /// Tavily-backed search.
    pub fn tavily(api_key: impl Into<String>) -> Self {
        Self::new(TavilyProvider::new(api_key))
    }

    /// Set the maximum number of results returned per query.
    #[must_use]
    pub const fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Run one query and return the results as numbered markdown.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Search`] when the backend request fails.
    pub async fn run(&self, query: &str) -> Result<String> {
        let results = self.provider.search(query, self.max_results).await?;
        Ok(Self::format_results(&results))
    }

    /// Format search results as numbered markdown for LLM consumption.
    fn format_results(results: &[SearchResult]) -> String {
        if results.is_empty() {
            return "No results found.".to_owned();
        }

        let mut output = String::new();
        for (i, r) in results.iter().enumerate() {
            let _ = write!(output, "{}. [{}]({})\n{}\n\n", i + 1, r.title, r.url, r.snippet);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encode() {
        assert_eq!(url_encode("history of hammer"), "history%20of%20hammer");
        assert_eq!(url_encode("a-b_c.d~e"), "a-b_c.d~e");
    }

    #[test]
    fn test_parse_ddg_html() {
        let html = r#"
            <a class="result-link" href="https://example.com/one">First Result</a>
            <td class="result-snippet">First snippet text</td>
            <a class="result-link" href="https://example.com/two">Second Result</a>
            <td class="result-snippet">Second snippet text</td>
        "#;
        let results = DuckDuckGoProvider::parse_html(html);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "First Result");
        assert_eq!(results[0].url, "https://example.com/one");
        assert_eq!(results[0].snippet, "First snippet text");
        assert_eq!(results[1].title, "Second Result");
    }

    #[test]
    fn test_parse_ddg_html_without_results() {
        assert!(DuckDuckGoProvider::parse_html("<html><body></body></html>").is_empty());
    }

    #[test]
    fn test_format_results() {
        let results = vec![
            SearchResult {
                title: "A".to_owned(),
                url: "https://a.example".to_owned(),
                snippet: "alpha".to_owned(),
            },
            SearchResult {
                title: "B".to_owned(),
                url: "https://b.example".to_owned(),
                snippet: "beta".to_owned(),
            },
        ];
        let formatted = WebSearch::format_results(&results);
        assert!(formatted.starts_with("1. [A](https://a.example)\nalpha"));
        assert!(formatted.contains("2. [B](https://b.example)"));
    }

    #[test]
    fn test_format_empty_results() {
        assert_eq!(WebSearch::format_results(&[]), "No results found.");
    }
}
