use crate::constants::{endpoints, limits, names};
use crate::error::AgentSyncError;
use crate::tools::traits::{Tool, ToolResult};
use crate::tools::visit::html_text;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, AgentSyncError>;

    /// Hits returned when the caller does not ask for a count.
    fn default_results(&self) -> usize {
        limits::SERPAPI_MAX_RESULTS
    }
}

fn http_client() -> Result<reqwest::Client, AgentSyncError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(limits::SEARCH_TIMEOUT_SECS))
        .user_agent(names::USER_AGENT)
        .build()
        .map_err(|e| AgentSyncError::tool("web_search", format!("HTTP client error: {e}")))
}

/// Google results through SerpApi. Requires an API key.
pub struct SerpApiSearch {
    client: reqwest::Client,
    api_key: String,
    url: String,
}

impl SerpApiSearch {
    pub fn new(api_key: impl Into<String>) -> Result<Self, AgentSyncError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AgentSyncError::Config("SerpApi API key is required".into()));
        }
        Ok(Self {
            client: http_client()?,
            api_key,
            url: endpoints::SERPAPI_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// Pulls hits out of a SerpApi `search.json` body.
pub(crate) fn parse_serpapi_results(body: &Value, max_results: usize) -> Vec<SearchHit> {
    body.get("organic_results")
        .and_then(|r| r.as_array())
        .map(|results| {
            results
                .iter()
                .take(max_results)
                .map(|r| {
                    let field = |key: &str| {
                        r.get(key)
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string()
                    };
                    SearchHit {
                        title: field("title"),
                        link: field("link"),
                        snippet: field("snippet"),
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl SearchProvider for SerpApiSearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, AgentSyncError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("engine", "google"),
                ("google_domain", "google.com"),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AgentSyncError::tool(
                "web_search",
                format!("Error fetching search results ({status}): {text}"),
            ));
        }

        let body: Value = serde_json::from_str(&text)?;
        Ok(parse_serpapi_results(&body, max_results))
    }
}

/// DuckDuckGo's HTML endpoint. No key needed.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    url: String,
}

impl DuckDuckGoSearch {
    pub fn new() -> Result<Self, AgentSyncError> {
        Ok(Self {
            client: http_client()?,
            url: endpoints::DUCKDUCKGO_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait::async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, AgentSyncError> {
        let url = format!("{}?q={}", self.url, urlencoding::encode(query));

        let response = self.client.get(&url).send().await.map_err(|e| {
            AgentSyncError::tool("web_search", format!("Search request failed: {e}"))
        })?;

        let status = response.status();
        let html = response.text().await.map_err(|e| {
            AgentSyncError::tool("web_search", format!("Failed to read response: {e}"))
        })?;
        if !status.is_success() {
            return Err(AgentSyncError::tool(
                "web_search",
                format!("Error fetching search results ({status})"),
            ));
        }

        Ok(parse_ddg_results(&html, max_results))
    }

    fn default_results(&self) -> usize {
        limits::DUCKDUCKGO_MAX_RESULTS
    }
}

pub(crate) fn parse_ddg_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let mut results = Vec::new();

    // result links carry class="result__a", snippets class="result__snippet"
    for segment in html.split("class=\"result__a\"").skip(1) {
        if results.len() >= max_results {
            break;
        }

        let url = extract_between(segment, "href=\"", "\"").unwrap_or_default();
        let title = extract_between(segment, ">", "</a>").unwrap_or_default();
        let snippet = segment
            .find("class=\"result__snippet\"")
            .and_then(|start| extract_between(&segment[start..], ">", "</a>"))
            .unwrap_or_default();

        if url.is_empty() || url.starts_with('/') && !url.contains("uddg=") {
            continue;
        }

        // DDG wraps targets in a redirect
        let link = match url.split("uddg=").nth(1) {
            Some(encoded) => {
                let encoded = encoded.split('&').next().unwrap_or(encoded);
                urlencoding::decode(encoded)
                    .map(|u| u.into_owned())
                    .unwrap_or_else(|_| encoded.to_string())
            }
            None => url.clone(),
        };

        results.push(SearchHit {
            title: html_text(&title),
            link,
            snippet: html_text(&snippet),
        });
    }

    results
}

fn extract_between(text: &str, start: &str, end: &str) -> Option<String> {
    let start_idx = text.find(start)? + start.len();
    let remaining = &text[start_idx..];
    let end_idx = remaining.find(end)?;
    Some(remaining[..end_idx].to_string())
}

/// Markdown list of hits, or a hint to broaden the query when there are none.
pub fn format_results(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for '{query}'. Try a more general query.");
    }
    let formatted: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            format!("**{}. [{}]({})**\n{}", i + 1, hit.title, hit.link, hit.snippet)
        })
        .collect();
    format!("## Search Results\n\n{}", formatted.join("\n\n"))
}

/// `web_search` over whichever provider it was built with.
pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
    default_results: usize,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        let default_results = provider.default_results();
        Self {
            provider,
            default_results,
        }
    }

    pub fn with_default_results(mut self, n: usize) -> Self {
        self.default_results = n;
        self
    }
}

#[async_trait::async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Performs a web search for your query and returns the top search results."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to perform."
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let query = super::str_param(&params, "query", self.name())?.trim();
        if query.is_empty() {
            return Err(AgentSyncError::invalid_args(self.name(), "search query is required"));
        }

        let max_results = params
            .get("num_results")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(self.default_results);

        let hits = self.provider.search(query, max_results).await?;
        Ok(Value::String(format_results(query, &hits)))
    }
}
