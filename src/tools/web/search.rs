//! Web search
//!
//! Provides web search via DuckDuckGo's HTML endpoint (no key) or the Brave
//! Search API (when a key is configured).

use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::actions::{Action, ActionArgs, ActionContext};
use crate::{Error, Result};

/// Results spoken back per query
pub const MAX_RESULTS: usize = 5;

const DUCKDUCKGO_URL: &str = "https://html.duckduckgo.com/html/";
const BRAVE_URL: &str = "https://api.search.brave.com/res/v1/web/search";

/// Search provider configuration
#[derive(Debug)]
pub enum SearchProvider {
    /// DuckDuckGo HTML results page
    DuckDuckGo,
    /// Brave Search API
    Brave {
        /// API key for Brave Search
        api_key: SecretString,
    },
}

/// Search result from web search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title
    pub title: String,
    /// Result URL
    pub url: String,
    /// Result snippet/description
    pub snippet: String,
}

/// Brave Search API response
#[derive(Debug, Deserialize)]
struct BraveSearchResponse {
    web: Option<BraveWebResults>,
}

#[derive(Debug, Deserialize)]
struct BraveWebResults {
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

/// `search_web` action
pub struct WebSearchTool {
    provider: SearchProvider,
    client: reqwest::Client,
}

impl WebSearchTool {
    /// Brave when a key is given, DuckDuckGo otherwise
    #[must_use]
    pub fn new(brave_api_key: Option<SecretString>) -> Self {
        let provider = brave_api_key.map_or(SearchProvider::DuckDuckGo, |api_key| {
            SearchProvider::Brave { api_key }
        });
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("Mozilla/5.0 (compatible; nevira/", env!("CARGO_PKG_VERSION"), ")"))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { provider, client }
    }

    #[must_use]
    pub const fn provider(&self) -> &SearchProvider {
        &self.provider
    }

    /// Perform a web search
    ///
    /// # Errors
    ///
    /// Returns error if the search request fails or response parsing fails
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        match &self.provider {
            SearchProvider::DuckDuckGo => self.search_duckduckgo(query, limit).await,
            SearchProvider::Brave { api_key } => {
                self.search_brave(api_key.expose_secret(), query, limit).await
            }
        }
    }

    async fn search_duckduckgo(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let html = self
            .client
            .get(DUCKDUCKGO_URL)
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_duckduckgo(&html, limit)
    }

    /// Search using Brave Search API
    async fn search_brave(&self, api_key: &str, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .get(BRAVE_URL)
            .header("X-Subscription-Token", api_key)
            .query(&[("q", query), ("count", &limit.to_string())])
            .send()
            .await?;

        let response = response.error_for_status().map_err(Error::Http)?;

        let brave_response: BraveSearchResponse = response.json().await?;

        let results = brave_response
            .web
            .map(|web| {
                web.results
                    .into_iter()
                    .take(limit)
                    .map(|r| SearchResult {
                        title: r.title,
                        url: r.url,
                        snippet: r.description,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(results)
    }
}

#[async_trait]
impl Action for WebSearchTool {
    async fn run(&self, args: &ActionArgs, _ctx: &ActionContext) -> Result<String> {
        let query = args.required_str("query")?.trim();

        let results = self.search(query, MAX_RESULTS).await.map_err(|e| {
            tracing::error!(query, error = %e, "web search failed");
            Error::External(format!("An error occurred while searching the web for '{query}'."))
        })?;

        tracing::info!(query, count = results.len(), "web search complete");
        Ok(format_results(query, &results))
    }
}

/// Numbered results separated by blank lines
#[must_use]
pub fn format_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No search results found for '{query}'.");
    }
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}\n   {}\n   {}", i + 1, r.title, r.snippet, r.url))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::External(format!("bad selector '{css}': {e}")))
}

/// Extract results from a DuckDuckGo HTML page
fn parse_duckduckgo(html: &str, limit: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);
    let result_selector = selector(".result")?;
    let link_selector = selector("a.result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let mut results = Vec::new();
    for result in document.select(&result_selector) {
        if results.len() >= limit {
            break;
        }
        let Some(link) = result.select(&link_selector).next() else {
            continue;
        };
        let title = element_text(&link);
        let url = link.value().attr("href").map(resolve_redirect).unwrap_or_default();
        if title.is_empty() || url.is_empty() {
            continue;
        }
        let snippet = result
            .select(&snippet_selector)
            .next()
            .map(|e| element_text(&e))
            .unwrap_or_default();
        results.push(SearchResult { title, url, snippet });
    }
    Ok(results)
}

/// DuckDuckGo wraps targets as `//duckduckgo.com/l/?uddg=<encoded>`
fn resolve_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    url::Url::parse(&absolute)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(absolute)
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div class="result">
          <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">Rust   Programming Language</a>
          <a class="result__snippet">A language empowering everyone.</a>
        </div>
        <div class="result">
          <a class="result__a" href="https://doc.rust-lang.org/book/">The Book</a>
        </div>
        <div class="result"><span>no link</span></div>
    "#;

    #[test]
    fn new_without_key_uses_duckduckgo() {
        let tool = WebSearchTool::new(None);
        assert!(matches!(tool.provider(), SearchProvider::DuckDuckGo));
    }

    #[test]
    fn new_with_key_uses_brave() {
        let tool = WebSearchTool::new(Some(SecretString::from("k".to_string())));
        assert!(matches!(tool.provider(), SearchProvider::Brave { .. }));
    }

    #[test]
    fn parses_duckduckgo_results() {
        let results = parse_duckduckgo(PAGE, MAX_RESULTS).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rust Programming Language");
        assert_eq!(results[0].url, "https://www.rust-lang.org/");
        assert_eq!(results[0].snippet, "A language empowering everyone.");
        assert_eq!(results[1].url, "https://doc.rust-lang.org/book/");
        assert!(results[1].snippet.is_empty());
    }

    #[test]
    fn respects_limit() {
        assert_eq!(parse_duckduckgo(PAGE, 1).unwrap().len(), 1);
    }

    #[test]
    fn formats_numbered_results() {
        let results = vec![
            SearchResult {
                title: "One".into(),
                url: "https://one.example".into(),
                snippet: "first".into(),
            },
            SearchResult {
                title: "Two".into(),
                url: "https://two.example".into(),
                snippet: "second".into(),
            },
        ];
        assert_eq!(
            format_results("q", &results),
            "1. One\n   first\n   https://one.example\n\n2. Two\n   second\n   https://two.example"
        );
    }

    #[test]
    fn empty_results_message() {
        assert_eq!(format_results("zzz", &[]), "No search results found for 'zzz'.");
    }
}
