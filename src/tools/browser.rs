//! Actions that open pages in the default browser

use std::sync::Arc;

use async_trait::async_trait;

use super::normalize;
use crate::actions::{Action, ActionArgs, ActionContext};
use crate::desktop::Desktop;
use crate::{Error, Result};

/// Popular sites reachable by name, in listing order
pub const SITES: &[(&str, &str)] = &[
    ("youtube", "https://youtube.com"),
    ("facebook", "https://facebook.com"),
    ("instagram", "https://instagram.com"),
    ("whatsapp", "https://web.whatsapp.com"),
    ("discord", "https://discord.com"),
    ("twitter", "https://twitter.com"),
    ("x", "https://x.com"),
    ("github", "https://github.com"),
    ("google", "https://google.com"),
    ("gmail", "https://gmail.com"),
    ("reddit", "https://reddit.com"),
    ("linkedin", "https://linkedin.com"),
];

/// Where a spoken site name leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteTarget {
    /// Entry from the site table
    Known(&'static str),
    /// Something that looks like a URL or domain
    Url(String),
}

/// Resolve a site name to a URL
///
/// # Errors
///
/// Returns `Error::Rejected` listing the known sites when the name is
/// neither a known site nor URL-like
pub fn resolve_site(site_name: &str) -> Result<SiteTarget> {
    let name = normalize(site_name);
    if let Some((_, url)) = SITES.iter().find(|(key, _)| *key == name) {
        return Ok(SiteTarget::Known(*url));
    }

    if name.starts_with("http") {
        return Ok(SiteTarget::Url(name));
    }
    if name.contains('.') && !name.contains(char::is_whitespace) {
        return Ok(SiteTarget::Url(format!("https://{name}")));
    }

    let available = SITES.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", ");
    Err(Error::Rejected(format!(
        "Unknown site '{name}'. Popular sites: {available}"
    )))
}

/// `open_website` action
pub struct WebsiteTool {
    desktop: Arc<dyn Desktop>,
}

impl WebsiteTool {
    #[must_use]
    pub fn new(desktop: Arc<dyn Desktop>) -> Self {
        Self { desktop }
    }
}

#[async_trait]
impl Action for WebsiteTool {
    async fn run(&self, args: &ActionArgs, ctx: &ActionContext) -> Result<String> {
        let site_name = normalize(args.required_str("site_name")?);
        let target = resolve_site(&site_name)?;
        let (url, spoken) = match &target {
            SiteTarget::Known(url) => (*url, site_name.as_str()),
            SiteTarget::Url(url) => (url.as_str(), url.as_str()),
        };

        self.desktop
            .open_url(url)
            .await
            .map_err(|e| Error::External(format!("Could not open website: {e}")))?;

        tracing::info!(%url, "opened website");
        Ok(ctx.persona.reply(&format!("Opening {spoken}")))
    }
}

/// `search_google` action
pub struct GoogleSearchTool {
    desktop: Arc<dyn Desktop>,
}

impl GoogleSearchTool {
    #[must_use]
    pub fn new(desktop: Arc<dyn Desktop>) -> Self {
        Self { desktop }
    }
}

/// Google results page for `query`
#[must_use]
pub fn google_search_url(query: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("https://www.google.com/search?q={encoded}")
}

#[async_trait]
impl Action for GoogleSearchTool {
    async fn run(&self, args: &ActionArgs, ctx: &ActionContext) -> Result<String> {
        let query = args.required_str("query")?.trim();
        let url = google_search_url(query);

        self.desktop
            .open_url(&url)
            .await
            .map_err(|e| Error::External(format!("Could not perform Google search: {e}")))?;

        tracing::info!(query, "opened google search");
        Ok(ctx.persona.reply(&format!("Searching Google for '{query}'")))
    }
}
