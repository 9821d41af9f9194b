//! Current weather via a wttr.in compatible service

use std::time::Duration;

use async_trait::async_trait;

use crate::actions::{Action, ActionArgs, ActionContext};
use crate::{Error, Result};

/// `get_weather` action
pub struct WeatherTool {
    base_url: String,
    client: reqwest::Client,
}

impl WeatherTool {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(8))
            // wttr.in serves HTML to browsers and plain text to curl
            .user_agent("curl/8.0")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// One-line weather summary for `city`
    ///
    /// # Errors
    ///
    /// Returns `Error::External` with a spoken message if the lookup fails
    pub async fn lookup(&self, city: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, urlencoding::encode(city));
        let response = self
            .client
            .get(&url)
            .query(&[("format", "3")])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(city, error = %e, "weather request failed");
                Error::External(format!("An error occurred while retrieving weather for {city}."))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(city, %status, "weather service refused request");
            return Err(Error::External(format!("Could not retrieve weather for {city}.")));
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!(city, error = %e, "weather body unreadable");
            Error::External(format!("An error occurred while retrieving weather for {city}."))
        })?;

        let summary = body.trim().to_string();
        tracing::info!(city, %summary, "weather retrieved");
        Ok(summary)
    }
}

#[async_trait]
impl Action for WeatherTool {
    async fn run(&self, args: &ActionArgs, _ctx: &ActionContext) -> Result<String> {
        self.lookup(args.required_str("city")?.trim()).await
    }
}
