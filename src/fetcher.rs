use reqwest::header::ACCEPT;

use crate::config::FeedConfig;

const FEED_ACCEPT: &str = "application/rss+xml, application/xml, text/xml";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    HttpStatus(u16),
    #[error("feed body is empty")]
    EmptyBody,
}

/// Single-attempt HTTP client for the upstream feed.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    url: String,
}

impl FeedFetcher {
    pub fn new(config: &FeedConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.feed_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the feed body once. Non-2xx statuses and blank bodies are errors.
    pub async fn fetch(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, FEED_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }

        Ok(body)
    }
}
