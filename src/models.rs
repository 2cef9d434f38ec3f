use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub pub_date: String,
    pub source: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_encoded: Option<String>,
}

/// Body served by the news endpoint and stored as the fallback snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub success: bool,
    pub data: Vec<NewsItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,
}

impl FeedResponse {
    pub fn fresh(data: Vec<NewsItem>) -> Self {
        Self {
            success: true,
            data,
            error: None,
            last_updated: Utc::now(),
            offline: None,
        }
    }

    /// Failure with nothing to fall back on. Still served with HTTP 200.
    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            error: Some(error.into()),
            last_updated: Utc::now(),
            offline: Some(true),
        }
    }

    /// Marks a cached snapshot as served while the upstream is down.
    /// `success` and `last_updated` are kept from the snapshot.
    pub fn into_offline(mut self) -> Self {
        self.offline = Some(true);
        self
    }

    pub fn is_offline(&self) -> bool {
        self.offline.unwrap_or(false)
    }

    /// Newest first. Items whose date does not parse sink to the end in source order.
    pub fn sort_by_date(&mut self) {
        self.data.sort_by(|a, b| {
            let a = DateTime::parse_from_rfc3339(&a.pub_date).ok();
            let b = DateTime::parse_from_rfc3339(&b.pub_date).ok();
            b.cmp(&a)
        });
    }
}
