use anyhow::Result;
use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, warn};

use crate::extractor::ItemExtractor;
use crate::models::NewsItem;
use crate::normalizer::{normalize_item, ItemLabels};

/// Turns a raw RSS body into ordered, normalized news items.
#[derive(Debug, Clone)]
pub struct FeedParser {
    item_block: Regex,
    item_open: Regex,
    extractor: ItemExtractor,
    labels: ItemLabels,
}

impl FeedParser {
    pub fn new(labels: ItemLabels) -> Result<Self> {
        Ok(Self {
            item_block: Regex::new(r"(?is)<item(?:\s[^>]*)?>(.*?)</item\s*>")?,
            item_open: Regex::new(r"(?i)<item(?:\s[^>]*)?>")?,
            extractor: ItemExtractor::new()?,
            labels,
        })
    }

    /// Parses every `<item>` block in source order. Rejected items are skipped;
    /// a body without items yields an empty list.
    pub fn parse(&self, body: &str) -> Vec<NewsItem> {
        self.parse_at(body, Utc::now())
    }

    pub fn parse_at(&self, body: &str, now: DateTime<Utc>) -> Vec<NewsItem> {
        let mut items = Vec::new();
        let mut rejected = 0usize;

        for cap in self.item_block.captures_iter(body) {
            let Some(inner) = cap.get(1) else {
                continue;
            };
            let block = self.last_item_content(inner.as_str());
            let fields = self.extractor.extract(block);

            match normalize_item(&fields, block, &self.labels, now) {
                Some(item) => items.push(item),
                None => {
                    rejected += 1;
                    debug!(title = %fields.title, link = %fields.link, "Skipping feed item");
                }
            }
        }

        if items.is_empty() && rejected == 0 && !body.trim().is_empty() {
            warn!("Feed body contained no <item> blocks");
        }
        debug!(accepted = items.len(), rejected, "Parsed feed body");

        items
    }

    /// An item missing `</item>` runs into the next item's opener. Keep only what follows
    /// the last opener so the well-formed item survives.
    fn last_item_content<'a>(&self, inner: &'a str) -> &'a str {
        match self.item_open.find_iter(inner).last() {
            Some(open) => &inner[open.end()..],
            None => inner,
        }
    }
}
