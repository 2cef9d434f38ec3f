use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::normalizer::ItemLabels;

pub const DEFAULT_FEED_URL: &str = "https://larepublica.pe/rss/politica.xml";
pub const DEFAULT_SOURCE: &str = "La República";
pub const DEFAULT_CATEGORY: &str = "Política";
pub const DEFAULT_USER_AGENT: &str = "VotaClaro-NewsBot/1.0 (+https://votaclaro.pe)";
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

pub const CACHE_DIR_ENV: &str = "VOTACLARO_CACHE_DIR";
const DEFAULT_CACHE_DIR: &str = ".cache";
const SNAPSHOT_PATH: &str = "news/rss-feed.json";

/// Everything needed to fetch and label one upstream feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub feed_url: String,
    pub source: String,
    pub default_category: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            default_category: DEFAULT_CATEGORY.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: FETCH_TIMEOUT,
        }
    }
}

impl FeedConfig {
    pub fn labels(&self) -> ItemLabels {
        ItemLabels {
            source: self.source.clone(),
            default_category: self.default_category.clone(),
        }
    }
}

/// Resolves the cache directory: explicit value, then `VOTACLARO_CACHE_DIR`,
/// then `.cache` under the working directory. A leading `~` is expanded.
pub fn resolve_cache_dir(explicit: Option<&str>) -> PathBuf {
    let raw = match explicit {
        Some(dir) => dir.to_string(),
        None => std::env::var(CACHE_DIR_ENV).unwrap_or_else(|_| DEFAULT_CACHE_DIR.to_string()),
    };
    PathBuf::from(shellexpand::tilde(&raw).to_string())
}

/// Location of the last-good snapshot inside `cache_dir`.
pub fn snapshot_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(SNAPSHOT_PATH)
}
