use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::{read_fallback, SnapshotStore};
use crate::config::FeedConfig;
use crate::fetcher::{FeedFetcher, FetchError};
use crate::models::FeedResponse;
use crate::parser::FeedParser;

const UNAVAILABLE_MESSAGE: &str = "No se pudieron cargar las noticias";

/// Runs one fetch, parse and cache cycle per call. Shares nothing across calls
/// except the snapshot store.
#[derive(Clone)]
pub struct Ingestor {
    fetcher: FeedFetcher,
    parser: Arc<FeedParser>,
    store: Arc<dyn SnapshotStore>,
}

impl Ingestor {
    pub fn new(config: &FeedConfig, store: Arc<dyn SnapshotStore>) -> Result<Self> {
        Ok(Self {
            fetcher: FeedFetcher::new(config)?,
            parser: Arc::new(FeedParser::new(config.labels())?),
            store,
        })
    }

    /// Always produces a response. Upstream failures fall back to the last
    /// snapshot, or to an explicit failure body when there is none.
    pub async fn run(&self) -> FeedResponse {
        match self.fetcher.fetch().await {
            Ok(body) => {
                let items = self.parser.parse(&body);
                info!(url = %self.fetcher.url(), items = items.len(), "Fetched news feed");

                let response = FeedResponse::fresh(items);
                self.save_snapshot(&response).await;
                response
            }
            Err(e) => self.degrade(e).await,
        }
    }

    async fn save_snapshot(&self, response: &FeedResponse) {
        let store = Arc::clone(&self.store);
        let snapshot = response.clone();

        match tokio::task::spawn_blocking(move || store.write(&snapshot)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to save news snapshot: {:#}", e),
            Err(e) => warn!("News snapshot task failed: {}", e),
        }
    }

    async fn degrade(&self, error: FetchError) -> FeedResponse {
        warn!(url = %self.fetcher.url(), "News feed unavailable: {}", error);

        let store = Arc::clone(&self.store);
        let fallback = match tokio::task::spawn_blocking(move || read_fallback(store.as_ref())).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("News snapshot read task failed: {}", e);
                None
            }
        };

        match fallback {
            Some(snapshot) => {
                info!(items = snapshot.data.len(), last_updated = %snapshot.last_updated, "Serving cached news");
                snapshot.into_offline()
            }
            None => FeedResponse::unavailable(format!("{}: {}", UNAVAILABLE_MESSAGE, error)),
        }
    }
}
