use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use votaclaro_news::cache::{FileStore, MemoryStore, SnapshotStore};
use votaclaro_news::config::{self, FeedConfig};
use votaclaro_news::ingest::Ingestor;
use votaclaro_news::parser::FeedParser;
use votaclaro_news::server;

#[derive(Parser)]
#[command(name = "votaclaro-news")]
#[command(about = "News feed service for the VotaClaro voter guide", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FeedArgs {
    #[arg(long, env = "VOTACLARO_FEED_URL", default_value = config::DEFAULT_FEED_URL)]
    feed_url: String,
    #[arg(long, default_value = config::DEFAULT_SOURCE)]
    source: String,
    #[arg(long, default_value = config::DEFAULT_CATEGORY)]
    default_category: String,
    #[arg(long, default_value_t = config::FETCH_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

impl FeedArgs {
    fn to_config(&self) -> FeedConfig {
        FeedConfig {
            feed_url: self.feed_url.clone(),
            source: self.source.clone(),
            default_category: self.default_category.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            ..FeedConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the news endpoint over HTTP
    Serve {
        #[arg(short, long, env = "VOTACLARO_BIND", default_value = "127.0.0.1:8080")]
        bind: String,
        #[arg(long)]
        cache_dir: Option<String>,
        /// Keep the fallback snapshot in memory instead of on disk
        #[arg(long)]
        memory_cache: bool,
        #[command(flatten)]
        feed: FeedArgs,
    },
    /// Run one ingestion cycle and print the response
    Fetch {
        #[arg(long)]
        cache_dir: Option<String>,
        #[arg(long)]
        sort: bool,
        #[command(flatten)]
        feed: FeedArgs,
    },
    /// Parse a local RSS file and print the accepted items
    Parse {
        #[arg(short, long)]
        file: PathBuf,
        #[command(flatten)]
        feed: FeedArgs,
    },
}

fn file_store(cache_dir: Option<&str>) -> Result<Arc<dyn SnapshotStore>> {
    let dir = config::resolve_cache_dir(cache_dir);
    let store = FileStore::new(config::snapshot_path(&dir))
        .context("Failed to initialize news snapshot cache")?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, cache_dir, memory_cache, feed } => {
            let store: Arc<dyn SnapshotStore> = if memory_cache {
                Arc::new(MemoryStore::new("rss-feed"))
            } else {
                file_store(cache_dir.as_deref())?
            };
            let ingestor = Ingestor::new(&feed.to_config(), store)?;
            server::serve(&bind, ingestor).await?;
        }
        Commands::Fetch { cache_dir, sort, feed } => {
            let ingestor = Ingestor::new(&feed.to_config(), file_store(cache_dir.as_deref())?)?;
            let mut response = ingestor.run().await;
            if sort {
                response.sort_by_date();
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Parse { file, feed } => {
            let body = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read feed file: {}", file.display()))?;
            let parser = FeedParser::new(feed.to_config().labels())?;
            let items = parser.parse(&body);
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
    }

    Ok(())
}
