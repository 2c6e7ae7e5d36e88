use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use clap::Parser;
use nf_core::{ArticleStore, CrawlHistory, Error, Result, RunWindow};
use nf_crawler::{
    catalog,
    config::load_blacklist,
    BatchFileExtractor, CandidateFilter, ContentNormalizer, CrawlConfig, Crawler, HttpFeedPoller,
    HttpUrlResolver, LeadSummarizer,
};
use nf_storage::MemoryStorage;
#[cfg(feature = "sqlite")]
use nf_storage::SqliteStorage;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Poll news feeds and persist deduplicated articles")]
struct Cli {
    /// URL of the CSV source catalog
    #[arg(long)]
    catalog_url: String,

    /// Only crawl the source with this exact title
    #[arg(long)]
    source: Option<String>,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Crawl window in days (overrides the config file)
    #[arg(long)]
    period_days: Option<i64>,

    /// Storage backend: memory or sqlite
    #[arg(long, default_value = "sqlite")]
    storage: String,

    #[arg(long, default_value = "articles.db")]
    db_path: PathBuf,

    /// Extractor handoff directory (overrides the config file)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Extractor program (overrides the config file)
    #[arg(long)]
    extractor: Option<String>,

    /// Extra argument for the extractor program (repeatable)
    #[arg(long = "extractor-arg")]
    extractor_args: Vec<String>,

    /// File with one blacklist word per line
    #[arg(long)]
    blacklist_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => CrawlConfig::load(path)?,
        None => CrawlConfig::default(),
    };
    if let Some(days) = args.period_days {
        config.period_days = days;
    }
    if let Some(dir) = args.work_dir.clone() {
        config.work_dir = dir;
    }
    if let Some(program) = args.extractor.clone() {
        config.extractor_program = program;
    }
    if !args.extractor_args.is_empty() {
        config.extractor_args = args.extractor_args.clone();
    }
    if let Some(path) = &args.blacklist_file {
        config.blacklist = load_blacklist(path)?;
    }

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, finishing up");
                shutdown.cancel();
            }
        });
    }

    let client = reqwest::Client::new();

    let mut sources = catalog::fetch_catalog(&client, &args.catalog_url).await?;
    if let Some(name) = &args.source {
        sources.retain(|s| &s.title == name);
        if sources.is_empty() {
            return Err(Error::Catalog(format!(
                "no source titled \"{}\" in the catalog",
                name
            )));
        }
    }
    info!(count = sources.len(), "loaded source catalog");

    let (history, store): (Arc<dyn CrawlHistory>, Arc<dyn ArticleStore>) =
        match args.storage.as_str() {
            "memory" => {
                let storage = Arc::new(MemoryStorage::new());
                (storage.clone(), storage)
            }
            #[cfg(feature = "sqlite")]
            "sqlite" => {
                let storage = Arc::new(SqliteStorage::open(&args.db_path).await?);
                (storage.clone(), storage)
            }
            other => {
                return Err(Error::Config(format!("unknown storage backend: {}", other)));
            }
        };

    let crawler = Crawler::new(
        Arc::new(HttpFeedPoller::new(client.clone())),
        CandidateFilter::new(
            Arc::new(HttpUrlResolver::new(client.clone())),
            history.clone(),
            config.aggregator_marker.clone(),
        ),
        Arc::new(BatchFileExtractor::new(
            config.work_dir.clone(),
            config.extractor_program.clone(),
            config.extractor_args.clone(),
        )),
        ContentNormalizer::new(Arc::new(LeadSummarizer), &config.blacklist)?,
        history,
        store,
        shutdown,
    );

    let window = RunWindow::new(Local::now().date_naive(), config.period_days);
    info!(today = %window.today, earliest = %window.earliest, "starting crawl");
    let start = std::time::Instant::now();

    match crawler.run(&sources, window).await {
        Ok(report) => {
            info!(
                sources = report.sources_polled,
                entries = report.entries_seen,
                candidates = report.candidates,
                stored = report.stored,
                duplicates = report.duplicates,
                rejected = report.rejected,
                failed = report.failed,
                elapsed_secs = start.elapsed().as_secs(),
                "crawl finished"
            );
            Ok(())
        }
        Err(Error::Cancelled) => {
            warn!("crawl cancelled; already stored articles remain committed");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "crawl failed");
            Err(e)
        }
    }
}
