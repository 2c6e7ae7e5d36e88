use async_trait::async_trait;

use crate::types::{Article, PersistOutcome};
use crate::Result;

/// Durable record of URLs already ingested; the dedup authority.
#[async_trait]
pub trait CrawlHistory: Send + Sync {
    /// Whether the URL has been ingested before.
    async fn contains(&self, url: &str) -> Result<bool>;

    /// Record the URL as ingested.
    async fn mark_seen(&self, url: &str) -> Result<()>;
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Persist an article and register its URL in the crawl history as a
    /// single atomic step. A URL that is already in the history yields
    /// [`PersistOutcome::Duplicate`], not an error.
    async fn persist(&self, article: &Article) -> Result<PersistOutcome>;
}
