use std::sync::Arc;

use async_trait::async_trait;
use nf_core::{Candidate, CrawlHistory, FeedEntry, Rejection, Result, RunWindow, Source, Verdict};

use crate::text;

#[async_trait]
pub trait UrlResolver: Send + Sync {
    /// Follow redirects and report the final URL.
    async fn resolve(&self, url: &str) -> Result<String>;
}

pub struct HttpUrlResolver {
    client: reqwest::Client,
}

impl HttpUrlResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UrlResolver for HttpUrlResolver {
    async fn resolve(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        Ok(response.url().to_string())
    }
}

const BLOG_SUFFIX: &str = "(blog)";
const PRESS_RELEASE_SUFFIX: &str = "(press release)";

pub struct CandidateFilter {
    resolver: Arc<dyn UrlResolver>,
    history: Arc<dyn CrawlHistory>,
    aggregator_marker: String,
}

impl CandidateFilter {
    pub fn new(
        resolver: Arc<dyn UrlResolver>,
        history: Arc<dyn CrawlHistory>,
        aggregator_marker: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            history,
            aggregator_marker: aggregator_marker.into(),
        }
    }

    /// Checks run in a fixed order; everything cheap happens before the
    /// redirect-following network round-trip.
    pub async fn filter(
        &self,
        entry: &FeedEntry,
        source: &Source,
        window: &RunWindow,
    ) -> Result<Verdict<Candidate>> {
        if !window.contains(entry.published) {
            return Ok(Err(Rejection::OutsideWindow(entry.published)));
        }

        if entry.title.ends_with(BLOG_SUFFIX) || entry.title.ends_with(PRESS_RELEASE_SUFFIX) {
            return Ok(Err(Rejection::BlogOrPressRelease));
        }

        let url = match self.resolver.resolve(&entry.link).await {
            Ok(url) => url,
            Err(e) => return Ok(Err(Rejection::Unreachable(e.to_string()))),
        };

        if url.contains("blog") {
            return Ok(Err(Rejection::BlogUrl));
        }
        if url.contains("job") {
            return Ok(Err(Rejection::JobUrl));
        }

        if self.history.contains(&url).await? {
            return Ok(Err(Rejection::AlreadySeen));
        }

        let title = text::clean_line(&entry.title);

        // Aggregator feeds embed the real origin after the last " - ".
        let (title, source_name) = if source.title.contains(&self.aggregator_marker) {
            match title.rsplit_once(" - ") {
                Some((head, tail)) => (head.trim().to_string(), tail.trim().to_string()),
                None => return Ok(Err(Rejection::MalformedAggregatorTitle)),
            }
        } else {
            (title, source.title.clone())
        };

        Ok(Ok(Candidate {
            url,
            title,
            published: entry.published,
            source_name,
            source_id: source.source_id.clone(),
            source_relevance: source.relevance,
        }))
    }
}
