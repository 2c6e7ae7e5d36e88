use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use nf_core::{Error, FeedEntry, Result, Source};
use tracing::{debug, warn};

#[async_trait]
pub trait FeedPoller: Send + Sync {
    /// Fetch and parse one source's feed. Failures are logged and yield an
    /// empty list; a broken feed never aborts the run.
    async fn poll(&self, source: &Source, today: NaiveDate) -> Vec<FeedEntry>;
}

pub struct HttpFeedPoller {
    client: reqwest::Client,
}

impl HttpFeedPoller {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, source: &Source, today: NaiveDate) -> Result<Vec<FeedEntry>> {
        let response = self.client.get(&source.link).send().await?;
        if !response.status().is_success() {
            return Err(Error::Feed(format!(
                "{} returned status {}",
                source.link,
                response.status()
            )));
        }
        let content = response.bytes().await?;
        parse_feed(&content, &source.parser, today)
    }
}

#[async_trait]
impl FeedPoller for HttpFeedPoller {
    async fn poll(&self, source: &Source, today: NaiveDate) -> Vec<FeedEntry> {
        match self.fetch(source, today).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(source = %source.title, error = %e, "failed to poll feed, skipping source");
                Vec::new()
            }
        }
    }
}

/// The parser hint only decides which format is tried first.
pub(crate) fn parse_feed(content: &[u8], hint: &str, today: NaiveDate) -> Result<Vec<FeedEntry>> {
    if hint.eq_ignore_ascii_case("atom") {
        if let Ok(feed) = atom_syndication::Feed::read_from(content) {
            return Ok(atom_entries(&feed, today));
        }
        if let Ok(channel) = rss::Channel::read_from(content) {
            return Ok(rss_entries(&channel, today));
        }
    } else {
        if let Ok(channel) = rss::Channel::read_from(content) {
            return Ok(rss_entries(&channel, today));
        }
        if let Ok(feed) = atom_syndication::Feed::read_from(content) {
            return Ok(atom_entries(&feed, today));
        }
    }
    Err(Error::Feed("not parsable as RSS or Atom".to_string()))
}

fn rss_entries(channel: &rss::Channel, today: NaiveDate) -> Vec<FeedEntry> {
    channel
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.title()?.to_string();
            let link = item.link()?.to_string();
            // pubDate first, the Dublin Core date as the "updated" fallback.
            let published = item
                .pub_date()
                .and_then(parse_feed_date)
                .or_else(|| {
                    item.dublin_core_ext()
                        .and_then(|dc| dc.dates().first())
                        .and_then(|d| parse_feed_date(d))
                })
                .unwrap_or_else(|| {
                    debug!(link = %link, "entry has no parsable date, defaulting to today");
                    today
                });
            Some(FeedEntry {
                title,
                link,
                published,
            })
        })
        .collect()
}

fn atom_entries(feed: &atom_syndication::Feed, today: NaiveDate) -> Vec<FeedEntry> {
    feed.entries()
        .iter()
        .filter_map(|entry| {
            let link = entry.links().first().map(|l| l.href().to_string())?;
            let title = entry.title().to_string();
            let published = entry
                .published()
                .map(|d| d.with_timezone(&Utc).date_naive())
                .or_else(|| Some(entry.updated().with_timezone(&Utc).date_naive()))
                .unwrap_or(today);
            Some(FeedEntry {
                title,
                link,
                published,
            })
        })
        .collect()
}

fn parse_feed_date(s: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
}
