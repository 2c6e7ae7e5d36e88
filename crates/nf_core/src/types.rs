use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A configured feed from the source catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub source_id: String,
    pub title: String,
    pub link: String,
    /// Feed-format hint: "rss", "atom", or anything else for auto-detection.
    pub parser: String,
    pub relevance: i64,
}

/// A raw feed item with its publication date already resolved by the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: NaiveDate,
}

/// A feed entry that survived pre-extraction filtering.
///
/// Candidates keep their discovery order; extraction results are correlated
/// back to them by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub title: String,
    pub published: NaiveDate,
    pub source_name: String,
    pub source_id: String,
    pub source_relevance: i64,
}

/// Per-candidate outcome of the batch content extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractorOutput {
    /// Raw output lines; the last two are the image URL and a metadata line.
    Lines(Vec<String>),
    /// Missing, unreadable, or shorter than three lines.
    Insufficient,
}

/// The unit of persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub published: NaiveDate,
    pub crawled: NaiveDate,
    pub source_name: String,
    pub source_id: String,
    pub source_relevance: i64,
    pub content: String,
    pub summary: String,
    pub image_url: String,
}

pub type ArticleId = i64;

/// Answer from [`crate::ArticleStore::persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Stored(ArticleId),
    /// The URL was already in the crawl history; nothing was written.
    Duplicate,
}

/// Why an entry or candidate was dropped. Every per-item failure in the
/// pipeline is one of these, never a swallowed exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    OutsideWindow(NaiveDate),
    BlogOrPressRelease,
    Unreachable(String),
    BlogUrl,
    JobUrl,
    AlreadySeen,
    MalformedAggregatorTitle,
    InsufficientExtract,
    TooShort,
    Blacklisted(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::OutsideWindow(d) => write!(f, "date {} outside crawl window", d),
            Rejection::BlogOrPressRelease => write!(f, "blog or press release title"),
            Rejection::Unreachable(e) => write!(f, "URL unreachable: {}", e),
            Rejection::BlogUrl => write!(f, "'blog' in URL"),
            Rejection::JobUrl => write!(f, "'job' in URL"),
            Rejection::AlreadySeen => write!(f, "URL already crawled"),
            Rejection::MalformedAggregatorTitle => {
                write!(f, "aggregator title missing source separator")
            }
            Rejection::InsufficientExtract => write!(f, "not enough extractor output"),
            Rejection::TooShort => write!(f, "title or content below length threshold"),
            Rejection::Blacklisted(w) => write!(f, "blacklisted word \"{}\"", w),
        }
    }
}

/// Per-item outcome of a pipeline stage.
pub type Verdict<T> = std::result::Result<T, Rejection>;

/// Immutable date window for one run; both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunWindow {
    pub today: NaiveDate,
    pub earliest: NaiveDate,
}

impl RunWindow {
    pub fn new(today: NaiveDate, period_days: i64) -> Self {
        Self {
            today,
            earliest: today - Duration::days(period_days),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.earliest && date <= self.today
    }
}
