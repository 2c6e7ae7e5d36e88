pub mod catalog;
pub mod config;
pub mod extract;
pub mod feed;
pub mod filter;
pub mod normalize;
pub mod pipeline;
pub mod summarize;
mod text;

pub use config::CrawlConfig;
pub use extract::{BatchFileExtractor, ContentExtractor, FixedExtractor};
pub use feed::{FeedPoller, HttpFeedPoller};
pub use filter::{CandidateFilter, HttpUrlResolver, UrlResolver};
pub use normalize::ContentNormalizer;
pub use pipeline::{Crawler, RunReport};
pub use summarize::LeadSummarizer;
