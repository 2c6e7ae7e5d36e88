pub mod error;
pub mod storage;
pub mod summarize;
pub mod types;

pub use error::Error;
pub use storage::{ArticleStore, CrawlHistory};
pub use summarize::Summarizer;
pub use types::{
    Article, ArticleId, Candidate, ExtractorOutput, FeedEntry, PersistOutcome, Rejection,
    RunWindow, Source, Verdict,
};

pub type Result<T> = std::result::Result<T, Error>;
