use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("feed error: {0}")]
    Feed(String),

    #[error("extractor error: {0}")]
    Extractor(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("run cancelled")]
    Cancelled,
}
