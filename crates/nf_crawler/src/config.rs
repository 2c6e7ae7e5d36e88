use std::path::{Path, PathBuf};

use nf_core::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// How many days back the crawl window reaches.
    pub period_days: i64,
    /// Words that disqualify an article, matched case-insensitively at a
    /// word start.
    pub blacklist: Vec<String>,
    /// Handoff directory shared with the extractor tool.
    pub work_dir: PathBuf,
    pub extractor_program: String,
    pub extractor_args: Vec<String>,
    /// Source titles containing this marker are treated as aggregators.
    pub aggregator_marker: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            period_days: 7,
            blacklist: Vec::new(),
            work_dir: PathBuf::from("extract_tmp"),
            extractor_program: "article-extract".to_string(),
            extractor_args: Vec::new(),
            aggregator_marker: "Google News".to_string(),
        }
    }
}

impl CrawlConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }
}

/// One blacklist word per line; blank lines and `#` comments are ignored.
pub fn load_blacklist(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
    Ok(parse_blacklist(&text))
}

fn parse_blacklist(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}
