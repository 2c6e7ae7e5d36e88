use std::collections::HashSet;

use async_trait::async_trait;
use nf_core::{Article, ArticleId, ArticleStore, CrawlHistory, PersistOutcome, Result};
use tokio::sync::RwLock;

struct MemoryStore {
    seen: HashSet<String>,
    articles: Vec<Article>,
    next_id: ArticleId,
}

/// In-process backend; the dedup check and the insert happen under one
/// write lock, so two callers can never both persist the same URL.
pub struct MemoryStorage {
    store: RwLock<MemoryStore>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(MemoryStore {
                seen: HashSet::new(),
                articles: Vec::new(),
                next_id: 1,
            }),
        }
    }

    pub async fn articles(&self) -> Vec<Article> {
        self.store.read().await.articles.clone()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CrawlHistory for MemoryStorage {
    async fn contains(&self, url: &str) -> Result<bool> {
        Ok(self.store.read().await.seen.contains(url))
    }

    async fn mark_seen(&self, url: &str) -> Result<()> {
        self.store.write().await.seen.insert(url.to_string());
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for MemoryStorage {
    async fn persist(&self, article: &Article) -> Result<PersistOutcome> {
        let mut store = self.store.write().await;
        if store.seen.contains(&article.url) {
            return Ok(PersistOutcome::Duplicate);
        }
        let id = store.next_id;
        store.next_id += 1;
        store.articles.push(article.clone());
        store.seen.insert(article.url.clone());
        Ok(PersistOutcome::Stored(id))
    }
}
