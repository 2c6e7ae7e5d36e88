use std::path::Path;

use async_trait::async_trait;
use nf_core::{Article, ArticleStore, CrawlHistory, Error, PersistOutcome, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        pubdate TEXT NOT NULL,
        crawldate TEXT NOT NULL,
        source TEXT NOT NULL,
        source_id TEXT NOT NULL,
        source_relevance INTEGER NOT NULL,
        content TEXT NOT NULL,
        summary TEXT NOT NULL,
        image_url TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS crawl_history (
        url TEXT PRIMARY KEY,
        seen_at TEXT NOT NULL
    )
    "#,
    // Add future migrations here
];

pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("failed to open database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl CrawlHistory for SqliteStorage {
    async fn contains(&self, url: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM crawl_history WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("history lookup failed for {}: {}", url, e)))?;
        Ok(row.is_some())
    }

    async fn mark_seen(&self, url: &str) -> Result<()> {
        let today = chrono::Utc::now().date_naive();
        sqlx::query("INSERT OR IGNORE INTO crawl_history (url, seen_at) VALUES (?, ?)")
            .bind(url)
            .bind(today.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to mark {} as seen: {}", url, e)))?;
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for SqliteStorage {
    async fn persist(&self, article: &Article) -> Result<PersistOutcome> {
        // Check-then-insert runs inside one transaction so concurrent runs
        // cannot both pass the dedup probe for the same URL.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Storage(format!("failed to begin transaction: {}", e)))?;

        let seen = sqlx::query("SELECT 1 FROM crawl_history WHERE url = ?")
            .bind(&article.url)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                Error::Storage(format!("history probe failed for {}: {}", article.url, e))
            })?;
        if seen.is_some() {
            return Ok(PersistOutcome::Duplicate);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO articles
            (url, title, pubdate, crawldate, source, source_id, source_relevance,
             content, summary, image_url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.url)
        .bind(&article.title)
        .bind(article.published.to_string())
        .bind(article.crawled.to_string())
        .bind(&article.source_name)
        .bind(&article.source_id)
        .bind(article.source_relevance)
        .bind(&article.content)
        .bind(&article.summary)
        .bind(&article.image_url)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::Storage(format!("failed to store {}: {}", article.url, e)))?;

        sqlx::query("INSERT INTO crawl_history (url, seen_at) VALUES (?, ?)")
            .bind(&article.url)
            .bind(article.crawled.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                Error::Storage(format!("failed to mark {} as seen: {}", article.url, e))
            })?;

        tx.commit()
            .await
            .map_err(|e| Error::Storage(format!("failed to commit {}: {}", article.url, e)))?;

        Ok(PersistOutcome::Stored(inserted.last_insert_rowid()))
    }
}
