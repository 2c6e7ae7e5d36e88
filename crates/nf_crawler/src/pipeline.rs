use std::sync::Arc;

use nf_core::{
    ArticleStore, Candidate, CrawlHistory, Error, ExtractorOutput, PersistOutcome, Rejection,
    Result, RunWindow, Source,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::extract::ContentExtractor;
use crate::feed::FeedPoller;
use crate::filter::CandidateFilter;
use crate::normalize::ContentNormalizer;

/// Counters for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub sources_polled: usize,
    pub entries_seen: usize,
    pub candidates: usize,
    pub stored: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub failed: usize,
}

/// Owns one ingestion run end to end: poll, filter, extract once as a
/// batch, normalize, persist. All run state lives here — the window is an
/// immutable value and the candidate buffer belongs to this orchestrator,
/// not to any stage.
pub struct Crawler {
    poller: Arc<dyn FeedPoller>,
    filter: CandidateFilter,
    extractor: Arc<dyn ContentExtractor>,
    normalizer: ContentNormalizer,
    history: Arc<dyn CrawlHistory>,
    store: Arc<dyn ArticleStore>,
    shutdown: CancellationToken,
}

impl Crawler {
    pub fn new(
        poller: Arc<dyn FeedPoller>,
        filter: CandidateFilter,
        extractor: Arc<dyn ContentExtractor>,
        normalizer: ContentNormalizer,
        history: Arc<dyn CrawlHistory>,
        store: Arc<dyn ArticleStore>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            poller,
            filter,
            extractor,
            normalizer,
            history,
            store,
            shutdown,
        }
    }

    pub async fn run(&self, sources: &[Source], window: RunWindow) -> Result<RunReport> {
        let mut report = RunReport::default();
        let mut candidates: Vec<Candidate> = Vec::new();

        for source in sources {
            info!(source = %source.title, "polling feed");
            let entries = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Err(Error::Cancelled),
                entries = self.poller.poll(source, window.today) => entries,
            };
            report.sources_polled += 1;

            for entry in entries {
                report.entries_seen += 1;
                let verdict = tokio::select! {
                    biased;
                    _ = self.shutdown.cancelled() => return Err(Error::Cancelled),
                    verdict = self.filter.filter(&entry, source, &window) => verdict,
                };
                match verdict {
                    Ok(Ok(candidate)) => candidates.push(candidate),
                    Ok(Err(reason)) => {
                        log_rejection(&entry.link, &reason);
                        report.rejected += 1;
                    }
                    Err(e) => {
                        warn!(link = %entry.link, error = %e, "filter failed, skipping entry");
                        report.failed += 1;
                    }
                }
            }
        }

        report.candidates = candidates.len();
        if candidates.is_empty() {
            info!("no candidates survived filtering");
            return Ok(report);
        }

        info!(count = candidates.len(), "extracting content");
        let urls: Vec<String> = candidates.iter().map(|c| c.url.clone()).collect();
        let outputs = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Err(Error::Cancelled),
            outputs = self.extractor.extract_batch(&urls) => outputs,
        };
        let outputs = match outputs {
            Ok(outputs) => outputs,
            Err(e) => {
                error!(error = %e, "batch extraction failed, dropping all candidates");
                report.failed += candidates.len();
                return Ok(report);
            }
        };
        if outputs.len() != candidates.len() {
            error!(
                candidates = candidates.len(),
                outputs = outputs.len(),
                "extractor broke positional alignment, dropping batch"
            );
            report.failed += candidates.len();
            return Ok(report);
        }

        // Pair each result with its candidate right away; from here on
        // there is no index arithmetic left to get wrong.
        let paired: Vec<(Candidate, ExtractorOutput)> =
            candidates.into_iter().zip(outputs).collect();

        for (candidate, output) in paired {
            if self.shutdown.is_cancelled() {
                return Err(Error::Cancelled);
            }

            // The batch call may have taken a while; another run can have
            // claimed the URL since the filter check.
            match self.history.contains(&candidate.url).await {
                Ok(true) => {
                    debug!(url = %candidate.url, "already crawled, skipping");
                    report.duplicates += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(url = %candidate.url, error = %e, "history check failed, skipping");
                    report.failed += 1;
                    continue;
                }
            }

            let article = match self
                .normalizer
                .normalize(&candidate, &output, window.today)
                .await
            {
                Ok(Ok(article)) => article,
                Ok(Err(reason)) => {
                    log_rejection(&candidate.url, &reason);
                    report.rejected += 1;
                    continue;
                }
                Err(e) => {
                    warn!(url = %candidate.url, error = %e, "normalization failed, skipping");
                    report.failed += 1;
                    continue;
                }
            };

            match self.store.persist(&article).await {
                Ok(PersistOutcome::Stored(id)) => {
                    info!(
                        id,
                        title = %article.title,
                        date = %article.published,
                        source = %article.source_name,
                        "🆕 stored article"
                    );
                    report.stored += 1;
                }
                Ok(PersistOutcome::Duplicate) => {
                    debug!(url = %article.url, "⏭️ already persisted");
                    report.duplicates += 1;
                }
                Err(e) => {
                    error!(url = %article.url, error = %e, "failed to persist article");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

fn log_rejection(url: &str, reason: &Rejection) {
    match reason {
        Rejection::Unreachable(_) => warn!(url, %reason, "dropping entry"),
        Rejection::MalformedAggregatorTitle => error!(url, %reason, "dropping entry"),
        Rejection::AlreadySeen | Rejection::OutsideWindow(_) => {
            debug!(url, %reason, "dropping entry")
        }
        _ => info!(url, %reason, "dropping entry"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use nf_core::FeedEntry;
    use nf_storage::MemoryStorage;

    use crate::extract::FixedExtractor;
    use crate::filter::UrlResolver;
    use crate::summarize::LeadSummarizer;

    struct StaticPoller {
        entries: Vec<FeedEntry>,
    }

    #[async_trait]
    impl FeedPoller for StaticPoller {
        async fn poll(&self, _source: &Source, _today: NaiveDate) -> Vec<FeedEntry> {
            self.entries.clone()
        }
    }

    struct IdentityResolver;

    #[async_trait]
    impl UrlResolver for IdentityResolver {
        async fn resolve(&self, url: &str) -> Result<String> {
            Ok(url.to_string())
        }
    }

    fn window() -> RunWindow {
        RunWindow::new(NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(), 7)
    }

    fn source() -> Source {
        Source {
            source_id: "1".to_string(),
            title: "Example Wire".to_string(),
            link: "http://example.com/feed.xml".to_string(),
            parser: "rss".to_string(),
            relevance: 80,
        }
    }

    fn entry(title: &str, link: &str) -> FeedEntry {
        FeedEntry {
            title: title.to_string(),
            link: link.to_string(),
            published: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
        }
    }

    fn good_output() -> ExtractorOutput {
        let body = "The story begins here. It keeps going for a while. ".to_string()
            + &"More reporting follows. ".repeat(60);
        ExtractorOutput::Lines(vec![
            body,
            "http://example.com/image.jpg".to_string(),
            "tool-metadata".to_string(),
        ])
    }

    fn crawler(
        entries: Vec<FeedEntry>,
        outputs: Vec<ExtractorOutput>,
        storage: Arc<MemoryStorage>,
        shutdown: CancellationToken,
    ) -> Crawler {
        let history: Arc<dyn CrawlHistory> = storage.clone();
        let store: Arc<dyn ArticleStore> = storage;
        Crawler::new(
            Arc::new(StaticPoller { entries }),
            CandidateFilter::new(Arc::new(IdentityResolver), history.clone(), "Google News"),
            Arc::new(FixedExtractor::new(outputs)),
            ContentNormalizer::new(Arc::new(LeadSummarizer), &[]).unwrap(),
            history,
            store,
            shutdown,
        )
    }

    #[tokio::test]
    async fn happy_path_stores_an_article() {
        let storage = Arc::new(MemoryStorage::new());
        let c = crawler(
            vec![entry("Fresh Story", "http://example.com/fresh")],
            vec![good_output()],
            storage.clone(),
            CancellationToken::new(),
        );

        let report = c.run(&[source()], window()).await.unwrap();
        assert_eq!(report.sources_polled, 1);
        assert_eq!(report.entries_seen, 1);
        assert_eq!(report.candidates, 1);
        assert_eq!(report.stored, 1);
        assert_eq!(report.rejected, 0);

        let articles = storage.articles().await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Fresh Story");
        assert_eq!(
            articles[0].summary,
            "The story begins here. It keeps going for a while."
        );
        assert_eq!(articles[0].image_url, "http://example.com/image.jpg");
        assert!(storage.contains("http://example.com/fresh").await.unwrap());
    }

    #[tokio::test]
    async fn blog_titles_never_reach_extraction() {
        let storage = Arc::new(MemoryStorage::new());
        // An empty FixedExtractor batch errors on any non-empty URL list,
        // so reaching extraction would show up as failures.
        let c = crawler(
            vec![entry("Big Breakthrough (blog)", "http://example.com/blog-post")],
            vec![],
            storage.clone(),
            CancellationToken::new(),
        );

        let report = c.run(&[source()], window()).await.unwrap();
        assert_eq!(report.rejected, 1);
        assert_eq!(report.candidates, 0);
        assert_eq!(report.stored, 0);
        assert_eq!(report.failed, 0);
        assert!(storage.articles().await.is_empty());
    }

    #[tokio::test]
    async fn insufficient_extraction_leaves_history_untouched() {
        let storage = Arc::new(MemoryStorage::new());
        let c = crawler(
            vec![entry("Fresh Story", "http://example.com/thin")],
            vec![ExtractorOutput::Lines(vec![
                "only".to_string(),
                "two".to_string(),
            ])],
            storage.clone(),
            CancellationToken::new(),
        );

        let report = c.run(&[source()], window()).await.unwrap();
        assert_eq!(report.candidates, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.stored, 0);
        // A rejected candidate may be retried on a later run.
        assert!(!storage.contains("http://example.com/thin").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_urls_in_one_run_persist_once() {
        let storage = Arc::new(MemoryStorage::new());
        let c = crawler(
            vec![
                entry("Fresh Story", "http://example.com/same"),
                entry("Fresh Story", "http://example.com/same"),
            ],
            vec![good_output(), good_output()],
            storage.clone(),
            CancellationToken::new(),
        );

        let report = c.run(&[source()], window()).await.unwrap();
        assert_eq!(report.stored, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(storage.articles().await.len(), 1);
    }

    #[tokio::test]
    async fn second_run_rejects_seen_urls_before_extraction() {
        let storage = Arc::new(MemoryStorage::new());
        let entries = vec![entry("Fresh Story", "http://example.com/fresh")];

        let first = crawler(
            entries.clone(),
            vec![good_output()],
            storage.clone(),
            CancellationToken::new(),
        );
        first.run(&[source()], window()).await.unwrap();

        // Second run: the URL is now in history, so no candidate reaches
        // the (empty) extractor batch.
        let second = crawler(entries, vec![], storage.clone(), CancellationToken::new());
        let report = second.run(&[source()], window()).await.unwrap();
        assert_eq!(report.rejected, 1);
        assert_eq!(report.candidates, 0);
        assert_eq!(storage.articles().await.len(), 1);
    }

    #[tokio::test]
    async fn cancellation_aborts_before_any_persistence() {
        let storage = Arc::new(MemoryStorage::new());
        let token = CancellationToken::new();
        token.cancel();
        let c = crawler(
            vec![entry("Fresh Story", "http://example.com/fresh")],
            vec![good_output()],
            storage.clone(),
            token,
        );

        let result = c.run(&[source()], window()).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(storage.articles().await.is_empty());
    }

    #[tokio::test]
    async fn misaligned_extractor_batch_is_dropped() {
        let storage = Arc::new(MemoryStorage::new());
        // Two outputs for one candidate: FixedExtractor reports the
        // mismatch as a batch error and the run completes with failures.
        let c = crawler(
            vec![entry("Fresh Story", "http://example.com/fresh")],
            vec![good_output(), good_output()],
            storage.clone(),
            CancellationToken::new(),
        );

        let report = c.run(&[source()], window()).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.stored, 0);
        assert!(storage.articles().await.is_empty());
    }
}
