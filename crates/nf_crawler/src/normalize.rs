use std::sync::Arc;

use chrono::NaiveDate;
use nf_core::{Article, Candidate, ExtractorOutput, Rejection, Result, Summarizer, Verdict};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::text;

const MIN_TITLE_CHARS: usize = 5;
const MIN_CONTENT_CHARS: usize = 1000;
const MAX_CONTENT_CHARS: usize = 5000;

static SHARE_THIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*Share this\s*").expect("SHARE_THIS regex"));
static SPACED_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+,\s+").expect("SPACED_COMMA regex"));
static SPACED_PERIOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\.").expect("SPACED_PERIOD regex"));

pub struct ContentNormalizer {
    summarizer: Arc<dyn Summarizer>,
    blacklist: Vec<(String, Regex)>,
}

impl ContentNormalizer {
    pub fn new(summarizer: Arc<dyn Summarizer>, blacklist_words: &[String]) -> Result<Self> {
        let mut blacklist = Vec::with_capacity(blacklist_words.len());
        for word in blacklist_words {
            // Leading word boundary only, so "casino" also catches "casinos".
            let re = RegexBuilder::new(&format!(r"\b{}", regex::escape(word)))
                .case_insensitive(true)
                .build()?;
            blacklist.push((word.clone(), re));
        }
        Ok(Self {
            summarizer,
            blacklist,
        })
    }

    /// Turn raw extractor output into a persistable article, or say exactly
    /// why not.
    pub async fn normalize(
        &self,
        candidate: &Candidate,
        output: &ExtractorOutput,
        today: NaiveDate,
    ) -> Result<Verdict<Article>> {
        let lines = match output {
            ExtractorOutput::Insufficient => return Ok(Err(Rejection::InsufficientExtract)),
            ExtractorOutput::Lines(lines) if lines.len() < 3 => {
                return Ok(Err(Rejection::InsufficientExtract))
            }
            ExtractorOutput::Lines(lines) => lines,
        };

        // The last two lines are the image URL and the tool's metadata line.
        let body = lines[..lines.len() - 2].join(" ");
        let mut content =
            text::collapse_whitespace(&text::to_printable(&text::decode_entities(&body)));

        // The extractor frequently echoes the headline at the top.
        let echoed_title = Regex::new(&format!(r"^{}\s*-?\s*", regex::escape(&candidate.title)))?;
        content = echoed_title.replace(&content, "").to_string();
        content = SHARE_THIS.replace_all(&content, "").to_string();
        content = SPACED_COMMA.replace_all(&content, ", ").to_string();
        content = SPACED_PERIOD.replace_all(&content, ".").to_string();
        // Cut off what is presumably an appended comment section.
        let content = text::trunc_at_word(&content, MAX_CONTENT_CHARS);

        let summary = self
            .summarizer
            .summarize_first_two_sentences(&content)
            .await?;
        let image_url = text::clean_line(&lines[lines.len() - 2]);

        if candidate.title.chars().count() < MIN_TITLE_CHARS
            || content.chars().count() < MIN_CONTENT_CHARS
        {
            return Ok(Err(Rejection::TooShort));
        }

        for (word, re) in &self.blacklist {
            if re.is_match(&content) {
                return Ok(Err(Rejection::Blacklisted(word.clone())));
            }
        }

        Ok(Ok(Article {
            url: candidate.url.clone(),
            title: candidate.title.clone(),
            published: candidate.published,
            crawled: today,
            source_name: candidate.source_name.clone(),
            source_id: candidate.source_id.clone(),
            source_relevance: candidate.source_relevance,
            content,
            summary,
            image_url,
        }))
    }
}
