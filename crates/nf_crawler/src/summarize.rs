use async_trait::async_trait;
use nf_core::{Result, Summarizer};
use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]["')\]]*(\s|$)"#).expect("SENTENCE_END regex"));

/// Summarizes by quoting the lead: the first two sentences of the text.
pub struct LeadSummarizer;

#[async_trait]
impl Summarizer for LeadSummarizer {
    async fn summarize_first_two_sentences(&self, text: &str) -> Result<String> {
        Ok(leading_sentences(text, 2))
    }
}

fn leading_sentences(text: &str, count: usize) -> String {
    let mut found = 0;
    for m in SENTENCE_END.find_iter(text) {
        found += 1;
        if found == count {
            return text[..m.end()].trim_end().to_string();
        }
    }
    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn takes_the_first_two_sentences() {
        let text = "First sentence. Second sentence! Third sentence.";
        let summary = LeadSummarizer
            .summarize_first_two_sentences(text)
            .await
            .unwrap();
        assert_eq!(summary, "First sentence. Second sentence!");
    }

    #[tokio::test]
    async fn shorter_text_is_returned_whole() {
        let text = "Only one sentence here.";
        let summary = LeadSummarizer
            .summarize_first_two_sentences(text)
            .await
            .unwrap();
        assert_eq!(summary, "Only one sentence here.");
    }

    #[test]
    fn handles_quoted_sentence_ends() {
        let text = "\"We won.\" said the coach. The crowd cheered loudly. Then it rained.";
        assert_eq!(
            leading_sentences(text, 2),
            "\"We won.\" said the coach."
        );
    }
}
