use async_trait::async_trait;

use crate::Result;

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Derive a short summary from the first two sentences of the text.
    async fn summarize_first_two_sentences(&self, text: &str) -> Result<String>;
}
