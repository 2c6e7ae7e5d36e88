use std::path::{Path, PathBuf};

use async_trait::async_trait;
use nf_core::{Error, ExtractorOutput, Result};
use tokio::process::Command;
use tracing::debug;

/// Batch full-text extraction over all candidate URLs of a run.
///
/// Implementations return exactly one output per input URL, in input order.
/// Per-URL failures are `Insufficient` markers, never errors; an error means
/// the whole batch is unusable.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract_batch(&self, urls: &[String]) -> Result<Vec<ExtractorOutput>>;
}

/// Filesystem handoff to an out-of-process extraction tool: the URL list is
/// written to `urllist.txt` in the work dir, the tool is invoked with the
/// work dir as its final argument, and one result file per input index is
/// read back.
pub struct BatchFileExtractor {
    work_dir: PathBuf,
    program: String,
    args: Vec<String>,
}

impl BatchFileExtractor {
    pub fn new(work_dir: PathBuf, program: String, args: Vec<String>) -> Self {
        Self {
            work_dir,
            program,
            args,
        }
    }
}

#[async_trait]
impl ContentExtractor for BatchFileExtractor {
    async fn extract_batch(&self, urls: &[String]) -> Result<Vec<ExtractorOutput>> {
        tokio::fs::create_dir_all(&self.work_dir).await?;

        let mut list = urls.join("\n");
        list.push('\n');
        tokio::fs::write(self.work_dir.join("urllist.txt"), list).await?;

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&self.work_dir)
            .status()
            .await
            .map_err(|e| Error::Extractor(format!("failed to run {}: {}", self.program, e)))?;
        if !status.success() {
            return Err(Error::Extractor(format!(
                "{} exited with {}",
                self.program, status
            )));
        }

        let mut outputs = Vec::with_capacity(urls.len());
        for i in 0..urls.len() {
            outputs.push(read_result_file(&self.work_dir.join(i.to_string())).await);
        }
        Ok(outputs)
    }
}

async fn read_result_file(path: &Path) -> ExtractorOutput {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "extractor result unreadable");
            return ExtractorOutput::Insufficient;
        }
    };
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    if lines.len() < 3 {
        return ExtractorOutput::Insufficient;
    }
    ExtractorOutput::Lines(lines)
}

/// In-process stand-in used by tests: answers one batch with a canned
/// output list.
pub struct FixedExtractor {
    outputs: Vec<ExtractorOutput>,
}

impl FixedExtractor {
    pub fn new(outputs: Vec<ExtractorOutput>) -> Self {
        Self { outputs }
    }
}

#[async_trait]
impl ContentExtractor for FixedExtractor {
    async fn extract_batch(&self, urls: &[String]) -> Result<Vec<ExtractorOutput>> {
        if urls.len() != self.outputs.len() {
            return Err(Error::Extractor(format!(
                "expected {} urls, got {}",
                self.outputs.len(),
                urls.len()
            )));
        }
        Ok(self.outputs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn result_files_map_to_outputs_by_index() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("0"),
            "First paragraph.\nSecond paragraph.\nhttp://example.com/img.jpg\ntool-metadata\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("1"), "only\ntwo\n").unwrap();
        // index 2 is intentionally missing

        let extractor = BatchFileExtractor::new(
            dir.path().to_path_buf(),
            "true".to_string(),
            Vec::new(),
        );
        let urls = vec![
            "http://example.com/a".to_string(),
            "http://example.com/b".to_string(),
            "http://example.com/c".to_string(),
        ];
        let outputs = extractor.extract_batch(&urls).await.unwrap();

        assert_eq!(outputs.len(), 3);
        assert_eq!(
            outputs[0],
            ExtractorOutput::Lines(vec![
                "First paragraph.".to_string(),
                "Second paragraph.".to_string(),
                "http://example.com/img.jpg".to_string(),
                "tool-metadata".to_string(),
            ])
        );
        assert_eq!(outputs[1], ExtractorOutput::Insufficient);
        assert_eq!(outputs[2], ExtractorOutput::Insufficient);

        let list = std::fs::read_to_string(dir.path().join("urllist.txt")).unwrap();
        assert_eq!(
            list,
            "http://example.com/a\nhttp://example.com/b\nhttp://example.com/c\n"
        );
    }

    #[tokio::test]
    async fn failing_tool_is_a_batch_error() {
        let dir = tempdir().unwrap();
        let extractor = BatchFileExtractor::new(
            dir.path().to_path_buf(),
            "false".to_string(),
            Vec::new(),
        );
        let urls = vec!["http://example.com/a".to_string()];
        assert!(extractor.extract_batch(&urls).await.is_err());
    }

    #[tokio::test]
    async fn fixed_extractor_enforces_alignment() {
        let extractor = FixedExtractor::new(vec![ExtractorOutput::Insufficient]);
        assert!(extractor.extract_batch(&[]).await.is_err());
        let outputs = extractor
            .extract_batch(&["http://example.com/a".to_string()])
            .await
            .unwrap();
        assert_eq!(outputs, vec![ExtractorOutput::Insufficient]);
    }
}
