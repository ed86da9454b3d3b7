//! Summarization of collected player data.
//!
//! The coordinator only sees the [`Summarizer`] trait. Two backends exist:
//! an Ollama chat model and an offline plain-text renderer.

pub mod ollama;
pub mod plain;
pub mod prompt;

use crate::config::{SummarizerBackend, SummarizerConfig};
use crate::models::{FormatHint, ModeHint, SourceData};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use ollama::OllamaSummarizer;
pub use plain::PlainSummarizer;

/// Errors raised by a summarizer backend.
#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("cannot connect to {0}")]
    Connect(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("summarizer API error: {0}")]
    Api(String),

    #[error("failed to decode summarizer response: {0}")]
    Decode(String),

    #[error("summarizer panicked: {0}")]
    Panicked(String),
}

/// Turns successful source data into text.
///
/// Implementations must not call back into the collector.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Short backend name for logs and report metadata.
    fn name(&self) -> &str;

    async fn summarize_one(
        &self,
        subject: &str,
        format: FormatHint,
        mode: ModeHint,
        data: &SourceData,
    ) -> Result<String, SummarizerError>;

    async fn summarize_two(
        &self,
        subject_a: &str,
        subject_b: &str,
        format: FormatHint,
        mode: ModeHint,
        data_a: &SourceData,
        data_b: &SourceData,
    ) -> Result<String, SummarizerError>;
}

/// Build the configured backend.
pub fn build_summarizer(config: &SummarizerConfig) -> anyhow::Result<Arc<dyn Summarizer>> {
    let summarizer: Arc<dyn Summarizer> = match config.backend {
        SummarizerBackend::Ollama => Arc::new(OllamaSummarizer::new(config)?),
        SummarizerBackend::Plain => Arc::new(PlainSummarizer),
    };
    Ok(summarizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_configured_backend() {
        let mut config = SummarizerConfig::default();
        config.backend = SummarizerBackend::Plain;
        assert_eq!(build_summarizer(&config).unwrap().name(), "plain");

        config.backend = SummarizerBackend::Ollama;
        assert_eq!(build_summarizer(&config).unwrap().name(), "ollama");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SummarizerError::Timeout(30).to_string(),
            "request timed out after 30s"
        );
        assert_eq!(
            SummarizerError::Api("500: boom".into()).to_string(),
            "summarizer API error: 500: boom"
        );
    }
}
