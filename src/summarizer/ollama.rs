//! Summaries through the Ollama chat API.

use super::prompt::{comparison_prompt, single_player_prompt, SYSTEM_PROMPT};
use super::{Summarizer, SummarizerError};
use crate::config::SummarizerConfig;
use crate::models::{FormatHint, ModeHint, SourceData};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

pub struct OllamaSummarizer {
    http_client: reqwest::Client,
    ollama_url: String,
    model_name: String,
    temperature: f32,
    timeout_seconds: u64,
}

impl OllamaSummarizer {
    pub fn new(config: &SummarizerConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            ollama_url: config.ollama_url.trim_end_matches('/').to_string(),
            model_name: config.model.clone(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn build_request(&self, prompt: &str) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        }
    }

    /// Send one prompt and return the model's reply.
    async fn send_prompt(&self, prompt: &str) -> Result<String, SummarizerError> {
        let url = format!("{}/api/chat", self.ollama_url);
        let request = self.build_request(prompt);

        debug!("Sending {} byte prompt to {}", prompt.len(), self.model_name);

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SummarizerError::Timeout(self.timeout_seconds)
                } else if e.is_connect() {
                    SummarizerError::Connect(format!("Ollama at {}", self.ollama_url))
                } else {
                    SummarizerError::Api(format!("failed to send request: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::Api(format!("{}: {}", status, body)));
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizerError::Decode(e.to_string()))?;

        Ok(chat_response.message.content)
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn summarize_one(
        &self,
        subject: &str,
        format: FormatHint,
        mode: ModeHint,
        data: &SourceData,
    ) -> Result<String, SummarizerError> {
        info!(
            "Summarizing {} with {} ({} sources)",
            subject,
            self.model_name,
            data.len()
        );
        let prompt = single_player_prompt(subject, format, mode, data);
        self.send_prompt(&prompt).await
    }

    async fn summarize_two(
        &self,
        subject_a: &str,
        subject_b: &str,
        format: FormatHint,
        mode: ModeHint,
        data_a: &SourceData,
        data_b: &SourceData,
    ) -> Result<String, SummarizerError> {
        info!(
            "Comparing {} and {} with {}",
            subject_a, subject_b, self.model_name
        );
        let prompt = comparison_prompt(subject_a, subject_b, format, mode, data_a, data_b);
        self.send_prompt(&prompt).await
    }
}
