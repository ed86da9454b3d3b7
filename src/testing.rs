//! Test doubles shared by unit tests.

use crate::models::{FormatHint, ModeHint, Payload, ProviderOutcome, Query, SourceData};
use crate::providers::{ProviderRegistry, SourceProvider};
use crate::summarizer::{Summarizer, SummarizerError};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Script {
    Success(u64),
    Fallback(u64),
    Failure(String),
    NoPayload,
    Panic,
}

/// Provider that returns a fixed outcome after an optional delay.
pub struct ScriptedProvider {
    id: String,
    script: Script,
    delay: Duration,
    stamp_as: Option<String>,
    fail_for: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(id: &str, script: Script) -> Self {
        Self {
            id: id.to_string(),
            script,
            delay: Duration::ZERO,
            stamp_as: None,
            fail_for: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn success(id: &str, runs: u64) -> Self {
        Self::new(id, Script::Success(runs))
    }

    pub fn fallback(id: &str, runs: u64) -> Self {
        Self::new(id, Script::Fallback(runs))
    }

    pub fn failure(id: &str, message: &str) -> Self {
        Self::new(id, Script::Failure(message.to_string()))
    }

    /// Reports `Success` but carries no payload.
    pub fn without_payload(id: &str) -> Self {
        Self::new(id, Script::NoPayload)
    }

    pub fn panicking(id: &str) -> Self {
        Self::new(id, Script::Panic)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Stamp outcomes with a different provider id.
    pub fn stamped_as(mut self, id: &str) -> Self {
        self.stamp_as = Some(id.to_string());
        self
    }

    /// Fail, whatever the script says, when queried about `subject`.
    pub fn failing_for(mut self, subject: &str) -> Self {
        self.fail_for = Some(subject.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceProvider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, query: &Query) -> ProviderOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let id = self.stamp_as.as_deref().unwrap_or(&self.id);
        if self.fail_for.as_deref() == Some(query.subject.as_str()) {
            return ProviderOutcome::failure(id, format!("no data for {}", query.subject));
        }
        match &self.script {
            Script::Success(runs) => ProviderOutcome::success(id, runs_payload(*runs)),
            Script::Fallback(runs) => ProviderOutcome::fallback(id, runs_payload(*runs)),
            Script::Failure(message) => ProviderOutcome::failure(id, message.clone()),
            Script::NoPayload => ProviderOutcome {
                payload: None,
                ..ProviderOutcome::success(id, Payload::new())
            },
            Script::Panic => panic!("scripted provider {} crashed", self.id),
        }
    }
}

/// `{"runs": n}`
pub fn runs_payload(runs: u64) -> Payload {
    let mut payload = Payload::new();
    payload.insert("runs".to_string(), json!(runs));
    payload
}

/// Registry with one entry per provider, labelled `Label <id>`.
pub fn registry_of(providers: Vec<Arc<dyn SourceProvider>>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        let label = format!("Label {}", provider.id());
        registry.register(label, provider).unwrap();
    }
    registry
}

/// Summarizer call captured by [`SpySummarizer`].
#[derive(Debug, Clone)]
pub enum SummaryCall {
    One {
        subject: String,
        data: SourceData,
    },
    Two {
        subject_a: String,
        subject_b: String,
        data_a: SourceData,
        data_b: SourceData,
    },
}

/// Summarizer that records its inputs and returns canned text, an error, or panics.
#[derive(Default)]
pub struct SpySummarizer {
    calls: Mutex<Vec<SummaryCall>>,
    fail_with: Option<String>,
    panic_with: Option<String>,
}

impl SpySummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn panicking(message: &str) -> Self {
        Self {
            panic_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<SummaryCall> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, text: String) -> Result<String, SummarizerError> {
        if let Some(ref message) = self.panic_with {
            panic!("{}", message);
        }
        match &self.fail_with {
            Some(message) => Err(SummarizerError::Api(message.clone())),
            None => Ok(text),
        }
    }
}

#[async_trait]
impl Summarizer for SpySummarizer {
    fn name(&self) -> &str {
        "spy"
    }

    async fn summarize_one(
        &self,
        subject: &str,
        _format: FormatHint,
        _mode: ModeHint,
        data: &SourceData,
    ) -> Result<String, SummarizerError> {
        self.calls.lock().unwrap().push(SummaryCall::One {
            subject: subject.to_string(),
            data: data.clone(),
        });
        self.respond(format!("summary of {}", subject))
    }

    async fn summarize_two(
        &self,
        subject_a: &str,
        subject_b: &str,
        _format: FormatHint,
        _mode: ModeHint,
        data_a: &SourceData,
        data_b: &SourceData,
    ) -> Result<String, SummarizerError> {
        self.calls.lock().unwrap().push(SummaryCall::Two {
            subject_a: subject_a.to_string(),
            subject_b: subject_b.to_string(),
            data_a: data_a.clone(),
            data_b: data_b.clone(),
        });
        self.respond(format!("{} vs {}", subject_a, subject_b))
    }
}
