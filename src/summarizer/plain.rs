//! Offline summaries: the collected data rendered as Markdown, no model involved.

use super::{Summarizer, SummarizerError};
use crate::models::{FormatHint, ModeHint, Payload, SourceData};
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainSummarizer;

impl PlainSummarizer {
    fn render_subject(subject: &str, data: &SourceData) -> String {
        let mut output = String::new();
        output.push_str(&format!("## {}\n\n", subject));

        for (source, payload) in data {
            output.push_str(&format!("### {}\n\n", source));

            let mut fields = Vec::new();
            flatten("", &Value::Object(payload.clone()), &mut fields);
            for (key, value) in fields {
                output.push_str(&format!("- {}: {}\n", key, value));
            }
            output.push('\n');
        }

        output
    }
}

/// Collect `dotted.key: value` pairs from nested JSON.
fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, child, out);
            }
        }
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

fn is_fallback(payload: &Payload) -> bool {
    payload
        .get("fallback")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

#[async_trait]
impl Summarizer for PlainSummarizer {
    fn name(&self) -> &str {
        "plain"
    }

    async fn summarize_one(
        &self,
        subject: &str,
        format: FormatHint,
        mode: ModeHint,
        data: &SourceData,
    ) -> Result<String, SummarizerError> {
        let mut output = format!(
            "{} summary, {} format. Focus: {}.\n\n",
            mode, format, mode.focus()
        );
        output.push_str(&Self::render_subject(subject, data));

        if data.values().any(is_fallback) {
            output.push_str("_Some sources returned placeholder data._\n");
        }

        Ok(output)
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
        let mut output = format!(
            "{} comparison, {} format. Focus: {}.\n\n",
            mode, format, mode.focus()
        );
        output.push_str(&Self::render_subject(subject_a, data_a));
        output.push_str(&Self::render_subject(subject_b, data_b));
        output.push_str(&format!(
            "Sources used: {} for {}, {} for {}.\n",
            data_a.len(),
            subject_a,
            data_b.len(),
            subject_b
        ));

        Ok(output)
    }
}
