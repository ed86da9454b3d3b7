//! Prompt construction for LLM-backed summarizers.

use crate::models::{FormatHint, ModeHint, SourceData};

/// System prompt shared by both operations.
pub const SYSTEM_PROMPT: &str = r#"You are a cricket statistics analyst.
Work only from the source data you are given. Sources marked as fallback contain
placeholder zeros, not real figures: say so instead of drawing conclusions from them.
Answer in Markdown with short headings and bullet points."#;

/// Prompt for a single-player summary.
pub fn single_player_prompt(
    subject: &str,
    format: FormatHint,
    mode: ModeHint,
    data: &SourceData,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Summarize the {} record of {} in {} cricket.\n",
        mode.to_string().to_lowercase(),
        subject,
        format
    ));
    prompt.push_str(&format!("Focus on {}.\n\n", mode.focus()));
    prompt.push_str(&format!("=== SOURCES FOR {} ===\n", subject.to_uppercase()));
    push_sources(&mut prompt, data);
    prompt.push_str("=== END OF SOURCES ===\n\n");
    prompt.push_str("Cover: overview, key figures, strengths, and how reliable the sources are.");

    prompt
}

/// Prompt for a head-to-head comparison.
pub fn comparison_prompt(
    subject_a: &str,
    subject_b: &str,
    format: FormatHint,
    mode: ModeHint,
    data_a: &SourceData,
    data_b: &SourceData,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Compare the {} records of {} and {} in {} cricket.\n",
        mode.to_string().to_lowercase(),
        subject_a,
        subject_b,
        format
    ));
    prompt.push_str(&format!("Focus on {}.\n\n", mode.focus()));

    for (subject, data) in [(subject_a, data_a), (subject_b, data_b)] {
        prompt.push_str(&format!("=== SOURCES FOR {} ===\n", subject.to_uppercase()));
        push_sources(&mut prompt, data);
        prompt.push_str("=== END OF SOURCES ===\n\n");
    }

    prompt.push_str(
        "Cover: side-by-side figures, relative strengths, and which player has the stronger record and why.",
    );

    prompt
}

fn push_sources(prompt: &mut String, data: &SourceData) {
    for (source, payload) in data {
        let fallback = payload
            .get("fallback")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let marker = if fallback { " (fallback)" } else { "" };

        prompt.push_str(&format!("--- {}{} ---\n", source, marker));
        let body = serde_json::to_string_pretty(payload).unwrap_or_default();
        prompt.push_str(&body);
        prompt.push('\n');
    }
}
