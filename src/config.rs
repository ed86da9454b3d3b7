//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.playerscope.toml` files.

use crate::providers::HttpSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".playerscope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Fan-out settings.
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Provider selection and endpoints.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Summarizer backend settings.
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    /// Event log settings.
    #[serde(default)]
    pub events: EventsConfig,
}

/// Output format of the rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report file path. Printed to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub report_format: ReportFormat,
}

/// Collector and HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Upper bound for one provider call. 0 disables the bound.
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,

    /// Timeout for a single HTTP request made by a provider.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Delay before each outgoing request.
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_provider_timeout(),
            request_timeout_seconds: default_request_timeout(),
            request_delay_ms: default_request_delay(),
            user_agent: default_user_agent(),
        }
    }
}

impl CollectorConfig {
    /// Per-provider bound for the collector.
    pub fn provider_timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            user_agent: self.user_agent.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
            request_delay: Duration::from_millis(self.request_delay_ms),
        }
    }
}

fn default_provider_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    10
}

fn default_request_delay() -> u64 {
    500
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
        .to_string()
}

/// Provider selection. Order of `enabled` is the registration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_enabled")]
    pub enabled: Vec<String>,

    #[serde(default = "default_espn_url")]
    pub espn_base_url: String,

    #[serde(default = "default_search_url")]
    pub search_base_url: String,

    #[serde(default = "default_wikipedia_url")]
    pub wikipedia_base_url: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            espn_base_url: default_espn_url(),
            search_base_url: default_search_url(),
            wikipedia_base_url: default_wikipedia_url(),
        }
    }
}

fn default_enabled() -> Vec<String> {
    vec!["espn_direct", "espn_google", "wikipedia"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_espn_url() -> String {
    "https://www.espncricinfo.com".to_string()
}

fn default_search_url() -> String {
    "https://www.google.com".to_string()
}

fn default_wikipedia_url() -> String {
    "https://en.wikipedia.org".to_string()
}

/// Which summarizer turns collected data into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizerBackend {
    /// Local LLM through the Ollama chat API.
    #[default]
    Ollama,
    /// Offline Markdown rendering of the raw data.
    Plain,
}

/// Summarizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default)]
    pub backend: SummarizerBackend,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_summarizer_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            backend: SummarizerBackend::default(),
            ollama_url: default_ollama_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_seconds: default_summarizer_timeout(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_summarizer_timeout() -> u64 {
    300
}

/// Eligibility policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Whether fallback payloads alone are enough to call the summarizer.
    #[serde(default = "default_true")]
    pub fallback_counts_as_success: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            fallback_counts_as_success: true,
        }
    }
}

/// Event log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_events_path")]
    pub path: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_events_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_events_path() -> String {
    "playerscope_events.json".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }
        if let Some(format) = args.report_format {
            self.general.report_format = format.into();
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(timeout) = args.timeout {
            self.collector.timeout_seconds = timeout;
        }

        if let Some(backend) = args.summarizer {
            self.summarizer.backend = backend.into();
        }
        if let Some(ref model) = args.model {
            self.summarizer.model = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.summarizer.ollama_url = url.clone();
        }

        if args.live_only {
            self.policy.fallback_counts_as_success = false;
        }

        if let Some(ref path) = args.events_file {
            self.events.path = path.display().to_string();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use crate::cli::{ReportFormatArg, SummarizerArg};
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.summarizer.model, "llama3.2:latest");
        assert_eq!(config.summarizer.backend, SummarizerBackend::Ollama);
        assert_eq!(config.collector.timeout_seconds, 30);
        assert_eq!(config.providers.enabled.len(), 3);
        assert!(config.policy.fallback_counts_as_success);
        assert!(config.general.output.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "kohli.md"
report_format = "json"

[collector]
timeout_seconds = 5
request_delay_ms = 0

[providers]
enabled = ["wikipedia"]

[summarizer]
backend = "plain"

[policy]
fallback_counts_as_success = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output.as_deref(), Some("kohli.md"));
        assert_eq!(config.general.report_format, ReportFormat::Json);
        assert_eq!(config.collector.timeout_seconds, 5);
        assert_eq!(config.collector.request_timeout_seconds, 10);
        assert_eq!(config.providers.enabled, vec!["wikipedia"]);
        assert_eq!(config.providers.espn_base_url, "https://www.espncricinfo.com");
        assert_eq!(config.summarizer.backend, SummarizerBackend::Plain);
        assert!(!config.policy.fallback_counts_as_success);
        assert!(config.events.enabled);
    }

    #[test]
    fn test_timeouts() {
        let mut collector = CollectorConfig::default();
        assert_eq!(collector.provider_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(
            collector.http_settings().request_delay,
            Duration::from_millis(500)
        );

        collector.timeout_seconds = 0;
        assert_eq!(collector.provider_timeout(), None);
    }

    #[test]
    fn test_merge_only_explicit_args() {
        let mut config = Config::default();
        config.summarizer.model = "from-file".to_string();

        let mut args = make_args();
        args.summarizer = Some(SummarizerArg::Plain);
        args.report_format = Some(ReportFormatArg::Json);
        args.output = Some(PathBuf::from("out.json"));
        args.live_only = true;
        config.merge_with_args(&args);

        assert_eq!(config.summarizer.model, "from-file");
        assert_eq!(config.summarizer.backend, SummarizerBackend::Plain);
        assert_eq!(config.general.report_format, ReportFormat::Json);
        assert_eq!(config.general.output.as_deref(), Some("out.json"));
        assert!(!config.policy.fallback_counts_as_success);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[collector]"));
        assert!(toml_str.contains("[providers]"));
        assert!(toml_str.contains("[summarizer]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.providers.enabled, default_enabled());
    }
}
