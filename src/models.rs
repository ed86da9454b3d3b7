//! Data models for the stats collector.
//!
//! This module contains the core data structures shared by providers,
//! the collector, the aggregator and the coordinator.

use crate::analysis::SourceHealth;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Structured data returned by a provider.
///
/// `serde_json::Map` keeps keys sorted, so serialized payloads are stable.
pub type Payload = Map<String, Value>;

/// Successful payloads keyed by provider id.
pub type SourceData = BTreeMap<String, Payload>;

/// Match format a query is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatHint {
    Test,
    Odi,
    T20,
    /// Every format.
    #[default]
    All,
}

impl fmt::Display for FormatHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatHint::Test => write!(f, "Test"),
            FormatHint::Odi => write!(f, "ODI"),
            FormatHint::T20 => write!(f, "T20I"),
            FormatHint::All => write!(f, "All"),
        }
    }
}

impl FormatHint {
    /// Concrete formats covered by this hint.
    pub fn formats(&self) -> &'static [FormatHint] {
        match self {
            FormatHint::Test => &[FormatHint::Test],
            FormatHint::Odi => &[FormatHint::Odi],
            FormatHint::T20 => &[FormatHint::T20],
            FormatHint::All => &[FormatHint::Test, FormatHint::Odi, FormatHint::T20],
        }
    }
}

/// Aspect of the game the summary should focus on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeHint {
    #[default]
    Batting,
    Bowling,
    Fielding,
}

impl fmt::Display for ModeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeHint::Batting => write!(f, "Batting"),
            ModeHint::Bowling => write!(f, "Bowling"),
            ModeHint::Fielding => write!(f, "Fielding"),
        }
    }
}

impl ModeHint {
    /// Statistics the summary should concentrate on.
    pub fn focus(&self) -> &'static str {
        match self {
            ModeHint::Batting => "runs, batting average, strike rate, hundreds and fifties",
            ModeHint::Bowling => "wickets, bowling average, economy rate and strike rate",
            ModeHint::Fielding => "catches, stumpings, run outs and total dismissals",
        }
    }
}

/// A single request for data about one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Player name as typed by the user.
    pub subject: String,
    pub format: FormatHint,
    pub mode: ModeHint,
}

impl Query {
    pub fn new(subject: impl Into<String>, format: FormatHint, mode: ModeHint) -> Self {
        Self {
            subject: subject.into().trim().to_string(),
            format,
            mode,
        }
    }

    /// Lowercase, dash-separated form of the subject (`virat-kohli`).
    pub fn slug(&self) -> String {
        self.subject
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Classification of one provider attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Live data from the real source.
    Success,
    /// Synthetic placeholder data, real source unreachable.
    SuccessFallback,
    Failure,
}

impl OutcomeStatus {
    /// Returns true for both live and fallback successes.
    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeStatus::Success | OutcomeStatus::SuccessFallback)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Success => write!(f, "Success"),
            OutcomeStatus::SuccessFallback => write!(f, "Success (fallback)"),
            OutcomeStatus::Failure => write!(f, "Failure"),
        }
    }
}

/// The result of one provider attempt for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    /// Id of the provider that produced this outcome.
    pub provider_id: String,
    pub status: OutcomeStatus,
    /// Present for successes (live or fallback).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    /// Present for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProviderOutcome {
    /// Live data from the source.
    pub fn success(provider_id: impl Into<String>, payload: Payload) -> Self {
        Self {
            provider_id: provider_id.into(),
            status: OutcomeStatus::Success,
            payload: Some(payload),
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    /// Synthetic data substituted for an unreachable source.
    pub fn fallback(provider_id: impl Into<String>, payload: Payload) -> Self {
        Self {
            provider_id: provider_id.into(),
            status: OutcomeStatus::SuccessFallback,
            payload: Some(payload),
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(provider_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            status: OutcomeStatus::Failure,
            payload: None,
            error_message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }

    /// Failure reason, or a generic message if none was recorded.
    pub fn reason(&self) -> &str {
        self.error_message.as_deref().unwrap_or("unknown error")
    }
}

/// Whether fallback data counts when deciding if a subject has enough data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Fallback payloads make a subject eligible.
    #[default]
    CountAsSuccess,
    /// Only live payloads make a subject eligible.
    LiveOnly,
}

impl FallbackPolicy {
    pub fn from_flag(fallback_counts_as_success: bool) -> Self {
        if fallback_counts_as_success {
            FallbackPolicy::CountAsSuccess
        } else {
            FallbackPolicy::LiveOnly
        }
    }

    /// Returns true if an outcome with this status makes a subject eligible.
    pub fn accepts(&self, status: OutcomeStatus) -> bool {
        match self {
            FallbackPolicy::CountAsSuccess => status.is_success(),
            FallbackPolicy::LiveOnly => status == OutcomeStatus::Success,
        }
    }
}

/// Merged view of all outcomes for one query.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedBundle {
    pub query: Query,
    /// Outcomes in provider registration order.
    pub outcomes: Vec<ProviderOutcome>,
    /// Payloads of successful outcomes keyed by provider id.
    pub successful_subset: SourceData,
    /// Human-readable per-source status lines plus a `k/N` summary.
    pub status_report: String,
}

impl AggregatedBundle {
    /// Returns true if at least one source produced data.
    pub fn has_data(&self) -> bool {
        !self.successful_subset.is_empty()
    }

    /// Number of outcomes the given policy accepts.
    pub fn eligible_count(&self, policy: FallbackPolicy) -> usize {
        self.outcomes
            .iter()
            .filter(|o| policy.accepts(o.status))
            .count()
    }

    pub fn live_count(&self) -> usize {
        self.count_status(OutcomeStatus::Success)
    }

    pub fn fallback_count(&self) -> usize {
        self.count_status(OutcomeStatus::SuccessFallback)
    }

    pub fn failed_count(&self) -> usize {
        self.count_status(OutcomeStatus::Failure)
    }

    fn count_status(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// Terminal state of a coordinator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Summary text produced.
    Completed,
    /// At least one subject had no usable source.
    NoSources,
    /// The summarizer returned an error.
    SummarizerFailed,
}

impl ReportStatus {
    pub fn is_success(&self) -> bool {
        *self == ReportStatus::Completed
    }
}

/// Final result of an analysis or comparison, consumed by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Player name, or `"A vs B"` for comparisons.
    pub subject: String,
    pub format: FormatHint,
    pub mode: ModeHint,
    pub elapsed_seconds: f64,
    pub status_report: String,
    /// Summary text, or the failure message for terminal reports.
    pub body: String,
    /// Number of successful sources used (summed over both subjects for comparisons).
    pub source_count: usize,
    /// Live / fallback / failed tallies behind this report.
    pub health: SourceHealth,
    pub status: ReportStatus,
    pub generated_at: DateTime<Utc>,
}
