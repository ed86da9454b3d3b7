//! Outcome aggregation and status reporting.
//!
//! This module turns the ordered outcome list produced by the collector into
//! an [`AggregatedBundle`] and computes source health statistics.

use crate::models::{AggregatedBundle, OutcomeStatus, ProviderOutcome, Query, SourceData};
use crate::providers::ProviderRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Build the bundle for one query. Never fails, even if no source succeeded.
pub fn aggregate(
    query: &Query,
    outcomes: Vec<ProviderOutcome>,
    registry: &ProviderRegistry,
) -> AggregatedBundle {
    let successful_subset = successful_subset(&outcomes);
    let status_report = format_status_report(&outcomes, registry);

    AggregatedBundle {
        query: query.clone(),
        outcomes,
        successful_subset,
        status_report,
    }
}

/// Payloads of live and fallback successes, keyed by provider id.
pub fn successful_subset(outcomes: &[ProviderOutcome]) -> SourceData {
    outcomes
        .iter()
        .filter(|o| o.status.is_success())
        .filter_map(|o| {
            o.payload
                .as_ref()
                .map(|payload| (o.provider_id.clone(), payload.clone()))
        })
        .collect()
}

/// Status category shown for one outcome.
pub fn status_category(outcome: &ProviderOutcome) -> String {
    match outcome.status {
        OutcomeStatus::Success => "live success".to_string(),
        OutcomeStatus::SuccessFallback => "success (fallback data)".to_string(),
        OutcomeStatus::Failure => format!("failed ({})", outcome.reason()),
    }
}

/// One line per outcome in the given order, then a `k/N sources succeeded` line.
pub fn format_status_report(outcomes: &[ProviderOutcome], registry: &ProviderRegistry) -> String {
    let mut lines = Vec::with_capacity(outcomes.len() + 2);
    lines.push("Data source status:".to_string());

    for outcome in outcomes {
        lines.push(format!(
            "- {}: {}",
            registry.label_for(&outcome.provider_id),
            status_category(outcome)
        ));
    }

    let succeeded = outcomes.iter().filter(|o| o.status.is_success()).count();
    lines.push(format!("{}/{} sources succeeded", succeeded, outcomes.len()));

    lines.join("\n")
}

/// Overall health of the data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthRating {
    Good,
    Fair,
    Poor,
}

impl fmt::Display for HealthRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthRating::Good => write!(f, "Good"),
            HealthRating::Fair => write!(f, "Fair"),
            HealthRating::Poor => write!(f, "Poor"),
        }
    }
}

/// Live / fallback / failed tallies over one or more bundles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceHealth {
    pub live: usize,
    pub fallback: usize,
    pub failed: usize,
}

impl SourceHealth {
    pub fn from_bundles(bundles: &[&AggregatedBundle]) -> Self {
        bundles.iter().fold(Self::default(), |mut health, bundle| {
            health.live += bundle.live_count();
            health.fallback += bundle.fallback_count();
            health.failed += bundle.failed_count();
            health
        })
    }

    pub fn total(&self) -> usize {
        self.live + self.fallback + self.failed
    }

    /// Percentage of requests answered with live data.
    pub fn live_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        (self.live as f64 / self.total() as f64) * 100.0
    }

    /// `Good` at 70% live or more, `Fair` at 30% or more.
    pub fn rating(&self) -> HealthRating {
        let rate = self.live_rate();
        if rate >= 70.0 {
            HealthRating::Good
        } else if rate >= 30.0 {
            HealthRating::Fair
        } else {
            HealthRating::Poor
        }
    }
}
