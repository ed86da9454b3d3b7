//! Single-player analysis and two-player comparison.
//!
//! Public operations always return a [`Report`]. Missing data, summarizer
//! errors and summarizer panics become terminal reports.

use crate::analysis::{aggregate, SourceHealth};
use crate::collector::{panic_message, Collector};
use crate::events::{EventLog, EventRecord, EventType};
use crate::models::{
    AggregatedBundle, FallbackPolicy, FormatHint, ModeHint, Query, Report, ReportStatus,
};
use crate::summarizer::{Summarizer, SummarizerError};
use chrono::Utc;
use futures::FutureExt;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub struct Coordinator {
    collector: Collector,
    summarizer: Arc<dyn Summarizer>,
    policy: FallbackPolicy,
    events: Option<Arc<EventLog>>,
}

impl Coordinator {
    pub fn new(collector: Collector, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            collector,
            summarizer,
            policy: FallbackPolicy::default(),
            events: None,
        }
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_event_log(mut self, events: Arc<EventLog>) -> Self {
        self.events = Some(events);
        self
    }

    /// Collect and aggregate data for one query.
    pub async fn gather(&self, query: &Query) -> AggregatedBundle {
        let outcomes = self.collector.collect_all(query).await;
        aggregate(query, outcomes, self.collector.registry())
    }

    /// Analyze one player.
    pub async fn analyze_one(&self, subject: &str, format: FormatHint, mode: ModeHint) -> Report {
        let started = Instant::now();
        let query = Query::new(subject, format, mode);
        info!("Starting analysis for {} ({}, {})", query.subject, format, mode);

        let bundle = self.gather(&query).await;

        let (status, body) = if bundle.eligible_count(self.policy) == 0 {
            warn!("No usable sources for {}", query.subject);
            (
                ReportStatus::NoSources,
                format!(
                    "No data sources were successful for {}. All sources failed.",
                    query.subject
                ),
            )
        } else {
            info!(
                "Sending {} successful results to the {} summarizer",
                bundle.successful_subset.len(),
                self.summarizer.name()
            );
            match guarded(self.summarizer.summarize_one(
                &query.subject,
                format,
                mode,
                &bundle.successful_subset,
            ))
            .await
            {
                Ok(text) => (ReportStatus::Completed, text),
                Err(e) => {
                    warn!("Summarizer failed for {}: {}", query.subject, e);
                    (
                        ReportStatus::SummarizerFailed,
                        format!("Error analyzing player {}: {}", query.subject, e),
                    )
                }
            }
        };

        let report = Report {
            subject: query.subject.clone(),
            format,
            mode,
            elapsed_seconds: started.elapsed().as_secs_f64(),
            status_report: bundle.status_report.clone(),
            body,
            source_count: bundle.successful_subset.len(),
            health: SourceHealth::from_bundles(&[&bundle]),
            status,
            generated_at: Utc::now(),
        };

        self.record_event(
            EventType::Analysis,
            format!("Analyze player: {} ({})", query.subject, format),
            &report,
            &[&bundle],
        );

        report
    }

    /// Compare two players. Both need at least one usable source.
    pub async fn compare_two(
        &self,
        subject_a: &str,
        subject_b: &str,
        format: FormatHint,
        mode: ModeHint,
    ) -> Report {
        let started = Instant::now();
        let query_a = Query::new(subject_a, format, mode);
        let query_b = Query::new(subject_b, format, mode);
        info!(
            "Starting comparison: {} vs {} ({}, {})",
            query_a.subject, query_b.subject, format, mode
        );

        let (bundle_a, bundle_b) = tokio::join!(self.gather(&query_a), self.gather(&query_b));

        let lacking: Vec<&str> = [&bundle_a, &bundle_b]
            .iter()
            .filter(|b| b.eligible_count(self.policy) == 0)
            .map(|b| b.query.subject.as_str())
            .collect();

        let (status, body) = if !lacking.is_empty() {
            warn!("Insufficient data for comparison: {}", lacking.join(", "));
            (
                ReportStatus::NoSources,
                format!(
                    "Insufficient data for comparison: no data sources were successful for {}.",
                    lacking.join(" and ")
                ),
            )
        } else {
            match guarded(self.summarizer.summarize_two(
                &query_a.subject,
                &query_b.subject,
                format,
                mode,
                &bundle_a.successful_subset,
                &bundle_b.successful_subset,
            ))
            .await
            {
                Ok(text) => (ReportStatus::Completed, text),
                Err(e) => {
                    warn!("Summarizer failed for comparison: {}", e);
                    (
                        ReportStatus::SummarizerFailed,
                        format!("Error comparing players: {}", e),
                    )
                }
            }
        };

        let status_report = format!(
            "{}:\n{}\n\n{}:\n{}",
            query_a.subject, bundle_a.status_report, query_b.subject, bundle_b.status_report
        );

        let report = Report {
            subject: format!("{} vs {}", query_a.subject, query_b.subject),
            format,
            mode,
            elapsed_seconds: started.elapsed().as_secs_f64(),
            status_report,
            body,
            source_count: bundle_a.successful_subset.len() + bundle_b.successful_subset.len(),
            health: SourceHealth::from_bundles(&[&bundle_a, &bundle_b]),
            status,
            generated_at: Utc::now(),
        };

        self.record_event(
            EventType::Comparison,
            format!(
                "Compare players: {} vs {} ({})",
                query_a.subject, query_b.subject, format
            ),
            &report,
            &[&bundle_a, &bundle_b],
        );

        report
    }

    fn record_event(
        &self,
        event_type: EventType,
        user_input: String,
        report: &Report,
        bundles: &[&AggregatedBundle],
    ) {
        let Some(ref events) = self.events else {
            return;
        };

        let mut metadata = BTreeMap::new();
        metadata.insert("format".to_string(), report.format.to_string());
        metadata.insert("mode".to_string(), report.mode.to_string());
        metadata.insert("summarizer".to_string(), self.summarizer.name().to_string());
        for bundle in bundles {
            metadata.insert(
                format!("sources:{}", bundle.query.subject),
                bundle.successful_subset.keys().cloned().collect::<Vec<_>>().join(","),
            );
        }

        events.record(EventRecord {
            event_type,
            user_input,
            processing_time: report.elapsed_seconds,
            success: report.status.is_success(),
            error_message: (!report.status.is_success()).then(|| report.body.clone()),
            metadata,
        });
    }
}

/// Run a summarizer call, turning a panic into [`SummarizerError::Panicked`].
async fn guarded<F>(call: F) -> Result<String, SummarizerError>
where
    F: Future<Output = Result<String, SummarizerError>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(SummarizerError::Panicked(panic_message(&*panic))),
    }
}
