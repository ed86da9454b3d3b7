//! Concurrent fan-out of one query to every registered provider.
//!
//! Each provider runs in its own tokio task. The collector waits for all of
//! them and always returns exactly one outcome per provider, in registration
//! order, whatever order the tasks finish in.

use crate::models::{OutcomeStatus, ProviderOutcome, Query};
use crate::providers::{ProviderError, ProviderRegistry, SourceProvider};
use futures::future::join_all;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

/// Fans queries out to a fixed provider registry.
#[derive(Clone)]
pub struct Collector {
    registry: Arc<ProviderRegistry>,
    /// Upper bound for a single provider call. `None` waits indefinitely.
    timeout: Option<Duration>,
}

impl Collector {
    pub fn new(registry: Arc<ProviderRegistry>, timeout: Option<Duration>) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Query every provider concurrently and wait for all of them.
    pub async fn collect_all(&self, query: &Query) -> Vec<ProviderOutcome> {
        let started = Instant::now();
        let shared = Arc::new(query.clone());

        info!(
            "Collecting data for {} from {} sources",
            query.subject,
            self.registry.len()
        );

        let handles: Vec<_> = self
            .registry
            .entries()
            .iter()
            .map(|entry| {
                let provider = Arc::clone(&entry.provider);
                let query = Arc::clone(&shared);
                let id = entry.id.clone();
                let timeout = self.timeout;

                tokio::spawn(async move { run_provider(provider, &query, &id, timeout).await })
            })
            .collect();

        let results = join_all(handles).await;

        let outcomes: Vec<ProviderOutcome> = results
            .into_iter()
            .zip(self.registry.entries())
            .map(|(result, entry)| match result {
                Ok(outcome) => require_payload(restamp(outcome, &entry.id)),
                Err(e) => {
                    error!("{}: provider task failed: {}", entry.id, e);
                    ProviderOutcome::failure(&entry.id, describe_join_error(e))
                }
            })
            .collect();

        for outcome in &outcomes {
            match outcome.status {
                OutcomeStatus::Success => info!("{}: success", outcome.provider_id),
                OutcomeStatus::SuccessFallback => {
                    info!("{}: success (fallback data)", outcome.provider_id)
                }
                OutcomeStatus::Failure => {
                    warn!("{}: failed - {}", outcome.provider_id, outcome.reason())
                }
            }
        }

        debug!(
            "Collection for {} finished in {:.2}s",
            query.subject,
            started.elapsed().as_secs_f64()
        );

        outcomes
    }
}

async fn run_provider(
    provider: Arc<dyn SourceProvider>,
    query: &Query,
    id: &str,
    timeout: Option<Duration>,
) -> ProviderOutcome {
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, provider.fetch(query)).await {
            Ok(outcome) => outcome,
            Err(_) => ProviderOutcome::failure(id, ProviderError::Timeout(limit).to_string()),
        },
        None => provider.fetch(query).await,
    }
}

/// Outcomes always carry the id the provider was registered under.
fn restamp(mut outcome: ProviderOutcome, id: &str) -> ProviderOutcome {
    if outcome.provider_id != id {
        warn!(
            "Provider {} returned an outcome stamped '{}'; re-stamping",
            id, outcome.provider_id
        );
        outcome.provider_id = id.to_string();
    }
    outcome
}

/// A success without data is counted as a failure, so `k/N` always equals
/// the size of the successful subset.
fn require_payload(outcome: ProviderOutcome) -> ProviderOutcome {
    if outcome.status.is_success() && outcome.payload.is_none() {
        warn!("{}: reported success without a payload", outcome.provider_id);
        return ProviderOutcome::failure(outcome.provider_id, "success without payload");
    }
    outcome
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_cancelled() {
        return "provider task was cancelled".to_string();
    }

    format!("provider panicked: {}", panic_message(&*err.into_panic()))
}

/// Text of a panic payload raised with `panic!("...")`.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FormatHint, ModeHint};
    use crate::testing::{registry_of, runs_payload, ScriptedProvider};

    fn query() -> Query {
        Query::new("Player X", FormatHint::All, ModeHint::Batting)
    }

    fn collector(providers: Vec<Arc<dyn SourceProvider>>) -> Collector {
        Collector::new(Arc::new(registry_of(providers)), None)
    }

    #[tokio::test]
    async fn test_one_outcome_per_provider() {
        let collector = collector(vec![
            Arc::new(ScriptedProvider::success("a", 100)),
            Arc::new(ScriptedProvider::failure("b", "timeout")),
            Arc::new(ScriptedProvider::fallback("c", 0)),
            Arc::new(ScriptedProvider::panicking("d")),
        ]);

        let outcomes = collector.collect_all(&query()).await;

        assert_eq!(outcomes.len(), 4);
        let ids: Vec<_> = outcomes.iter().map(|o| o.provider_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(outcomes[0].payload, Some(runs_payload(100)));
        assert_eq!(outcomes[1].reason(), "timeout");
        assert_eq!(outcomes[2].status, OutcomeStatus::SuccessFallback);
    }

    #[tokio::test]
    async fn test_panicking_provider_becomes_failure() {
        let collector = collector(vec![
            Arc::new(ScriptedProvider::panicking("boom")),
            Arc::new(ScriptedProvider::success("ok", 5)),
        ]);

        let outcomes = collector.collect_all(&query()).await;

        assert_eq!(outcomes[0].status, OutcomeStatus::Failure);
        assert!(outcomes[0].reason().contains("panicked"));
        assert!(outcomes[0].reason().contains("scripted provider boom crashed"));
        assert_eq!(outcomes[1].status, OutcomeStatus::Success);
    }

    #[tokio::test]
    async fn test_order_independent_of_completion_time() {
        let run = |delays: [u64; 3]| {
            let collector = collector(vec![
                Arc::new(
                    ScriptedProvider::success("first", 1)
                        .with_delay(Duration::from_millis(delays[0])),
                ),
                Arc::new(
                    ScriptedProvider::failure("second", "x")
                        .with_delay(Duration::from_millis(delays[1])),
                ),
                Arc::new(
                    ScriptedProvider::fallback("third", 0)
                        .with_delay(Duration::from_millis(delays[2])),
                ),
            ]);
            async move {
                collector
                    .collect_all(&query())
                    .await
                    .into_iter()
                    .map(|o| o.provider_id)
                    .collect::<Vec<_>>()
            }
        };

        let slow_first = run([120, 10, 60]).await;
        let slow_last = run([10, 60, 120]).await;

        assert_eq!(slow_first, vec!["first", "second", "third"]);
        assert_eq!(slow_first, slow_last);
    }

    #[tokio::test]
    async fn test_wall_time_bounded_by_slowest_provider() {
        let delay = Duration::from_millis(200);
        let collector = collector(vec![
            Arc::new(ScriptedProvider::success("a", 1).with_delay(delay)),
            Arc::new(ScriptedProvider::success("b", 2).with_delay(delay)),
            Arc::new(ScriptedProvider::success("c", 3).with_delay(delay)),
        ]);

        let started = Instant::now();
        let outcomes = collector.collect_all(&query()).await;
        let elapsed = started.elapsed();

        assert_eq!(outcomes.len(), 3);
        assert!(elapsed >= delay);
        assert!(elapsed < delay.mul_f64(1.5), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_timeout_converts_stalled_provider() {
        let registry = registry_of(vec![
            Arc::new(ScriptedProvider::success("slow", 1).with_delay(Duration::from_secs(5))),
            Arc::new(ScriptedProvider::success("fast", 2)),
        ]);
        let collector = Collector::new(Arc::new(registry), Some(Duration::from_millis(100)));

        let started = Instant::now();
        let outcomes = collector.collect_all(&query()).await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(outcomes[0].status, OutcomeStatus::Failure);
        assert_eq!(outcomes[0].reason(), "timed out after 0.1s");
        assert_eq!(outcomes[1].status, OutcomeStatus::Success);
    }

    #[tokio::test]
    async fn test_outcome_restamped_with_registered_id() {
        let collector = collector(vec![Arc::new(
            ScriptedProvider::success("real", 1).stamped_as("impostor"),
        )]);

        let outcomes = collector.collect_all(&query()).await;

        assert_eq!(outcomes[0].provider_id, "real");
    }

    #[tokio::test]
    async fn test_success_without_payload_becomes_failure() {
        let collector = collector(vec![
            Arc::new(ScriptedProvider::without_payload("empty")),
            Arc::new(ScriptedProvider::success("full", 3)),
        ]);

        let outcomes = collector.collect_all(&query()).await;

        assert_eq!(outcomes[0].provider_id, "empty");
        assert_eq!(outcomes[0].status, OutcomeStatus::Failure);
        assert_eq!(outcomes[0].reason(), "success without payload");
        assert_eq!(outcomes[1].status, OutcomeStatus::Success);
    }

    #[tokio::test]
    async fn test_each_provider_called_once() {
        let a = Arc::new(ScriptedProvider::success("a", 1));
        let b = Arc::new(ScriptedProvider::failure("b", "x"));
        let collector = collector(vec![
            a.clone() as Arc<dyn SourceProvider>,
            b.clone() as Arc<dyn SourceProvider>,
        ]);

        collector.collect_all(&query()).await;

        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
    }
}
