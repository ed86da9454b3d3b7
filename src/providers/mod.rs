//! Data source providers.
//!
//! Every source implements [`SourceProvider`]. Providers are built once at
//! startup and registered, in a fixed order, in a [`ProviderRegistry`] that is
//! shared by the collector (fan-out set) and the aggregator (report order).

pub mod espn;
pub mod fallback;
pub mod http;
pub mod search;
pub mod wikipedia;

use crate::config::ProvidersConfig;
use crate::models::{Payload, ProviderOutcome, Query};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use http::HttpSettings;

/// Faults inside a provider. Never leaves the provider: converted to a
/// `Failure` (or fallback) outcome before `fetch` returns.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Irrelevant(String),

    #[error("timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(Duration),
}

/// Errors raised while building the provider registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("provider '{0}' is registered twice")]
    DuplicateId(String),

    #[error("unknown provider '{0}' (available: espn_direct, espn_google, wikipedia)")]
    UnknownProvider(String),

    #[error("failed to initialize provider '{id}': {source}")]
    Init {
        id: String,
        #[source]
        source: ProviderError,
    },
}

/// A single data source that can be asked about a player.
///
/// `fetch` must not panic and must not block other providers. Any fault is
/// reported as a `Failure` outcome.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Stable identifier used as the key in aggregated data.
    fn id(&self) -> &str;

    /// Attempt to fetch data for the query.
    async fn fetch(&self, query: &Query) -> ProviderOutcome;
}

/// One registered provider with its display label.
#[derive(Clone)]
pub struct ProviderEntry {
    pub id: String,
    pub label: String,
    pub provider: Arc<dyn SourceProvider>,
}

/// Ordered set of providers, configured at startup.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    entries: Vec<ProviderEntry>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider at the end of the list.
    pub fn register(
        &mut self,
        label: impl Into<String>,
        provider: Arc<dyn SourceProvider>,
    ) -> Result<(), RegistryError> {
        let id = provider.id().to_string();
        if self.entries.iter().any(|e| e.id == id) {
            return Err(RegistryError::DuplicateId(id));
        }

        self.entries.push(ProviderEntry {
            id,
            label: label.into(),
            provider,
        });
        Ok(())
    }

    pub fn entries(&self) -> &[ProviderEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display label for a provider id, or the id itself if unregistered.
    pub fn label_for<'a>(&'a self, id: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.label.as_str())
            .unwrap_or(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }
}

/// Build the registry from the configured, ordered list of provider ids.
pub fn build_registry(
    config: &ProvidersConfig,
    settings: &HttpSettings,
) -> Result<ProviderRegistry, RegistryError> {
    let mut registry = ProviderRegistry::new();

    for id in &config.enabled {
        let init_err = |source| RegistryError::Init {
            id: id.clone(),
            source,
        };

        match id.as_str() {
            espn::ID => {
                let provider = espn::EspnProvider::new(&config.espn_base_url, settings)
                    .map_err(init_err)?;
                registry.register(espn::LABEL, Arc::new(provider))?;
            }
            search::ID => {
                let provider = search::SearchProvider::new(
                    &config.search_base_url,
                    &config.espn_base_url,
                    settings,
                )
                .map_err(init_err)?;
                registry.register(search::LABEL, Arc::new(provider))?;
            }
            wikipedia::ID => {
                let provider = wikipedia::WikipediaProvider::new(
                    &config.wikipedia_base_url,
                    settings,
                )
                .map_err(init_err)?;
                registry.register(wikipedia::LABEL, Arc::new(provider))?;
            }
            other => return Err(RegistryError::UnknownProvider(other.to_string())),
        }
    }

    Ok(registry)
}

/// Payload for a profile found on a live source.
pub(crate) fn profile_payload(query: &Query, source: &str, url: &str, id: &str) -> Payload {
    let mut payload = Payload::new();
    payload.insert("name".to_string(), json!(query.subject));
    payload.insert("url".to_string(), json!(url));
    payload.insert("id".to_string(), json!(id));
    payload.insert("source".to_string(), json!(source));
    payload.insert("format".to_string(), json!(query.format.to_string()));
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{FormatHint, ModeHint};
    use crate::testing::ScriptedProvider;

    #[test]
    fn test_registry_keeps_order_and_labels() {
        let mut registry = ProviderRegistry::new();
        registry
            .register("Second", Arc::new(ScriptedProvider::success("b", 1)))
            .unwrap();
        registry
            .register("First", Arc::new(ScriptedProvider::success("a", 2)))
            .unwrap();

        assert_eq!(registry.ids(), vec!["b", "a"]);
        assert_eq!(registry.label_for("a"), "First");
        assert_eq!(registry.label_for("missing"), "missing");
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = ProviderRegistry::new();
        registry
            .register("A", Arc::new(ScriptedProvider::success("a", 1)))
            .unwrap();
        let err = registry
            .register("A again", Arc::new(ScriptedProvider::failure("a", "x")))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn test_build_registry_from_config() {
        let config = Config::default();
        let settings = HttpSettings::default();
        let registry = build_registry(&config.providers, &settings).unwrap();

        assert_eq!(registry.ids(), vec!["espn_direct", "espn_google", "wikipedia"]);
        assert_eq!(registry.label_for("wikipedia"), "Wikipedia");
    }

    #[test]
    fn test_build_registry_unknown_id() {
        let mut config = Config::default();
        config.providers.enabled = vec!["cricbuzz".to_string()];
        let result = build_registry(&config.providers, &HttpSettings::default());
        assert!(matches!(result, Err(RegistryError::UnknownProvider(_))));
    }

    #[test]
    fn test_profile_payload_fields() {
        let query = Query::new("Joe Root", FormatHint::Test, ModeHint::Batting);
        let payload = profile_payload(&query, "wikipedia", "https://x/Joe_Root", "joe_root");
        assert_eq!(payload["name"], "Joe Root");
        assert_eq!(payload["format"], "Test");
        assert_eq!(payload["source"], "wikipedia");
    }
}
