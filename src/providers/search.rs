//! ESPN Cricinfo profiles located through a web search engine.

use super::fallback::fallback_payload;
use super::http::{build_client, fetch_page, find_link, slug_after, HttpSettings};
use super::{profile_payload, ProviderError, SourceProvider};
use crate::models::{Payload, ProviderOutcome, Query};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

pub const ID: &str = "espn_google";
pub const LABEL: &str = "ESPN via Google";

const PROFILE_MARKER: &str = "espncricinfo.com/cricketers/";

pub struct SearchProvider {
    client: Client,
    search_url: String,
    profile_base_url: String,
    delay: Duration,
}

impl SearchProvider {
    pub fn new(
        search_base_url: &str,
        profile_base_url: &str,
        settings: &HttpSettings,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(settings)?,
            search_url: format!("{}/search", search_base_url.trim_end_matches('/')),
            profile_base_url: profile_base_url.trim_end_matches('/').to_string(),
            delay: settings.request_delay,
        })
    }

    async fn search(&self, query: &Query) -> Result<Payload, ProviderError> {
        let terms = format!("site:espncricinfo.com {}", query.subject);
        let page = fetch_page(&self.client, &self.search_url, &[("q", &terms)], self.delay).await?;

        if !page.is_ok() {
            return Err(ProviderError::Status(page.status));
        }

        let slug = find_link(&page.body, PROFILE_MARKER)
            .and_then(|link| slug_after(&link, PROFILE_MARKER))
            .ok_or_else(|| {
                ProviderError::NotFound("no ESPN Cricinfo links in search results".into())
            })?;

        let profile_url = format!("{}/cricketers/{}", self.profile_base_url, slug);
        Ok(profile_payload(query, ID, &profile_url, &slug))
    }
}

#[async_trait]
impl SourceProvider for SearchProvider {
    fn id(&self) -> &str {
        ID
    }

    /// Transport errors fall back to placeholder data; a reachable search
    /// engine that finds nothing is a failure.
    async fn fetch(&self, query: &Query) -> ProviderOutcome {
        match self.search(query).await {
            Ok(payload) => {
                info!("{}: found profile for {}", ID, query.subject);
                ProviderOutcome::success(ID, payload)
            }
            Err(e @ ProviderError::Http(_)) => {
                warn!("{}: {}; using fallback data for {}", ID, e, query.subject);
                ProviderOutcome::fallback(
                    ID,
                    fallback_payload(ID, &self.profile_base_url, "cricketers", query),
                )
            }
            Err(e) => {
                warn!("{}: {}", ID, e);
                ProviderOutcome::failure(ID, e.to_string())
            }
        }
    }
}
