//! ESPN Cricinfo site search.
//!
//! Falls back to placeholder data whenever the live search does not yield a
//! profile link, so this source never reports a plain failure.

use super::fallback::fallback_payload;
use super::http::{build_client, fetch_page, find_link, slug_after, HttpSettings};
use super::{profile_payload, ProviderError, SourceProvider};
use crate::models::{Payload, ProviderOutcome, Query};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const ID: &str = "espn_direct";
pub const LABEL: &str = "ESPN Cricinfo Direct";

const PROFILE_MARKER: &str = "/cricketers/";

pub struct EspnProvider {
    client: Client,
    base_url: String,
    delay: Duration,
}

impl EspnProvider {
    pub fn new(base_url: &str, settings: &HttpSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            delay: settings.request_delay,
        })
    }

    /// Search request shapes, tried in order: the query as a parameter, then
    /// baked into the URL.
    fn search_requests(&self, query: &Query) -> Vec<(String, bool)> {
        let url = format!("{}/search", self.base_url);
        let mut requests = vec![(url.clone(), true)];
        if let Ok(inline) = Url::parse_with_params(&url, &[("q", &query.subject)]) {
            requests.push((inline.to_string(), false));
        }
        requests
    }

    async fn search(&self, query: &Query) -> Result<Payload, ProviderError> {
        let mut last_err = ProviderError::NotFound("no search attempted".into());
        let query_params = [("q", query.subject.as_str())];

        for (url, with_params) in self.search_requests(query) {
            let params: &[(&str, &str)] = if with_params {
                &query_params
            } else {
                &[]
            };

            match self.search_once(&url, params, query).await {
                Ok(payload) => return Ok(payload),
                Err(e) => {
                    debug!("{}: search via {} failed: {}", ID, url, e);
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }

    async fn search_once(
        &self,
        url: &str,
        params: &[(&str, &str)],
        query: &Query,
    ) -> Result<Payload, ProviderError> {
        let page = fetch_page(&self.client, url, params, self.delay).await?;

        if !page.is_ok() {
            return Err(ProviderError::Status(page.status));
        }

        let link = find_link(&page.body, PROFILE_MARKER)
            .ok_or_else(|| ProviderError::NotFound("no player links in search results".into()))?;
        let slug = slug_after(&link, PROFILE_MARKER)
            .ok_or_else(|| ProviderError::NotFound(format!("malformed profile link: {}", link)))?;

        let profile_url = if link.starts_with("http") {
            link.clone()
        } else {
            format!("{}{}", self.base_url, link)
        };

        Ok(profile_payload(query, ID, &profile_url, &slug))
    }
}

#[async_trait]
impl SourceProvider for EspnProvider {
    fn id(&self) -> &str {
        ID
    }

    async fn fetch(&self, query: &Query) -> ProviderOutcome {
        match self.search(query).await {
            Ok(payload) => {
                info!("{}: found profile for {}", ID, query.subject);
                ProviderOutcome::success(ID, payload)
            }
            Err(e) => {
                warn!("{}: {}; using fallback data for {}", ID, e, query.subject);
                ProviderOutcome::fallback(
                    ID,
                    fallback_payload(ID, &self.base_url, "cricketers", query),
                )
            }
        }
    }
}
