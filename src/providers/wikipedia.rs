//! Wikipedia article lookup. No fallback: a missing page is a failure.

use super::http::{build_client, fetch_page, HttpSettings};
use super::{profile_payload, ProviderError, SourceProvider};
use crate::models::{Payload, ProviderOutcome, Query};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

pub const ID: &str = "wikipedia";
pub const LABEL: &str = "Wikipedia";

pub struct WikipediaProvider {
    client: Client,
    base_url: String,
    delay: Duration,
}

impl WikipediaProvider {
    pub fn new(base_url: &str, settings: &HttpSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            delay: settings.request_delay,
        })
    }

    /// Article title for a subject (`Virat Kohli` → `Virat_Kohli`).
    pub fn article_title(subject: &str) -> String {
        subject.split_whitespace().collect::<Vec<_>>().join("_")
    }

    async fn lookup(&self, query: &Query) -> Result<Payload, ProviderError> {
        let title = Self::article_title(&query.subject);
        let url = format!("{}/wiki/{}", self.base_url, title);
        let page = fetch_page(&self.client, &url, &[], self.delay).await?;

        match page.status {
            200 => {
                if is_cricket_article(&page.body) {
                    Ok(profile_payload(query, ID, &url, &title.to_lowercase()))
                } else {
                    Err(ProviderError::Irrelevant(
                        "Wikipedia page exists but is not cricket-related".into(),
                    ))
                }
            }
            404 => Err(ProviderError::NotFound(
                "No Wikipedia page found for this player".into(),
            )),
            status => Err(ProviderError::Status(status)),
        }
    }
}

fn is_cricket_article(body: &str) -> bool {
    body.to_lowercase().contains("cricket")
}

#[async_trait]
impl SourceProvider for WikipediaProvider {
    fn id(&self) -> &str {
        ID
    }

    async fn fetch(&self, query: &Query) -> ProviderOutcome {
        match self.lookup(query).await {
            Ok(payload) => {
                info!("{}: found article for {}", ID, query.subject);
                ProviderOutcome::success(ID, payload)
            }
            Err(e) => {
                warn!("{}: {}", ID, e);
                ProviderOutcome::failure(ID, e.to_string())
            }
        }
    }
}
