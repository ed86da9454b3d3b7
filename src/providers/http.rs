//! Shared HTTP plumbing for the web-backed providers.

use super::ProviderError;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// HTTP behaviour shared by all web providers.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    /// Timeout for a single HTTP request.
    pub request_timeout: Duration,
    /// Politeness delay before each request.
    pub request_delay: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: format!("playerscope/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: Duration::from_secs(10),
            request_delay: Duration::from_millis(500),
        }
    }
}

/// A fetched page.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Build the client a provider keeps for its lifetime.
pub fn build_client(settings: &HttpSettings) -> Result<Client, ProviderError> {
    let client = Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(settings.request_timeout)
        .build()?;
    Ok(client)
}

/// GET a page after the politeness delay. Non-200 statuses are returned, not raised.
pub async fn fetch_page(
    client: &Client,
    url: &str,
    params: &[(&str, &str)],
    delay: Duration,
) -> Result<Page, ProviderError> {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    debug!("GET {} {:?}", url, params);
    let response = client.get(url).query(params).send().await?;
    let status = response.status().as_u16();
    let body = response.text().await?;

    Ok(Page { status, body })
}

/// First `href` value in `body` that contains `marker`.
pub fn find_link(body: &str, marker: &str) -> Option<String> {
    let mut rest = body;

    while let Some(pos) = rest.find("href=") {
        rest = &rest[pos + 5..];

        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            continue;
        }

        let value = &rest[1..];
        let end = value.find(quote)?;
        let href = &value[..end];
        if href.contains(marker) {
            return Some(href.to_string());
        }
        rest = &value[end..];
    }

    None
}

/// Path segment that follows `marker` in `link` (`/cricketers/virat-kohli-253802` → `virat-kohli-253802`).
pub fn slug_after(link: &str, marker: &str) -> Option<String> {
    let start = link.find(marker)? + marker.len();
    let slug: String = link[start..]
        .chars()
        .take_while(|c| !matches!(c, '/' | '?' | '#' | '&' | '"'))
        .collect();

    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_link_double_and_single_quotes() {
        let body = r#"<a href="/home">Home</a><a href='/cricketers/virat-kohli-253802'>VK</a>"#;
        assert_eq!(
            find_link(body, "/cricketers/").as_deref(),
            Some("/cricketers/virat-kohli-253802")
        );
    }

    #[test]
    fn test_find_link_skips_unquoted_and_missing() {
        let body = "<a href=/plain>x</a><a href=\"/news/1\">y</a>";
        assert!(find_link(body, "/cricketers/").is_none());
        assert!(find_link("", "/cricketers/").is_none());
    }

    #[test]
    fn test_slug_after_search_redirect() {
        let link = "/url?q=https://www.espncricinfo.com/cricketers/joe-root-303669&sa=U";
        assert_eq!(
            slug_after(link, "espncricinfo.com/cricketers/").as_deref(),
            Some("joe-root-303669")
        );
        assert!(slug_after("/cricketers/", "/cricketers/").is_none());
    }

    #[test]
    fn test_default_settings() {
        let settings = HttpSettings::default();
        assert!(settings.user_agent.starts_with("playerscope/"));
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
    }
}
