//! Contribution calendar client
//!
//! Fetches a user's public contribution calendar, aggregates it into weekly
//! buckets and writes the result through to the cache.

use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::{info, warn};

use super::{aggregate, ContributionError, ContributionResult, Extractor};
use crate::cache::CacheStore;

/// Upstream host serving profile pages
pub const DEFAULT_BASE_URL: &str = "https://github.com";

/// Default bound on a single upstream request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36 Edg/122.0.0.0";

/// Client for fetching contribution calendars with a write-through cache
#[derive(Clone)]
pub struct ContributionClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Single-slot cache shared by every request
    cache: Arc<dyn CacheStore>,
    /// Scrapes days out of the profile markup
    extractor: Arc<dyn Extractor>,
    /// Base URL for profile pages (allows override for testing)
    base_url: String,
}

impl ContributionClient {
    /// Creates a client against the public upstream host
    ///
    /// Fails only if the HTTP client cannot be initialised (e.g. TLS backend).
    pub fn new(
        cache: Arc<dyn CacheStore>,
        extractor: Arc<dyn Extractor>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            cache,
            extractor,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at a different upstream host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Returns the contribution calendar for `user`
    ///
    /// # Behavior
    /// - Returns the cached result if it is younger than `max_age_days`
    /// - An unreadable cache entry is treated as a miss
    /// - Otherwise fetches the profile page once, with no retries
    /// - An empty scrape returns an empty result and is not cached
    /// - A successful scrape is written to the cache before returning
    ///
    /// # Errors
    /// - `ContributionError::Fetch` if upstream answers with a non-200 status
    /// - `ContributionError::Network` if upstream cannot be reached
    /// - `ContributionError::Parse` if a day's count or date is malformed, or
    ///   the counts overflow the total
    pub async fn get_data(
        &self,
        user: &str,
        max_age_days: u64,
    ) -> Result<ContributionResult, ContributionError> {
        info!(user, "Fetching contribution data");

        if let Some(result) = self.cached_result(max_age_days).await {
            info!("Cache is still valid, returning cached data");
            return Ok(result);
        }

        info!("Cache expired or not found, fetching fresh data");
        let markup = self.fetch_page(user).await?;

        let days = self.extractor.extract(&markup)?;
        if days.is_empty() {
            warn!(user, "No contribution data found");
            return Ok(ContributionResult::default());
        }

        let result = aggregate(days)?;
        self.store_result(&result).await;

        info!(user, total = result.total, "Fetched and cached contribution data");
        Ok(result)
    }

    /// Reads the cache slot off the async runtime, `None` on a miss
    async fn cached_result(&self, max_age_days: u64) -> Option<ContributionResult> {
        let cache = Arc::clone(&self.cache);
        let lookup = task::spawn_blocking(move || {
            if cache.is_valid(max_age_days) {
                Some(cache.read())
            } else {
                None
            }
        })
        .await;

        match lookup {
            Ok(Some(Ok(result))) => Some(result),
            Ok(Some(Err(e))) => {
                warn!(error = %e, "Cached data is unreadable, treating as a miss");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Cache lookup task failed, treating as a miss");
                None
            }
        }
    }

    /// Writes `result` to the cache off the async runtime; failures are logged
    async fn store_result(&self, result: &ContributionResult) {
        let cache = Arc::clone(&self.cache);
        let result = result.clone();
        match task::spawn_blocking(move || cache.write(&result)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to write contribution cache"),
            Err(e) => warn!(error = %e, "Cache write task failed"),
        }
    }

    /// Fetches the raw contributions fragment of a profile page
    async fn fetch_page(&self, user: &str) -> Result<String, ContributionError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), user);

        info!(user, "Sending request upstream");
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("action", "show"),
                ("controller", "profiles"),
                ("tab", "contributions"),
                ("user_id", user),
            ])
            .headers(browser_headers(user))
            .send()
            .await
            .inspect_err(|e| warn!(user, error = %e, "Upstream request failed"))?;

        let status = response.status();
        info!(user, status = status.as_u16(), "Received upstream response");

        if status != StatusCode::OK {
            warn!(user, status = status.as_u16(), "Upstream refused contribution request");
            return Err(ContributionError::Fetch {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Headers mimicking an in-page XHR from a desktop browser
///
/// The contributions endpoint rejects requests that lack them.
fn browser_headers(user: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(referer) = HeaderValue::from_str(&format!("https://github.com/{}", user)) {
        headers.insert(REFERER, referer);
    }
    headers.insert(
        "sec-ch-ua",
        HeaderValue::from_static(
            "\"Chromium\";v=\"122\", \"Not(A:Brand\";v=\"24\", \"Microsoft Edge\";v=\"122\"",
        ),
    );
    headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
    headers.insert("sec-ch-ua-platform", HeaderValue::from_static("\"Windows\""));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
    headers
}
