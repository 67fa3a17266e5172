//! HTTP client for the election results API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    query::{ContestQuery, ElectionQuery, Query},
    types::{ContestFields, Election, PaginatedResponse, RawResultRow},
    Error,
};

const USER_AGENT: &str = concat!("electionwatch/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the election results API.
///
/// The API is a read-only JSON source refreshed by a scraper on its own
/// schedule, so every call here is an idempotent GET. Each request builds
/// a fresh `reqwest::Client` with a 30-second timeout; result sets are
/// small enough that connection reuse buys nothing during a poll cycle.
pub struct Client {
    /// Base URL for the API, without the trailing slash.
    base_api_url: String,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a new client pointing at the production results API.
    pub fn new() -> Self {
        Self {
            base_api_url: "https://minnpost-mn-election-results.herokuapp.com/api".to_string(),
        }
    }

    /// Creates a new client with a custom base URL. Used for self-hosted
    /// backends and for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn get_url(&self, path: &str, query: Option<&impl Query>) -> Result<Url, Error> {
        let url = Url::parse(format!("{}{}", &self.base_api_url, path).as_str()).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })?;
        Ok(match query {
            Some(query) => query.add_to_url(&url),
            None => url,
        })
    }

    async fn get<T, Q>(&self, path: &str, query: Option<&Q>) -> Result<T, Error>
    where
        T: DeserializeOwned,
        Q: Query,
    {
        let url = self.get_url(path, query)?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        let resp = client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get resource: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let parsed = serde_json::from_str::<T>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::Decode {
                reason: e.to_string(),
            }
        })?;

        Ok(parsed)
    }

    /// Fetches contest rows without result columns. Cheaper than the full
    /// join when only existence or status is needed.
    pub async fn get_contests(
        &self,
        query: &ContestQuery,
    ) -> Result<PaginatedResponse<ContestFields>, Error> {
        self.get::<PaginatedResponse<ContestFields>, ContestQuery>("/contests/", Some(query))
            .await
    }

    /// Fetches joined contest and result rows, one row per candidate per
    /// ranked-choice round. This is the feed the engine normalizes.
    pub async fn get_contests_with_results(
        &self,
        query: &ContestQuery,
    ) -> Result<PaginatedResponse<RawResultRow>, Error> {
        self.get::<PaginatedResponse<RawResultRow>, ContestQuery>(
            "/contests-with-results/",
            Some(query),
        )
        .await
    }

    /// Fetches election metadata records.
    pub async fn get_elections(
        &self,
        query: &ElectionQuery,
    ) -> Result<PaginatedResponse<Election>, Error> {
        self.get::<PaginatedResponse<Election>, ElectionQuery>("/elections/", Some(query))
            .await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        format!("{}...[truncated]", &body[..MAX])
    }
}
