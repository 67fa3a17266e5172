//! Caching and retrying wrapper around the API client.
//!
//! Election metadata and contest listings change rarely, so those fetches
//! are cached. Result rows are the whole point of polling and are never
//! cached: every call goes to the network so a tick always reflects the
//! latest scrape. Transient failures (timeouts, 429s, 5xx from the
//! backend's dyno) are retried with exponential backoff; request spacing
//! is the poll loop's job, not this layer's.

use std::time::Duration;

use electionwatch_api::types::{ContestFields, Election, PaginatedResponse, RawResultRow};
use electionwatch_api::{Client, ContestQuery, ElectionQuery};
use rand::Rng;

use crate::cache::MemoryCache;
use crate::error::ElectionwatchError;

/// API client wrapper that adds in-memory caching of slow-moving data and
/// retry with backoff for transient failures.
pub struct CachedClient {
    inner: Client,
    cache: MemoryCache,
}

struct RetryConfig {
    max_retries: usize,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryConfig {
    fn from_env() -> Self {
        Self {
            max_retries: env_usize("ELECTIONWATCH_RETRY_MAX", 3),
            base_delay_ms: env_u64("ELECTIONWATCH_RETRY_BASE_MS", 2000),
            max_delay_ms: env_u64("ELECTIONWATCH_RETRY_MAX_MS", 30000),
        }
    }

    fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(30) as u32;
        let exp = 1u64 << shift;
        let base = self
            .base_delay_ms
            .saturating_mul(exp)
            .min(self.max_delay_ms);
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_millis((base as f64 * jitter) as u64)
    }
}

impl CachedClient {
    /// Creates a new cached client using the production API URL.
    pub fn new(cache: MemoryCache) -> Self {
        Self {
            inner: Client::new(),
            cache,
        }
    }

    /// Creates a new cached client with a custom base URL. Used for
    /// self-hosted backends and for testing.
    pub fn with_base_url(base_url: &str, cache: MemoryCache) -> Self {
        Self {
            inner: Client::with_base_url(base_url),
            cache,
        }
    }

    async fn with_retry<T, F, Fut>(&self, label: &str, mut f: F) -> Result<T, ElectionwatchError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ElectionwatchError>>,
    {
        let cfg = RetryConfig::from_env();
        let mut attempt = 0usize;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt > cfg.max_retries || !is_retryable(&err) {
                        return Err(err);
                    }
                    let delay = cfg.delay_for_attempt(attempt);
                    tracing::warn!(
                        "{} request failed (attempt {}/{}), retrying in {:.1}s",
                        label,
                        attempt,
                        cfg.max_retries,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Fetches contest rows (no result columns), cached between refreshes.
    pub async fn get_contests(
        &self,
        query: &ContestQuery,
    ) -> Result<PaginatedResponse<ContestFields>, ElectionwatchError> {
        let cache_key = format!("contests:{}", contest_query_cache_key(query));

        if let Some(resp) = self.cache.get_as(&cache_key)? {
            return Ok(resp);
        }

        let resp = self
            .with_retry("contests", || async {
                Ok(self.inner.get_contests(query).await?)
            })
            .await?;
        if let Err(e) = self.cache.set_as(cache_key, &resp) {
            tracing::warn!("Failed to cache contests response: {}", e);
        }
        Ok(resp)
    }

    /// Fetches joined contest and result rows. Never cached: results are
    /// what the poll loop is watching.
    pub async fn get_contests_with_results(
        &self,
        query: &ContestQuery,
    ) -> Result<PaginatedResponse<RawResultRow>, ElectionwatchError> {
        self.with_retry("results", || async {
            Ok(self.inner.get_contests_with_results(query).await?)
        })
        .await
    }

    /// Fetches election records, cached between refreshes.
    pub async fn get_elections(
        &self,
        query: &ElectionQuery,
    ) -> Result<PaginatedResponse<Election>, ElectionwatchError> {
        let cache_key = format!("elections:{}", election_query_cache_key(query));

        if let Some(resp) = self.cache.get_as(&cache_key)? {
            return Ok(resp);
        }

        let resp = self
            .with_retry("elections", || async {
                Ok(self.inner.get_elections(query).await?)
            })
            .await?;
        if let Err(e) = self.cache.set_as(cache_key, &resp) {
            tracing::warn!("Failed to cache elections response: {}", e);
        }
        Ok(resp)
    }

    /// The most recent election the backend knows about. Election ids embed
    /// their date (`id-YYYYMMDD`), so the lexicographic maximum is the
    /// newest.
    pub async fn current_election(&self) -> Result<Election, ElectionwatchError> {
        let resp = self.get_elections(&ElectionQuery::default()).await?;
        resp.data
            .into_iter()
            .max_by(|a, b| a.election_id.cmp(&b.election_id))
            .ok_or_else(|| ElectionwatchError::NotFound("no elections in the backend".to_string()))
    }

    /// Looks up one election by id.
    pub async fn find_election(&self, election_id: &str) -> Result<Election, ElectionwatchError> {
        let resp = self.get_elections(&ElectionQuery::default()).await?;
        resp.data
            .into_iter()
            .find(|e| e.election_id.as_deref() == Some(election_id))
            .ok_or_else(|| {
                ElectionwatchError::NotFound(format!("election {}", election_id))
            })
    }

    /// Removes all cached responses.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

fn is_retryable(err: &ElectionwatchError) -> bool {
    match err {
        ElectionwatchError::Api(api_err) => match api_err {
            electionwatch_api::Error::RequestFailed => true,
            electionwatch_api::Error::HttpStatus { status, .. } => {
                *status == 429 || *status >= 500
            }
            electionwatch_api::Error::Decode { .. } => false,
        },
        _ => false,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(default)
}

pub(crate) fn contest_query_cache_key(query: &ContestQuery) -> String {
    format!(
        "e{:?}:t{:?}:s{:?}:g{:?}:ids{:?}:a{:?}:c{:?}:b{:?}:l{:?}:o{:?}",
        query.common.election_id,
        query.title,
        query.scope,
        query.results_group,
        query.contest_ids,
        query.address,
        query.coordinates,
        query.boundary,
        query.common.limit,
        query.common.offset,
    )
}

fn election_query_cache_key(query: &ElectionQuery) -> String {
    format!(
        "e{:?}:l{:?}:o{:?}",
        query.common.election_id, query.common.limit, query.common.offset,
    )
}
