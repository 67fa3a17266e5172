//! Polling layer for election night.
//!
//! Results pages poll the backend on a fixed interval. A failed poll must
//! never blank the screen, so [`LiveClient`] keeps the last good payload
//! per query and serves it flagged stale when a fetch fails. There is no
//! retry inside a tick; the next tick is the retry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use electionwatch_api::types::RawResultRow;
use electionwatch_api::{Client, ContestQuery};
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::contest_query_cache_key;
use crate::error::ElectionwatchError;

/// Default delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Floor for the poll interval. The backend is a shared scrape target;
/// polling faster than this gains nothing because the scraper itself runs
/// on a cadence of about a minute.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(5);

const STARTUP_JITTER_FRACTION: f64 = 0.10;

/// One poll's worth of data, with provenance.
#[derive(Clone, Debug)]
pub struct Snapshot<T> {
    pub data: T,
    /// When this payload was actually fetched. For a stale snapshot this
    /// is the time of the last successful poll, not the failed one.
    pub fetched_at: DateTime<Utc>,
    /// True when the latest poll failed and `data` is the previous
    /// payload.
    pub stale: bool,
}

/// Client for repeated result fetches. Remembers the last good response
/// per query so a transient backend failure degrades to stale data
/// instead of an error.
pub struct LiveClient {
    client: Client,
    last_good: DashMap<String, Snapshot<Vec<RawResultRow>>>,
}

impl LiveClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            last_good: DashMap::new(),
        }
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::with_base_url(base_url),
            last_good: DashMap::new(),
        }
    }

    /// Fetches result rows for `query`. On success the snapshot is fresh
    /// and remembered; on failure the last good snapshot comes back with
    /// `stale` set. Errors only when the query has never succeeded.
    pub async fn fetch_contests(
        &self,
        query: &ContestQuery,
    ) -> Result<Snapshot<Vec<RawResultRow>>, ElectionwatchError> {
        let key = contest_query_cache_key(query);
        match self.client.get_contests_with_results(query).await {
            Ok(resp) => {
                let snapshot = Snapshot {
                    data: resp.data,
                    fetched_at: Utc::now(),
                    stale: false,
                };
                self.last_good.insert(key, snapshot.clone());
                Ok(snapshot)
            }
            Err(err) => match self.last_good.get(&key) {
                Some(last) => {
                    tracing::warn!(
                        "results poll failed, serving data from {}: {}",
                        last.fetched_at,
                        err
                    );
                    let mut snapshot = last.clone();
                    snapshot.stale = true;
                    Ok(snapshot)
                }
                None => Err(err.into()),
            },
        }
    }

    /// Spawns a background task polling `query` every `interval` (clamped
    /// to [`MIN_POLL_INTERVAL`]) and publishing each snapshot on a watch
    /// channel. A small startup jitter keeps concurrently created
    /// watchers from ticking in lockstep. Dropping the returned
    /// [`ContestWatch`] stops the task.
    pub fn watch_contests(
        self: Arc<Self>,
        query: ContestQuery,
        interval: Duration,
    ) -> ContestWatch {
        let interval = interval.max(MIN_POLL_INTERVAL);
        let (tx, rx) = watch::channel(None);

        let handle = tokio::spawn(async move {
            let jitter =
                interval.mul_f64(rand::thread_rng().gen_range(0.0..STARTUP_JITTER_FRACTION));
            tokio::time::sleep(jitter).await;

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.fetch_contests(&query).await {
                    Ok(snapshot) => {
                        if tx.send(Some(snapshot)).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!("results poll failed with nothing to serve: {}", err);
                    }
                }
            }
        });

        ContestWatch { receiver: rx, handle }
    }
}

impl Default for LiveClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running poll task. The task stops when this is dropped.
pub struct ContestWatch {
    receiver: watch::Receiver<Option<Snapshot<Vec<RawResultRow>>>>,
    handle: JoinHandle<()>,
}

impl ContestWatch {
    /// A receiver for the snapshot stream. Holds `None` until the first
    /// poll completes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot<Vec<RawResultRow>>>> {
        self.receiver.clone()
    }
}

impl Drop for ContestWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
