//! Election metadata returned by the `elections` endpoint.

use serde::{Deserialize, Serialize};

/// One election record (e.g. `id-20221108`).
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Election {
    pub election_id: Option<String>,

    /// Election day as `YYYY-MM-DD`. Results fetched before mid-afternoon
    /// Central on this date are the Secretary of State's test feed.
    pub election_date: Option<String>,

    /// True when the record describes a primary election.
    pub primary: Option<bool>,

    /// Unix timestamp of the last scraper run for this election.
    pub updated: Option<i64>,
}
