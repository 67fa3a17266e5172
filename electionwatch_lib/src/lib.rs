//! Library layer for Electionwatch: results engine, cached API client, and
//! display helpers.
//!
//! Wraps the `electionwatch_api` crate with the contest normalizer and
//! chamber aggregator, an in-memory TTL cache for election metadata, input
//! validation, and a polling client that keeps last-good results across
//! transient fetch failures.

pub mod boundary;
pub mod cache;
pub mod chamber;
pub mod client;
pub mod error;
pub mod format;
pub mod live;
pub mod normalize;
pub mod validation;

pub use electionwatch_api;
pub use electionwatch_api::types;
pub use electionwatch_api::{ContestQuery, ElectionQuery, Query};

pub use chamber::{aggregate, Chamber, ChamberContestSummary, ChamberSummary, SeatBucket};
pub use client::CachedClient;
pub use error::ElectionwatchError;
pub use live::{ContestWatch, LiveClient, Snapshot};
pub use normalize::{
    normalize, normalize_each, CandidateResult, ContestResult, MalformedPolicy, NormalizeError,
    NormalizeOptions, RankedRound, SortBy,
};
