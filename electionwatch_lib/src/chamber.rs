//! Chamber-control aggregation.
//!
//! Rolls the raw rows for every legislative contest in one chamber into
//! seat counts, flip tracking, and a display ordering that surfaces the
//! races still in play. Unlike [`crate::normalize`], bad data never fails
//! the whole call: a broken contest group is logged and dropped, and the
//! rest of the chamber still comes back.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use electionwatch_api::types::RawResultRow;

use crate::normalize::MalformedPolicy;

/// Gap in percentage points under which a finished, uncalled contest is
/// reported as too close to call. Covers the lag of late-counted mail
/// ballots; not derived from any data field.
pub const TOO_CLOSE_MARGIN: f64 = 3.0;

/// A legislative chamber tracked by the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Chamber {
    Senate,
    House,
}

impl Chamber {
    /// Contest scope value the API uses for this chamber.
    pub fn scope(&self) -> &'static str {
        match self {
            Chamber::Senate => "state_senate",
            Chamber::House => "state_house",
        }
    }

    /// Party whose net seat change the dashboard headlines for this
    /// chamber: the one contesting control going into the election.
    pub fn default_tracked_party(&self) -> &'static str {
        match self {
            Chamber::Senate => "DFL",
            Chamber::House => "R",
        }
    }
}

impl fmt::Display for Chamber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chamber::Senate => write!(f, "senate"),
            Chamber::House => write!(f, "house"),
        }
    }
}

/// Bucket a seat falls into for the chamber-wide tally.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeatBucket {
    /// Decided for a party.
    Party(String),
    /// Finished but inside [`TOO_CLOSE_MARGIN`] and not called.
    TooClose,
    /// Still counting.
    Undecided,
}

impl SeatBucket {
    pub fn label(&self) -> &str {
        match self {
            SeatBucket::Party(party) => party,
            SeatBucket::TooClose => "tooclose",
            SeatBucket::Undecided => "undecided",
        }
    }
}

impl fmt::Display for SeatBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for SeatBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One candidate's line inside a chamber contest.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChamberCandidate {
    pub candidate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
    pub percentage: Option<f64>,
    pub votes_candidate: Option<i64>,
}

/// One contest within a chamber query.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChamberContestSummary {
    pub id: String,
    pub title: Option<String>,
    pub precincts_reporting: i64,
    pub total_effected_precincts: i64,
    /// Party holding the seat going in.
    pub incumbent_party: Option<String>,
    /// Manual race call from the newsroom, which overrides the margin
    /// check.
    pub called: bool,
    pub done: bool,
    /// At least one precinct has reported.
    pub some_reporting: bool,
    /// Winning party once decided. `None` while counting or too close.
    pub party_won: Option<String>,
    /// The seat changed hands relative to `incumbent_party`.
    pub party_shift: bool,
    pub tooclose: bool,
    /// Gap in percentage points between the top two candidates. `None`
    /// for uncontested races or unreported shares.
    pub margin: Option<f64>,
    pub results: Vec<ChamberCandidate>,
}

/// Chamber-wide rollup produced by [`aggregate`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChamberSummary {
    pub chamber: Chamber,
    /// Party whose flips `net_change` tracks.
    pub tracked_party: String,
    /// Seats per bucket, decided and undecided alike.
    pub counts: BTreeMap<SeatBucket, i64>,
    /// Net seats the tracked party gained or lost through flips. Holds
    /// contribute nothing.
    pub net_change: i64,
    /// Every surviving contest has finished reporting.
    pub all_done: bool,
    /// Contests in display order: decided tracked-party seats first, then
    /// other decided seats, too-close races, races mid-count, and races
    /// with nothing in yet, title-alphabetical within each band.
    pub contests: Vec<ChamberContestSummary>,
}

/// Aggregates raw rows spanning many contests into a [`ChamberSummary`].
///
/// Rows without a contest id are dropped with a warning. A contest group
/// that cannot be summarized (no candidates left, or a malformed column
/// under [`MalformedPolicy::Fail`]) is dropped the same way; sibling
/// contests are unaffected and the summary stays partial rather than
/// failing.
pub fn aggregate(
    rows: &[RawResultRow],
    chamber: Chamber,
    tracked_party: &str,
    malformed: MalformedPolicy,
) -> ChamberSummary {
    let mut groups: BTreeMap<&str, Vec<&RawResultRow>> = BTreeMap::new();
    for row in rows {
        match row.contest.contest_id.as_deref() {
            Some(id) => groups.entry(id).or_default().push(row),
            None => tracing::warn!(
                "Dropping row without a contest id (candidate {:?})",
                row.result.candidate
            ),
        }
    }

    let mut contests: Vec<ChamberContestSummary> = groups
        .into_iter()
        .filter_map(|(id, group)| summarize_contest(id, &group, malformed))
        .collect();

    let mut counts: BTreeMap<SeatBucket, i64> = BTreeMap::new();
    let mut net_change = 0i64;
    for contest in &contests {
        *counts.entry(seat_bucket(contest)).or_insert(0) += 1;
        if contest.party_shift {
            if contest.party_won.as_deref() == Some(tracked_party) {
                net_change += 1;
            }
            if contest.incumbent_party.as_deref() == Some(tracked_party) {
                net_change -= 1;
            }
        }
    }
    let all_done = contests.iter().all(|c| c.done);

    contests.sort_by(|a, b| {
        display_rank(a, tracked_party)
            .cmp(&display_rank(b, tracked_party))
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.id.cmp(&b.id))
    });

    ChamberSummary {
        chamber,
        tracked_party: tracked_party.to_string(),
        counts,
        net_change,
        all_done,
        contests,
    }
}

fn summarize_contest(
    id: &str,
    group: &[&RawResultRow],
    malformed: MalformedPolicy,
) -> Option<ChamberContestSummary> {
    let contest = &group[0].contest;

    let mut results = Vec::with_capacity(group.len());
    for row in group {
        let result = &row.result;
        let percentage = match &result.percentage {
            None => None,
            Some(raw) => match raw.as_f64() {
                Some(v) => Some(v),
                None => match malformed {
                    MalformedPolicy::Fail => {
                        tracing::warn!(
                            "Dropping contest {} over a malformed percentage for candidate {:?}",
                            id,
                            result.candidate
                        );
                        return None;
                    }
                    MalformedPolicy::DropRow => {
                        tracing::warn!(
                            "Dropping row with a malformed percentage for candidate {:?} in contest {}",
                            result.candidate,
                            id
                        );
                        continue;
                    }
                },
            },
        };
        results.push(ChamberCandidate {
            candidate: result.candidate.clone().unwrap_or_default(),
            candidate_id: result.candidate_id.clone(),
            party_id: result.party_id.clone(),
            percentage,
            votes_candidate: result.votes_candidate.as_ref().and_then(|v| v.as_i64()),
        });
    }
    if results.is_empty() {
        tracing::warn!("Dropping contest {} with no candidates", id);
        return None;
    }

    results.sort_by(|a, b| a.candidate.cmp(&b.candidate));
    results.sort_by(|a, b| {
        let a = a.percentage.unwrap_or(f64::NEG_INFINITY);
        let b = b.percentage.unwrap_or(f64::NEG_INFINITY);
        b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
    });

    let precincts_reporting = contest.precincts_reporting.unwrap_or(0);
    let total_effected_precincts = contest.total_effected_precincts.unwrap_or(0);
    let done = precincts_reporting == total_effected_precincts;
    let called = contest.called.unwrap_or(false);

    let margin = match results.as_slice() {
        [top, second, ..] => match (top.percentage, second.percentage) {
            (Some(t), Some(s)) => Some(t - s),
            _ => None,
        },
        _ => None,
    };
    let tooclose = done && !called && margin.map_or(false, |m| m < TOO_CLOSE_MARGIN);
    let party_won = if done && !tooclose {
        results.first().and_then(|r| r.party_id.clone())
    } else {
        None
    };
    let party_shift = done
        && party_won.is_some()
        && party_won.as_deref() != contest.incumbent_party.as_deref();

    Some(ChamberContestSummary {
        id: id.to_string(),
        title: contest.title.clone(),
        precincts_reporting,
        total_effected_precincts,
        incumbent_party: contest.incumbent_party.clone(),
        called,
        done,
        some_reporting: precincts_reporting > 0,
        party_won,
        party_shift,
        tooclose,
        margin,
        results,
    })
}

fn seat_bucket(contest: &ChamberContestSummary) -> SeatBucket {
    if !contest.done {
        return SeatBucket::Undecided;
    }
    if contest.tooclose {
        return SeatBucket::TooClose;
    }
    match &contest.party_won {
        Some(party) => SeatBucket::Party(party.clone()),
        None => {
            tracing::warn!("Contest {} finished without a winning party", contest.id);
            SeatBucket::Undecided
        }
    }
}

fn display_rank(contest: &ChamberContestSummary, tracked_party: &str) -> u8 {
    if contest.done {
        if contest.tooclose {
            3
        } else {
            match contest.party_won.as_deref() {
                Some(party) if party == tracked_party => 0,
                Some(_) => 1,
                None => 2,
            }
        }
    } else if contest.some_reporting {
        4
    } else {
        5
    }
}
