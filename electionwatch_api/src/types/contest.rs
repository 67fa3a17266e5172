//! Contest and result row types returned by the API.
//!
//! The `contests-with-results` endpoint joins the contests and results
//! tables on `contest_id` and emits one flat row per (contest, candidate,
//! ranked-choice round). [`RawResultRow`] splits that flat record into its
//! contest-level and result-level halves at deserialization time, so
//! downstream code never has to sort columns into buckets by name.

use serde::{Deserialize, Serialize};

/// Unique identifier for a contest (e.g. `id-MN---43000-2001`).
pub type ContestID = String;

/// Unique identifier for a candidate within a contest.
pub type CandidateID = String;

/// One row from the `contests-with-results` endpoint.
///
/// Contest-level columns repeat verbatim on every row of the same contest;
/// that redundancy is a property of the upstream join, and consumers take
/// contest fields from the first row of a group.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RawResultRow {
    #[serde(flatten)]
    pub contest: ContestFields,
    #[serde(flatten)]
    pub result: ResultFields,
}

/// Contest-level columns of a result row.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ContestFields {
    /// Contest key shared by all rows of one contest. Rows can arrive
    /// without it; aggregation drops such rows rather than failing.
    pub contest_id: Option<ContestID>,

    pub office_id: Option<String>,

    /// Scrape group the contest came from (e.g. `state_house_results`).
    pub results_group: Option<String>,

    pub district_code: Option<String>,

    pub state: Option<String>,

    pub county_id: Option<String>,

    pub precinct_id: Option<String>,

    /// Precincts that have reported so far.
    pub precincts_reporting: Option<i64>,

    /// Precincts expected to report in total. Reporting is complete when
    /// this equals `precincts_reporting`.
    pub total_effected_precincts: Option<i64>,

    pub total_votes_for_office: Option<i64>,

    /// Number of seats filled by this contest (top-N winner marking).
    pub seats: Option<i64>,

    /// True for ranked-choice contests; rows then carry a
    /// `ranked_choice_place` round number.
    pub ranked_choice: Option<bool>,

    /// True for primary contests.
    pub primary: Option<bool>,

    /// True when the contest is partisan (winners per party in primaries).
    pub partisan: Option<bool>,

    /// Threshold for ballot questions; a "yes" share at or above it passes
    /// the measure. Absent for candidate contests.
    pub percent_needed: Option<f64>,

    /// Geographic scope (e.g. `state_senate`, `municipal`).
    pub scope: Option<String>,

    /// Display title of the contest.
    pub title: Option<String>,

    pub sub_title: Option<String>,

    /// Boundary slug(s) for map lookup; may be a comma-joined list.
    pub boundary: Option<String>,

    /// Full text of a ballot question, when the contest is one.
    pub question_body: Option<String>,

    /// Party currently holding the seat, for chamber-control tracking.
    pub incumbent_party: Option<String>,

    /// Manual race call from the newsroom, overriding the margin check.
    pub called: Option<bool>,

    /// Unix timestamp of the last scraper update for this contest.
    pub updated: Option<i64>,
}

/// Result-level columns of a result row (one candidate, one round).
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ResultFields {
    pub result_id: Option<String>,

    /// Candidate display name. Ballot questions use "Yes" / "No".
    pub candidate: Option<String>,

    pub candidate_id: Option<CandidateID>,

    pub suffix: Option<String>,

    pub incumbent_code: Option<String>,

    /// Party code (e.g. `DFL`, `R`, `NP`).
    pub party_id: Option<String>,

    /// Office name as printed on the ballot. For ranked-choice rows this
    /// names the round ("... First Choice"), so it is per-row, not
    /// per-contest.
    pub office_name: Option<String>,

    /// Vote count for this candidate in this round.
    pub votes_candidate: Option<RawNumber>,

    /// Vote share for this candidate in this round.
    pub percentage: Option<RawNumber>,

    /// Ranked-choice round: 1..N for numbered choices, 100 for the final
    /// tabulation. Absent outside ranked-choice contests.
    pub ranked_choice_place: Option<i64>,

    /// Preformatted placeholder some supplemental rows carry instead of a
    /// computed share. Such rows are skipped when assigning top-N winners.
    pub percent: Option<String>,
}

/// A numeric column as it arrives off the wire.
///
/// The upstream scraper occasionally writes text where a number belongs.
/// Keeping the raw value lets a whole response deserialize; rejecting bad
/// values is the engine's call, under its configured policy.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    /// Numeric value, accepting digit strings the way the source feeds
    /// sometimes quote them. `None` means genuinely malformed. Text that
    /// parses to a non-finite float ("NaN", "inf") counts as malformed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawNumber::Number(n) => Some(*n),
            RawNumber::Text(s) => s.trim().parse().ok().filter(|n: &f64| n.is_finite()),
        }
    }

    /// Integer value via [`RawNumber::as_f64`], truncating any fraction.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64().map(|n| n as i64)
    }
}

impl From<f64> for RawNumber {
    fn from(n: f64) -> Self {
        RawNumber::Number(n)
    }
}

impl From<i64> for RawNumber {
    fn from(n: i64) -> Self {
        RawNumber::Number(n as f64)
    }
}
