//! Contest result normalization.
//!
//! Takes the flat rows the API returns for one contest and produces a
//! display-ready [`ContestResult`]: one entry per candidate, ranked-choice
//! rounds folded under their candidate, winners flagged according to the
//! contest's type. Pure transformation, no network or clock access; the
//! polling layer calls it on every fetch and replaces the previous result
//! wholesale.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use electionwatch_api::types::{RawNumber, RawResultRow, ResultFields};

/// `ranked_choice_place` value the scraper writes for the final tabulation
/// round of a ranked-choice contest.
pub const FINAL_RANK: i64 = 100;

/// Secondary sort key for candidates within a contest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Vote share descending. The display default.
    #[default]
    Percentage,
    /// Raw vote count descending.
    Votes,
}

/// What to do with rows whose numeric columns do not parse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Reject the whole contest. The default: a contest with garbage
    /// numbers should not render with half its winner flags set.
    #[default]
    Fail,
    /// Log and drop the offending row, keep the rest of the contest.
    DropRow,
}

/// Knobs for [`normalize`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NormalizeOptions {
    pub sort_by: SortBy,
    pub malformed: MalformedPolicy,
}

/// Why a batch of rows could not be normalized.
#[derive(thiserror::Error, Debug)]
pub enum NormalizeError {
    /// The rows carry more than one contest id.
    #[error("rows span more than one contest: {first} and {second}")]
    InvalidInput { first: String, second: String },
    /// Zero rows. The caller decides whether that means "no data yet" or
    /// "no such contest".
    #[error("no result rows to normalize")]
    EmptyResult,
    /// A numeric column held something that is not a number.
    #[error("malformed {field} {value:?} for candidate {candidate:?}")]
    MalformedData {
        field: &'static str,
        value: String,
        candidate: String,
    },
}

/// One round of a ranked-choice contest for one candidate.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedRound {
    pub percentage: Option<f64>,
    pub votes_candidate: Option<i64>,
    /// Ballot office name for the round ("... First Choice", "... Final").
    pub office_name: Option<String>,
}

/// One candidate's line in a normalized contest.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CandidateResult {
    /// Ballot name. Ballot questions use "Yes" / "No".
    pub candidate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incumbent_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
    /// Vote share, 0-100. For a ranked-choice contest this is the final
    /// round's share once tabulated, otherwise the first-choice share.
    pub percentage: Option<f64>,
    pub votes_candidate: Option<i64>,
    /// Preformatted share carried by supplemental rows. Rows with this
    /// marker never take a winner slot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<String>,
    /// Round-by-round numbers, keyed by round ([`FINAL_RANK`] = final
    /// tabulation). Empty outside ranked-choice contests.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub ranked_choices: BTreeMap<i64, RankedRound>,
    pub winner: bool,
}

/// A contest ready for display, produced by [`normalize`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContestResult {
    pub id: String,
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub scope: Option<String>,
    pub boundary: Option<String>,
    /// Full ballot text when the contest is a question.
    pub question_body: Option<String>,
    pub precincts_reporting: i64,
    pub total_effected_precincts: i64,
    pub total_votes_for_office: Option<i64>,
    /// Winner slots this contest fills.
    pub seats: i64,
    pub ranked_choice: bool,
    pub primary: bool,
    pub partisan: bool,
    /// Passing threshold for ballot questions.
    pub percent_needed: Option<f64>,
    pub incumbent_party: Option<String>,
    /// Manual race call from the newsroom.
    pub called: bool,
    /// Last scraper update for this contest.
    pub updated: Option<DateTime<Utc>>,
    /// True when every expected precinct has reported.
    pub done: bool,
    pub results: Vec<CandidateResult>,
}

impl ContestResult {
    /// Candidates flagged as winners, in display order.
    pub fn winners(&self) -> impl Iterator<Item = &CandidateResult> {
        self.results.iter().filter(|r| r.winner)
    }

    /// The candidate currently on top, if any.
    pub fn leader(&self) -> Option<&CandidateResult> {
        self.results.first()
    }
}

/// Normalizes the raw rows of a single contest.
///
/// All rows must carry the same contest id; rows without an id are assumed
/// to belong to the same contest the caller queried for. Contest-level
/// columns are taken from the first row, first write wins.
pub fn normalize(
    rows: &[RawResultRow],
    options: NormalizeOptions,
) -> Result<ContestResult, NormalizeError> {
    if rows.is_empty() {
        return Err(NormalizeError::EmptyResult);
    }

    let mut contest_id: Option<&str> = None;
    for row in rows {
        if let Some(id) = row.contest.contest_id.as_deref() {
            match contest_id {
                None => contest_id = Some(id),
                Some(seen) if seen != id => {
                    return Err(NormalizeError::InvalidInput {
                        first: seen.to_string(),
                        second: id.to_string(),
                    })
                }
                Some(_) => {}
            }
        }
    }

    let contest = &rows[0].contest;
    let ranked_choice = contest.ranked_choice.unwrap_or(false);
    let primary = contest.primary.unwrap_or(false);

    let mut results = if ranked_choice {
        group_ranked_choice(rows, options.malformed)?
    } else {
        collect_candidates(rows, options.malformed)?
    };
    sort_candidates(&mut results, options.sort_by, primary);

    let mut out = ContestResult {
        id: contest_id.unwrap_or_default().to_string(),
        title: contest.title.clone(),
        sub_title: contest.sub_title.clone(),
        scope: contest.scope.clone(),
        boundary: contest.boundary.clone(),
        question_body: contest.question_body.clone(),
        precincts_reporting: contest.precincts_reporting.unwrap_or(0),
        total_effected_precincts: contest.total_effected_precincts.unwrap_or(0),
        total_votes_for_office: contest.total_votes_for_office,
        seats: contest.seats.unwrap_or(1),
        ranked_choice,
        primary,
        partisan: contest.partisan.unwrap_or(false),
        percent_needed: contest.percent_needed,
        incumbent_party: contest.incumbent_party.clone(),
        called: contest.called.unwrap_or(false),
        updated: contest
            .updated
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        done: contest.precincts_reporting.unwrap_or(0)
            == contest.total_effected_precincts.unwrap_or(0),
        results,
    };
    mark_winners(&mut out);
    Ok(out)
}

/// Normalizes a mixed fetch covering any number of contests.
///
/// Rows group by contest id in first-seen order. A contest whose rows
/// fail to normalize is logged and skipped rather than failing the whole
/// batch. Rows with no contest id cannot be attributed to a group here
/// and are dropped.
pub fn normalize_each(rows: &[RawResultRow], options: NormalizeOptions) -> Vec<ContestResult> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<RawResultRow>> = HashMap::new();
    for row in rows {
        let Some(id) = row.contest.contest_id.as_deref() else {
            tracing::warn!("dropping result row with no contest id");
            continue;
        };
        if !groups.contains_key(id) {
            order.push(id);
        }
        groups.entry(id).or_default().push(row.clone());
    }

    let mut contests = Vec::with_capacity(order.len());
    for id in order {
        match normalize(&groups[id], options) {
            Ok(contest) => contests.push(contest),
            Err(err) => tracing::warn!("skipping contest {}: {}", id, err),
        }
    }
    contests
}

/// Both numeric columns of a row, parsed under the configured policy.
enum RowNumbers {
    Parsed {
        percentage: Option<f64>,
        votes: Option<i64>,
    },
    Dropped,
}

fn row_numbers(
    result: &ResultFields,
    policy: MalformedPolicy,
) -> Result<RowNumbers, NormalizeError> {
    let percentage = match &result.percentage {
        None => None,
        Some(raw) => match raw.as_f64() {
            Some(v) => Some(v),
            None => return reject_row(result, "percentage", raw, policy),
        },
    };
    let votes = match &result.votes_candidate {
        None => None,
        Some(raw) => match raw.as_i64() {
            Some(v) => Some(v),
            None => return reject_row(result, "votes_candidate", raw, policy),
        },
    };
    Ok(RowNumbers::Parsed { percentage, votes })
}

fn reject_row(
    result: &ResultFields,
    field: &'static str,
    raw: &RawNumber,
    policy: MalformedPolicy,
) -> Result<RowNumbers, NormalizeError> {
    let value = match raw {
        RawNumber::Number(n) => n.to_string(),
        RawNumber::Text(s) => s.clone(),
    };
    let candidate = result.candidate.clone().unwrap_or_default();
    match policy {
        MalformedPolicy::Fail => Err(NormalizeError::MalformedData {
            field,
            value,
            candidate,
        }),
        MalformedPolicy::DropRow => {
            tracing::warn!(
                "Dropping row with malformed {} {:?} for candidate {:?}",
                field,
                value,
                candidate
            );
            Ok(RowNumbers::Dropped)
        }
    }
}

fn new_candidate(result: &ResultFields) -> CandidateResult {
    CandidateResult {
        candidate: result.candidate.clone().unwrap_or_default(),
        candidate_id: result.candidate_id.clone(),
        suffix: result.suffix.clone(),
        incumbent_code: result.incumbent_code.clone(),
        party_id: result.party_id.clone(),
        percentage: None,
        votes_candidate: None,
        percent: result.percent.clone(),
        ranked_choices: BTreeMap::new(),
        winner: false,
    }
}

/// One candidate per row, numbers taken as-is.
fn collect_candidates(
    rows: &[RawResultRow],
    policy: MalformedPolicy,
) -> Result<Vec<CandidateResult>, NormalizeError> {
    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        let (percentage, votes) = match row_numbers(&row.result, policy)? {
            RowNumbers::Parsed { percentage, votes } => (percentage, votes),
            RowNumbers::Dropped => continue,
        };
        let mut candidate = new_candidate(&row.result);
        candidate.percentage = percentage;
        candidate.votes_candidate = votes;
        results.push(candidate);
    }
    Ok(results)
}

/// Folds one-row-per-round input into one entry per candidate.
///
/// The first-choice row carries the candidate's ballot identity, so its
/// fields replace whatever seeded the entry. Final-round numbers are applied
/// after all rows are read, which keeps the result independent of the order
/// rounds arrive in.
fn group_ranked_choice(
    rows: &[RawResultRow],
    policy: MalformedPolicy,
) -> Result<Vec<CandidateResult>, NormalizeError> {
    let mut grouped: BTreeMap<String, CandidateResult> = BTreeMap::new();
    for row in rows {
        let result = &row.result;
        let (percentage, votes) = match row_numbers(result, policy)? {
            RowNumbers::Parsed { percentage, votes } => (percentage, votes),
            RowNumbers::Dropped => continue,
        };
        let key = result.candidate_id.clone().unwrap_or_default();
        let entry = grouped.entry(key).or_insert_with(|| new_candidate(result));
        let place = match result.ranked_choice_place {
            Some(place) => place,
            None => {
                tracing::warn!(
                    "Ranked-choice row without a round number for candidate {:?}",
                    entry.candidate
                );
                continue;
            }
        };
        entry.ranked_choices.insert(
            place,
            RankedRound {
                percentage,
                votes_candidate: votes,
                office_name: result.office_name.clone(),
            },
        );
        if place == 1 {
            entry.candidate = result.candidate.clone().unwrap_or_default();
            entry.candidate_id = result.candidate_id.clone();
            entry.suffix = result.suffix.clone();
            entry.incumbent_code = result.incumbent_code.clone();
            entry.party_id = result.party_id.clone();
            entry.percent = result.percent.clone();
            entry.percentage = percentage;
            entry.votes_candidate = votes;
        }
    }
    let mut results: Vec<CandidateResult> = grouped.into_values().collect();
    for candidate in &mut results {
        if let Some(fin) = candidate.ranked_choices.get(&FINAL_RANK) {
            candidate.percentage = fin.percentage;
            candidate.votes_candidate = fin.votes_candidate;
        }
    }
    Ok(results)
}

/// Name ascending as the stable base, then the configured numeric key
/// descending, then party ascending for primaries so party groups read as
/// contiguous blocks.
fn sort_candidates(results: &mut [CandidateResult], sort_by: SortBy, primary: bool) {
    results.sort_by(|a, b| a.candidate.cmp(&b.candidate));
    match sort_by {
        SortBy::Percentage => results.sort_by(|a, b| {
            let a = a.percentage.unwrap_or(f64::NEG_INFINITY);
            let b = b.percentage.unwrap_or(f64::NEG_INFINITY);
            b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortBy::Votes => results.sort_by(|a, b| {
            let a = a.votes_candidate.unwrap_or(i64::MIN);
            let b = b.votes_candidate.unwrap_or(i64::MIN);
            b.cmp(&a)
        }),
    }
    if primary {
        results.sort_by(|a, b| a.party_id.cmp(&b.party_id));
    }
}

fn has_percent_marker(result: &CandidateResult) -> bool {
    result.percent.as_deref().map_or(false, |p| !p.is_empty())
}

/// Winner flags, evaluated on complete contests only. Rules in order,
/// first match applies:
///
/// 1. Ballot measures (`percent_needed` set): "Yes" passes at or above the
///    threshold, "No" prevails only while "Yes" is strictly below it.
/// 2. General contests, non-partisan primaries, and ranked-choice contests
///    once every candidate has a final-round entry: top `seats` candidates
///    in display order, skipping placeholder rows (a placeholder still
///    occupies its slot).
/// 3. Partisan primaries: top `seats` candidates within each party group.
fn mark_winners(contest: &mut ContestResult) {
    if !contest.done {
        return;
    }

    if let Some(needed) = contest.percent_needed.filter(|n| *n > 0.0) {
        for result in &mut contest.results {
            let Some(pct) = result.percentage else { continue };
            if result.candidate.eq_ignore_ascii_case("yes") && pct >= needed {
                result.winner = true;
            } else if result.candidate.eq_ignore_ascii_case("no") && pct > 100.0 - needed {
                result.winner = true;
            }
        }
        return;
    }

    let final_tabulated = contest
        .results
        .iter()
        .all(|r| r.ranked_choices.contains_key(&FINAL_RANK));
    let general = (!contest.ranked_choice && !contest.primary)
        || (contest.ranked_choice && final_tabulated && !contest.primary)
        || (contest.primary && !contest.partisan);
    let seats = contest.seats.max(0) as usize;

    if general {
        for (i, result) in contest.results.iter_mut().enumerate() {
            if i < seats && !has_percent_marker(result) {
                result.winner = true;
            }
        }
    } else if contest.primary && contest.partisan {
        let mut taken: HashMap<String, usize> = HashMap::new();
        for result in &mut contest.results {
            let won = taken
                .entry(result.party_id.clone().unwrap_or_default())
                .or_insert(0);
            if *won < seats {
                result.winner = true;
                *won += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use electionwatch_api::types::RawResultRow;

    fn row(contest_id: &str, candidate: &str, pct: f64, votes: i64) -> RawResultRow {
        let mut row = RawResultRow::default();
        row.contest.contest_id = Some(contest_id.to_string());
        row.contest.title = Some("Test Contest".to_string());
        row.contest.precincts_reporting = Some(10);
        row.contest.total_effected_precincts = Some(10);
        row.contest.seats = Some(1);
        row.result.candidate = Some(candidate.to_string());
        row.result.candidate_id = Some(format!("cand-{}", candidate.to_lowercase()));
        row.result.party_id = Some("NP".to_string());
        row.result.percentage = Some(pct.into());
        row.result.votes_candidate = Some(votes.into());
        row
    }

    fn ranked_row(candidate: &str, place: i64, pct: f64, votes: i64) -> RawResultRow {
        let mut r = row("id-MN---43000-2101", candidate, pct, votes);
        r.contest.ranked_choice = Some(true);
        r.result.ranked_choice_place = Some(place);
        r.result.office_name = Some(match place {
            1 => "Council Member Ward 2 First Choice".to_string(),
            FINAL_RANK => "Council Member Ward 2 Final".to_string(),
            n => format!("Council Member Ward 2 Choice {}", n),
        });
        r
    }

    fn normalized(rows: &[RawResultRow]) -> ContestResult {
        normalize(rows, NormalizeOptions::default()).unwrap()
    }

    // -- Grouping and shaping --

    #[test]
    fn straight_contest_keeps_one_entry_per_row() {
        let rows = vec![
            row("id-MN----0331", "Tim Walz", 52.3, 1_056_514),
            row("id-MN----0331", "Scott Jensen", 44.6, 900_189),
        ];
        let contest = normalized(&rows);
        assert_eq!(contest.id, "id-MN----0331");
        assert_eq!(contest.results.len(), 2);
        assert!(contest.done);
        assert_eq!(contest.results[0].candidate, "Tim Walz");
        assert_eq!(contest.results[0].percentage, Some(52.3));
        assert_eq!(contest.results[0].votes_candidate, Some(1_056_514));
        assert!(contest.results[0].ranked_choices.is_empty());
    }

    #[test]
    fn normalize_is_pure() {
        let rows = vec![
            row("id-MN----0331", "Tim Walz", 52.3, 1_056_514),
            row("id-MN----0331", "Scott Jensen", 44.6, 900_189),
        ];
        let first = normalized(&rows);
        let second = normalized(&rows);
        assert_eq!(first, second);
    }

    #[test]
    fn rows_spanning_contests_are_rejected() {
        let rows = vec![
            row("id-MN----0331", "Tim Walz", 52.3, 1_056_514),
            row("id-MN----0332", "Keith Ellison", 50.4, 1_010_427),
        ];
        let err = normalize(&rows, NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidInput { .. }));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = normalize(&[], NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, NormalizeError::EmptyResult));
    }

    #[test]
    fn contest_id_comes_from_first_row_that_has_one() {
        let mut anonymous = row("ignored", "Tim Walz", 52.3, 1);
        anonymous.contest.contest_id = None;
        let rows = vec![anonymous, row("id-MN----0331", "Scott Jensen", 44.6, 1)];
        assert_eq!(normalized(&rows).id, "id-MN----0331");
    }

    #[test]
    fn updated_becomes_a_utc_timestamp() {
        let mut r = row("id-MN----0331", "Tim Walz", 52.3, 1);
        r.contest.updated = Some(1_668_006_000);
        let contest = normalized(&[r]);
        assert_eq!(
            contest.updated.map(|t| t.to_rfc3339()),
            Some("2022-11-09T15:00:00+00:00".to_string())
        );
    }

    // -- Ranked choice --

    #[test]
    fn ranked_rounds_fold_under_their_candidate() {
        let rows = vec![
            ranked_row("Robin Wonsley", 1, 44.9, 4_482),
            ranked_row("Robin Wonsley", 2, 13.5, 1_342),
            ranked_row("Robin Wonsley", FINAL_RANK, 52.8, 5_266),
        ];
        let contest = normalized(&rows);
        assert_eq!(contest.results.len(), 1);
        let candidate = &contest.results[0];
        assert_eq!(candidate.ranked_choices.len(), 3);
        assert_eq!(candidate.ranked_choices[&1].percentage, Some(44.9));
        assert_eq!(
            candidate.ranked_choices[&FINAL_RANK].office_name.as_deref(),
            Some("Council Member Ward 2 Final")
        );
    }

    #[test]
    fn final_round_overrides_first_choice_numbers() {
        let rows = vec![
            ranked_row("Robin Wonsley", 1, 45.0, 4_482),
            ranked_row("Robin Wonsley", FINAL_RANK, 52.0, 5_266),
        ];
        let candidate = &normalized(&rows).results[0];
        assert_eq!(candidate.percentage, Some(52.0));
        assert_eq!(candidate.votes_candidate, Some(5_266));
    }

    #[test]
    fn final_round_override_ignores_input_order() {
        let rows = vec![
            ranked_row("Robin Wonsley", FINAL_RANK, 52.0, 5_266),
            ranked_row("Robin Wonsley", 1, 45.0, 4_482),
        ];
        let candidate = &normalized(&rows).results[0];
        assert_eq!(candidate.percentage, Some(52.0));
        assert_eq!(candidate.votes_candidate, Some(5_266));
    }

    #[test]
    fn unfinished_ranked_choice_marks_no_winner() {
        let rows = vec![
            ranked_row("Robin Wonsley", 1, 44.9, 4_482),
            ranked_row("Yusra Arab", 1, 39.6, 3_961),
        ];
        let contest = normalized(&rows);
        assert!(contest.done);
        assert!(contest.results.iter().all(|r| !r.winner));
    }

    #[test]
    fn finished_ranked_choice_marks_the_top_candidate() {
        let rows = vec![
            ranked_row("Robin Wonsley", 1, 44.9, 4_482),
            ranked_row("Robin Wonsley", FINAL_RANK, 52.8, 5_266),
            ranked_row("Yusra Arab", 1, 39.6, 3_961),
            ranked_row("Yusra Arab", FINAL_RANK, 47.2, 4_713),
        ];
        let contest = normalized(&rows);
        let winners: Vec<_> = contest.winners().map(|r| r.candidate.as_str()).collect();
        assert_eq!(winners, vec!["Robin Wonsley"]);
    }

    #[test]
    fn round_without_a_number_still_registers_the_candidate() {
        let mut r = ranked_row("Robin Wonsley", 1, 44.9, 4_482);
        r.result.ranked_choice_place = None;
        let contest = normalized(&[r]);
        assert_eq!(contest.results.len(), 1);
        assert!(contest.results[0].ranked_choices.is_empty());
    }

    // -- Sorting --

    #[test]
    fn candidates_sort_by_percentage_descending() {
        let rows = vec![
            row("id-MN----0331", "Scott Jensen", 44.6, 900_189),
            row("id-MN----0331", "Tim Walz", 52.3, 1_056_514),
            row("id-MN----0331", "James McCaskel", 1.0, 20_392),
        ];
        let contest = normalized(&rows);
        let order: Vec<_> = contest.results.iter().map(|r| r.candidate.as_str()).collect();
        assert_eq!(order, vec!["Tim Walz", "Scott Jensen", "James McCaskel"]);
    }

    #[test]
    fn equal_shares_fall_back_to_name_order() {
        let rows = vec![
            row("id-MN----0331", "Zed Quist", 50.0, 100),
            row("id-MN----0331", "Ann Abel", 50.0, 100),
        ];
        let contest = normalized(&rows);
        assert_eq!(contest.results[0].candidate, "Ann Abel");
        assert_eq!(contest.results[1].candidate, "Zed Quist");
    }

    #[test]
    fn vote_count_mode_sorts_by_votes() {
        let rows = vec![
            row("id-MN----0331", "Low Share High Votes", 10.0, 9_000),
            row("id-MN----0331", "High Share Low Votes", 90.0, 100),
        ];
        let options = NormalizeOptions {
            sort_by: SortBy::Votes,
            ..Default::default()
        };
        let contest = normalize(&rows, options).unwrap();
        assert_eq!(contest.results[0].candidate, "Low Share High Votes");
    }

    #[test]
    fn missing_share_sorts_last() {
        let mut unreported = row("id-MN----0331", "Write-ins", 0.0, 0);
        unreported.result.percentage = None;
        let rows = vec![unreported, row("id-MN----0331", "Tim Walz", 52.3, 1)];
        let contest = normalized(&rows);
        assert_eq!(contest.results[1].candidate, "Write-ins");
    }

    #[test]
    fn primaries_keep_party_groups_contiguous() {
        let mut rows = vec![
            row("id-MN----0912", "Dfl Low", 10.0, 1),
            row("id-MN----0912", "Gop High", 60.0, 6),
            row("id-MN----0912", "Dfl High", 55.0, 5),
            row("id-MN----0912", "Gop Low", 12.0, 1),
        ];
        for (r, party) in rows.iter_mut().zip(["DFL", "R", "DFL", "R"]) {
            r.contest.primary = Some(true);
            r.contest.partisan = Some(true);
            r.result.party_id = Some(party.to_string());
        }
        let contest = normalized(&rows);
        let order: Vec<_> = contest
            .results
            .iter()
            .map(|r| (r.party_id.as_deref().unwrap(), r.candidate.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("DFL", "Dfl High"),
                ("DFL", "Dfl Low"),
                ("R", "Gop High"),
                ("R", "Gop Low"),
            ]
        );
    }

    // -- Winner flags --

    #[test]
    fn winner_count_matches_seats() {
        let mut rows = vec![
            row("id-MN---43000-1001", "First", 30.0, 300),
            row("id-MN---43000-1001", "Second", 25.0, 250),
            row("id-MN---43000-1001", "Third", 24.0, 240),
            row("id-MN---43000-1001", "Fourth", 21.0, 210),
        ];
        for r in &mut rows {
            r.contest.seats = Some(2);
        }
        let contest = normalized(&rows);
        let winners: Vec<_> = contest.winners().map(|r| r.candidate.as_str()).collect();
        assert_eq!(winners, vec!["First", "Second"]);
    }

    #[test]
    fn no_winners_until_reporting_completes() {
        let mut rows = vec![
            row("id-MN----0331", "Tim Walz", 52.3, 1_056_514),
            row("id-MN----0331", "Scott Jensen", 44.6, 900_189),
        ];
        for r in &mut rows {
            r.contest.precincts_reporting = Some(9);
        }
        let contest = normalized(&rows);
        assert!(!contest.done);
        assert!(contest.results.iter().all(|r| !r.winner));
    }

    fn measure_rows(yes_pct: f64, no_pct: f64, needed: f64) -> Vec<RawResultRow> {
        let mut rows = vec![
            row("id-MN---02180-5031", "Yes", yes_pct, 1_000),
            row("id-MN---02180-5031", "No", no_pct, 1_000),
        ];
        for r in &mut rows {
            r.contest.percent_needed = Some(needed);
            r.contest.question_body = Some("Shall the city issue bonds...".to_string());
        }
        rows
    }

    #[test]
    fn measure_passes_at_the_threshold() {
        let contest = normalized(&measure_rows(50.0, 50.0, 50.0));
        let yes = contest.results.iter().find(|r| r.candidate == "Yes").unwrap();
        let no = contest.results.iter().find(|r| r.candidate == "No").unwrap();
        assert!(yes.winner);
        assert!(!no.winner);
    }

    #[test]
    fn measure_fails_just_below_the_threshold() {
        let contest = normalized(&measure_rows(49.999, 50.001, 50.0));
        let yes = contest.results.iter().find(|r| r.candidate == "Yes").unwrap();
        let no = contest.results.iter().find(|r| r.candidate == "No").unwrap();
        assert!(!yes.winner);
        assert!(no.winner);
    }

    #[test]
    fn no_side_needs_a_strict_majority_of_the_remainder() {
        let contest = normalized(&measure_rows(50.0, 50.0, 50.0));
        let no = contest.results.iter().find(|r| r.candidate == "No").unwrap();
        assert!(!no.winner);
    }

    #[test]
    fn supermajority_measure_defeats_a_simple_majority() {
        let contest = normalized(&measure_rows(62.5, 37.5, 66.67));
        let yes = contest.results.iter().find(|r| r.candidate == "Yes").unwrap();
        let no = contest.results.iter().find(|r| r.candidate == "No").unwrap();
        assert!(!yes.winner);
        assert!(no.winner);
    }

    #[test]
    fn partisan_primary_awards_seats_within_each_party() {
        let mut rows = vec![
            row("id-MN----0912", "Dfl One", 40.0, 400),
            row("id-MN----0912", "Dfl Two", 35.0, 350),
            row("id-MN----0912", "Dfl Three", 25.0, 250),
            row("id-MN----0912", "Gop One", 60.0, 600),
            row("id-MN----0912", "Gop Two", 40.0, 400),
        ];
        for (r, party) in rows.iter_mut().zip(["DFL", "DFL", "DFL", "R", "R"]) {
            r.contest.primary = Some(true);
            r.contest.partisan = Some(true);
            r.result.party_id = Some(party.to_string());
        }
        let contest = normalized(&rows);
        let winners: Vec<_> = contest.winners().map(|r| r.candidate.as_str()).collect();
        assert_eq!(winners, vec!["Dfl One", "Gop One"]);
    }

    #[test]
    fn nonpartisan_primary_takes_the_plain_top_candidates() {
        let mut rows = vec![
            row("id-MN---43000-1001", "First", 45.0, 450),
            row("id-MN---43000-1001", "Second", 35.0, 350),
            row("id-MN---43000-1001", "Third", 20.0, 200),
        ];
        for r in &mut rows {
            r.contest.primary = Some(true);
            r.contest.partisan = Some(false);
            r.contest.seats = Some(2);
        }
        let contest = normalized(&rows);
        let winners: Vec<_> = contest.winners().map(|r| r.candidate.as_str()).collect();
        assert_eq!(winners, vec!["First", "Second"]);
    }

    #[test]
    fn placeholder_rows_never_win_but_keep_their_slot() {
        let mut placeholder = row("id-MN----0331", "Aaa Placeholder", 99.0, 0);
        placeholder.result.percent = Some("99%".to_string());
        let rows = vec![placeholder, row("id-MN----0331", "Tim Walz", 52.3, 1)];
        let contest = normalized(&rows);
        assert_eq!(contest.results[0].candidate, "Aaa Placeholder");
        assert!(contest.winners().next().is_none());
    }

    // -- Malformed columns --

    #[test]
    fn malformed_share_fails_the_contest_by_default() {
        let mut bad = row("id-MN----0331", "Tim Walz", 0.0, 1);
        bad.result.percentage = Some(serde_json::from_str(r#""n/a""#).unwrap());
        let rows = vec![bad, row("id-MN----0331", "Scott Jensen", 44.6, 1)];
        let err = normalize(&rows, NormalizeOptions::default()).unwrap_err();
        match err {
            NormalizeError::MalformedData { field, value, .. } => {
                assert_eq!(field, "percentage");
                assert_eq!(value, "n/a");
            }
            other => panic!("expected MalformedData, got {other:?}"),
        }
    }

    #[test]
    fn malformed_votes_are_also_policed() {
        let mut bad = row("id-MN----0331", "Tim Walz", 52.3, 0);
        bad.result.votes_candidate = Some(serde_json::from_str(r#""unknown""#).unwrap());
        let err = normalize(&[bad], NormalizeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::MalformedData {
                field: "votes_candidate",
                ..
            }
        ));
    }

    #[test]
    fn permissive_mode_drops_only_the_bad_row() {
        let mut bad = row("id-MN----0331", "Glitch", 0.0, 1);
        bad.result.percentage = Some(serde_json::from_str(r#""n/a""#).unwrap());
        let rows = vec![bad, row("id-MN----0331", "Tim Walz", 52.3, 1)];
        let options = NormalizeOptions {
            malformed: MalformedPolicy::DropRow,
            ..Default::default()
        };
        let contest = normalize(&rows, options).unwrap();
        assert_eq!(contest.results.len(), 1);
        assert_eq!(contest.results[0].candidate, "Tim Walz");
    }

    #[test]
    fn quoted_digits_parse_as_numbers() {
        let mut quoted = row("id-MN----0331", "Tim Walz", 0.0, 0);
        quoted.result.percentage = Some(serde_json::from_str(r#""52.3""#).unwrap());
        quoted.result.votes_candidate = Some(serde_json::from_str(r#""1056514""#).unwrap());
        let contest = normalized(&[quoted]);
        assert_eq!(contest.results[0].percentage, Some(52.3));
        assert_eq!(contest.results[0].votes_candidate, Some(1_056_514));
    }

    // -- Batch normalization --

    #[test]
    fn a_mixed_fetch_splits_into_contests_in_first_seen_order() {
        let rows = vec![
            row("id-MN----0331", "Tim Walz", 52.3, 1_056_514),
            row("id-MN----0332", "Keith Ellison", 50.4, 1_010_427),
            row("id-MN----0331", "Scott Jensen", 44.6, 900_189),
            row("id-MN----0332", "Jim Schultz", 49.5, 992_169),
        ];
        let contests = normalize_each(&rows, NormalizeOptions::default());
        assert_eq!(contests.len(), 2);
        assert_eq!(contests[0].id, "id-MN----0331");
        assert_eq!(contests[0].results.len(), 2);
        assert_eq!(contests[1].id, "id-MN----0332");
        assert_eq!(contests[1].results.len(), 2);
    }

    #[test]
    fn a_bad_contest_does_not_fail_the_batch() {
        let mut bad = row("id-MN----0332", "Glitch", 0.0, 1);
        bad.result.percentage = Some(serde_json::from_str(r#""n/a""#).unwrap());
        let rows = vec![row("id-MN----0331", "Tim Walz", 52.3, 1_056_514), bad];
        let contests = normalize_each(&rows, NormalizeOptions::default());
        assert_eq!(contests.len(), 1);
        assert_eq!(contests[0].id, "id-MN----0331");
    }

    #[test]
    fn batch_rows_without_a_contest_id_are_dropped() {
        let mut anonymous = row("ignored", "Tim Walz", 52.3, 1);
        anonymous.contest.contest_id = None;
        let contests = normalize_each(&[anonymous], NormalizeOptions::default());
        assert!(contests.is_empty());
    }
}
