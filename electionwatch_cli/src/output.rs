use anyhow::{bail, Result};
use electionwatch_lib::chamber::{Chamber, ChamberSummary};
use electionwatch_lib::format::{
    ap_date_time, format_percent, format_reporting, format_votes, updated_at,
};
use electionwatch_lib::normalize::FINAL_RANK;
use electionwatch_lib::types::Election;
use electionwatch_lib::{CandidateResult, ContestResult};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

pub fn parse_format(input: &str) -> Result<OutputFormat> {
    match input {
        "table" => Ok(OutputFormat::Table),
        "json" => Ok(OutputFormat::Json),
        "csv" => Ok(OutputFormat::Csv),
        "markdown" => Ok(OutputFormat::Markdown),
        other => bail!("unknown output format '{}'. Valid formats: table, json, csv, markdown", other),
    }
}

#[derive(Tabled, Serialize)]
pub struct CandidateRow {
    #[tabled(rename = "Candidate")]
    #[serde(rename = "Candidate")]
    candidate: String,
    #[tabled(rename = "Party")]
    #[serde(rename = "Party")]
    party: String,
    #[tabled(rename = "Votes")]
    #[serde(rename = "Votes")]
    votes: String,
    #[tabled(rename = "Pct")]
    #[serde(rename = "Pct")]
    pct: String,
    #[tabled(rename = "Winner")]
    #[serde(rename = "Winner")]
    winner: String,
}

#[derive(Tabled, Serialize)]
pub struct RankedChoiceRow {
    #[tabled(rename = "Candidate")]
    #[serde(rename = "Candidate")]
    candidate: String,
    #[tabled(rename = "Party")]
    #[serde(rename = "Party")]
    party: String,
    #[tabled(rename = "1st Choice")]
    #[serde(rename = "1st Choice")]
    first: String,
    #[tabled(rename = "2nd Choice")]
    #[serde(rename = "2nd Choice")]
    second: String,
    #[tabled(rename = "3rd Choice")]
    #[serde(rename = "3rd Choice")]
    third: String,
    #[tabled(rename = "Final")]
    #[serde(rename = "Final")]
    final_round: String,
    #[tabled(rename = "Votes")]
    #[serde(rename = "Votes")]
    votes: String,
    #[tabled(rename = "Winner")]
    #[serde(rename = "Winner")]
    winner: String,
}

#[derive(Tabled, Serialize)]
pub struct FlatResultRow {
    #[tabled(rename = "Contest")]
    #[serde(rename = "Contest")]
    contest: String,
    #[tabled(rename = "Candidate")]
    #[serde(rename = "Candidate")]
    candidate: String,
    #[tabled(rename = "Party")]
    #[serde(rename = "Party")]
    party: String,
    #[tabled(rename = "Votes")]
    #[serde(rename = "Votes")]
    votes: String,
    #[tabled(rename = "Pct")]
    #[serde(rename = "Pct")]
    pct: String,
    #[tabled(rename = "Winner")]
    #[serde(rename = "Winner")]
    winner: String,
}

#[derive(Tabled, Serialize)]
pub struct DistrictRow {
    #[tabled(rename = "District")]
    #[serde(rename = "District")]
    district: String,
    #[tabled(rename = "Leader")]
    #[serde(rename = "Leader")]
    leader: String,
    #[tabled(rename = "Party")]
    #[serde(rename = "Party")]
    party: String,
    #[tabled(rename = "Pct")]
    #[serde(rename = "Pct")]
    pct: String,
    #[tabled(rename = "Margin")]
    #[serde(rename = "Margin")]
    margin: String,
    #[tabled(rename = "Reporting")]
    #[serde(rename = "Reporting")]
    reporting: String,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
    #[tabled(rename = "Flip")]
    #[serde(rename = "Flip")]
    flip: String,
}

#[derive(Tabled, Serialize)]
pub struct ElectionRow {
    #[tabled(rename = "Election")]
    #[serde(rename = "Election")]
    election: String,
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "Type")]
    kind: String,
    #[tabled(rename = "Updated")]
    #[serde(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Feed")]
    #[serde(rename = "Feed")]
    feed: String,
}

// -- Row builders --

fn display_name(candidate: &CandidateResult) -> String {
    let mut name = candidate.candidate.clone();
    if let Some(suffix) = &candidate.suffix {
        name.push(' ');
        name.push_str(suffix);
    }
    if let Some(code) = &candidate.incumbent_code {
        name.push(' ');
        name.push_str(code);
    }
    name
}

fn winner_mark(winner: bool) -> String {
    if winner {
        "yes".to_string()
    } else {
        String::new()
    }
}

pub fn build_candidate_rows(contest: &ContestResult) -> Vec<CandidateRow> {
    contest
        .results
        .iter()
        .map(|c| CandidateRow {
            candidate: display_name(c),
            party: c.party_id.clone().unwrap_or_default(),
            votes: c.votes_candidate.map(format_votes).unwrap_or_default(),
            pct: c.percentage.map(format_percent).unwrap_or_default(),
            winner: winner_mark(c.winner),
        })
        .collect()
}

pub fn build_ranked_choice_rows(contest: &ContestResult) -> Vec<RankedChoiceRow> {
    let round_pct = |c: &CandidateResult, rank: i64| -> String {
        c.ranked_choices
            .get(&rank)
            .and_then(|round| round.percentage)
            .map(format_percent)
            .unwrap_or_default()
    };
    contest
        .results
        .iter()
        .map(|c| RankedChoiceRow {
            candidate: display_name(c),
            party: c.party_id.clone().unwrap_or_default(),
            first: round_pct(c, 1),
            second: round_pct(c, 2),
            third: round_pct(c, 3),
            final_round: round_pct(c, FINAL_RANK),
            votes: c.votes_candidate.map(format_votes).unwrap_or_default(),
            winner: winner_mark(c.winner),
        })
        .collect()
}

pub fn build_flat_result_rows(contests: &[ContestResult]) -> Vec<FlatResultRow> {
    let mut rows = Vec::new();
    for contest in contests {
        let title = contest.title.clone().unwrap_or_else(|| contest.id.clone());
        for c in &contest.results {
            rows.push(FlatResultRow {
                contest: title.clone(),
                candidate: display_name(c),
                party: c.party_id.clone().unwrap_or_default(),
                votes: c.votes_candidate.map(format_votes).unwrap_or_default(),
                pct: c.percentage.map(format_percent).unwrap_or_default(),
                winner: winner_mark(c.winner),
            });
        }
    }
    rows
}

pub fn build_district_rows(summary: &ChamberSummary) -> Vec<DistrictRow> {
    summary
        .contests
        .iter()
        .map(|contest| {
            let leader = contest.results.first();
            let status = if contest.tooclose {
                "Too close"
            } else if contest.called {
                "Called"
            } else if contest.done {
                "Final"
            } else if contest.some_reporting {
                "Counting"
            } else {
                "Waiting"
            };
            DistrictRow {
                district: contest.title.clone().unwrap_or_else(|| contest.id.clone()),
                leader: leader.map(|c| c.candidate.clone()).unwrap_or_default(),
                party: leader
                    .and_then(|c| c.party_id.clone())
                    .unwrap_or_default(),
                pct: leader
                    .and_then(|c| c.percentage)
                    .map(format_percent)
                    .unwrap_or_default(),
                margin: contest
                    .margin
                    .map(|m| format!("{:.1}", m))
                    .unwrap_or_default(),
                reporting: format!(
                    "{}/{}",
                    contest.precincts_reporting, contest.total_effected_precincts
                ),
                status: status.to_string(),
                flip: if contest.party_shift {
                    "flip".to_string()
                } else {
                    String::new()
                },
            }
        })
        .collect()
}

/// One line summarizing the whole chamber: seat counts per bucket, the
/// tracked party's net change, and whether counting is finished.
pub fn chamber_headline(summary: &ChamberSummary) -> String {
    let chamber = match summary.chamber {
        Chamber::Senate => "Senate",
        Chamber::House => "House",
    };
    let mut parts: Vec<String> = summary
        .counts
        .iter()
        .map(|(bucket, seats)| format!("{} {}", bucket.label(), seats))
        .collect();
    parts.push(format!(
        "net {:+} {}",
        summary.net_change, summary.tracked_party
    ));
    parts.push(if summary.all_done {
        "all precincts in".to_string()
    } else {
        "counting".to_string()
    });
    format!("{}: {}", chamber, parts.join(" | "))
}

pub fn build_election_rows(elections: &[Election], test_feed: &[bool]) -> Vec<ElectionRow> {
    elections
        .iter()
        .zip(test_feed)
        .map(|(e, test)| ElectionRow {
            election: e.election_id.clone().unwrap_or_default(),
            date: e.election_date.clone().unwrap_or_default(),
            kind: match e.primary {
                Some(true) => "Primary".to_string(),
                Some(false) => "General".to_string(),
                None => String::new(),
            },
            updated: e
                .updated
                .and_then(updated_at)
                .map(ap_date_time)
                .unwrap_or_default(),
            feed: if *test {
                "test data".to_string()
            } else {
                "live".to_string()
            },
        })
        .collect()
}

// -- Contest blocks --

/// How far along a contest is, for the status line.
pub fn contest_status(contest: &ContestResult) -> &'static str {
    if contest.called {
        "Called"
    } else if contest.done {
        "Final"
    } else if contest.precincts_reporting > 0 {
        "Counting"
    } else {
        "Waiting"
    }
}

/// Prints one contest in any output format.
pub fn print_contest(contest: &ContestResult, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(contest),
        OutputFormat::Csv => {
            if contest.ranked_choice {
                print_csv(&build_ranked_choice_rows(contest))?;
            } else {
                print_csv(&build_candidate_rows(contest))?;
            }
        }
        OutputFormat::Table => print_contest_block(contest, false),
        OutputFormat::Markdown => print_contest_block(contest, true),
    }
    Ok(())
}

/// Prints one contest as a heading, a status line, and the candidate
/// table.
pub fn print_contest_block(contest: &ContestResult, markdown: bool) {
    let title = contest.title.as_deref().unwrap_or(&contest.id);
    println!();
    match (markdown, &contest.sub_title) {
        (true, Some(sub)) => println!("## {} ({})", title, sub),
        (true, None) => println!("## {}", title),
        (false, Some(sub)) => println!("{} ({})", title, sub),
        (false, None) => println!("{}", title),
    }
    if let Some(question) = &contest.question_body {
        println!("{}", question);
    }

    let mut status = format!(
        "{} | {}",
        format_reporting(contest.precincts_reporting, contest.total_effected_precincts),
        contest_status(contest)
    );
    if let Some(updated) = contest.updated {
        status.push_str(&format!(" | updated {}", ap_date_time(updated)));
    }
    println!("{}", status);

    if contest.ranked_choice {
        let rows = build_ranked_choice_rows(contest);
        if markdown {
            print_markdown(rows)
        } else {
            print_table(rows)
        }
    } else {
        let rows = build_candidate_rows(contest);
        if markdown {
            print_markdown(rows)
        } else {
            print_table(rows)
        }
    }
}

// -- Generic printers --

pub fn print_table<T: Tabled>(rows: Vec<T>) {
    println!("{}", Table::new(rows));
}

pub fn print_markdown<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::markdown());
    println!("{}", table);
}

pub fn print_csv<T: Serialize>(rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}
