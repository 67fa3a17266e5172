//! The `results` subcommand: fetch result rows, normalize each contest,
//! and print contest blocks. With `--watch`, re-fetch on an interval and
//! re-render, marking snapshots served from the last good poll.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use electionwatch_lib::format::ap_date_time;
use electionwatch_lib::validation;
use electionwatch_lib::{
    normalize_each, CachedClient, ContestQuery, ContestResult, LiveClient, MalformedPolicy,
    NormalizeOptions, Query, SortBy,
};
use indicatif::{ProgressBar, ProgressStyle};

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ResultsArgs {
    /// Search contest titles (substring match)
    #[arg(long)]
    pub title: Option<String>,

    /// Filter by scope (e.g. state, state_senate, municipal)
    #[arg(long)]
    pub scope: Option<String>,

    /// Filter by scrape group (e.g. state_senate_results)
    #[arg(long)]
    pub group: Option<String>,

    /// Fetch specific contest ids (comma-separated or repeated)
    #[arg(long = "id", value_delimiter = ',')]
    pub ids: Vec<String>,

    /// Contests covering a point, as LAT,LON
    #[arg(long)]
    pub coordinates: Option<String>,

    /// Filter by boundary slug
    #[arg(long)]
    pub boundary: Option<String>,

    /// Rows per page (1-400)
    #[arg(long, default_value = "400")]
    pub limit: i64,

    /// Row offset for paging
    #[arg(long, default_value = "0")]
    pub offset: i64,

    /// Candidate order within a contest: percentage or votes
    #[arg(long, default_value = "percentage")]
    pub sort_by: String,

    /// Drop rows with malformed numbers instead of failing their contest
    #[arg(long)]
    pub permissive: bool,

    /// Keep polling and re-rendering until interrupted
    #[arg(long)]
    pub watch: bool,

    /// Poll interval in seconds for --watch
    #[arg(long, default_value = "30")]
    pub interval: u64,
}

pub fn normalize_options(sort_by: &str, permissive: bool) -> NormalizeOptions {
    NormalizeOptions {
        sort_by: match sort_by {
            "votes" => SortBy::Votes,
            _ => SortBy::Percentage,
        },
        malformed: if permissive {
            MalformedPolicy::DropRow
        } else {
            MalformedPolicy::Fail
        },
    }
}

fn build_query(args: &ResultsArgs, election_id: Option<&str>) -> Result<ContestQuery> {
    let mut query = ContestQuery::default()
        .with_limit(validation::validate_limit(args.limit)?)
        .with_offset(validation::validate_offset(args.offset)?);

    if let Some(id) = election_id {
        query = query.with_election_id(&validation::validate_election_id(id)?);
    }
    if let Some(title) = &args.title {
        query = query.with_title(&validation::validate_search(title)?);
    }
    if let Some(scope) = &args.scope {
        query = query.with_scope(&validation::validate_scope(scope)?);
    }
    if let Some(group) = &args.group {
        query = query
            .with_results_group(&validation::sanitize_text(group, validation::MAX_SEARCH_LENGTH)?);
    }
    if !args.ids.is_empty() {
        let mut ids = Vec::with_capacity(args.ids.len());
        for id in &args.ids {
            ids.push(validation::validate_contest_id(id)?);
        }
        query = query.with_contest_ids(&ids);
    }
    if let Some(coords) = &args.coordinates {
        let Some((lat, lon)) = coords.split_once(',') else {
            bail!("coordinates must look like 44.97,-93.26");
        };
        let lat: f64 = lat.trim().parse()?;
        let lon: f64 = lon.trim().parse()?;
        let (lat, lon) = validation::validate_coordinates(lat, lon)?;
        query = query.with_coordinates(lat, lon);
    }
    if let Some(boundary) = &args.boundary {
        query = query
            .with_boundary(&validation::sanitize_text(boundary, validation::MAX_SEARCH_LENGTH)?);
    }
    Ok(query)
}

fn render(contests: &[ContestResult], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => output::print_json(&contests),
        OutputFormat::Csv => output::print_csv(&output::build_flat_result_rows(contests))?,
        OutputFormat::Table => {
            for contest in contests {
                output::print_contest_block(contest, false);
            }
        }
        OutputFormat::Markdown => {
            for contest in contests {
                output::print_contest_block(contest, true);
            }
        }
    }
    Ok(())
}

pub async fn run(
    args: &ResultsArgs,
    client: &CachedClient,
    live: &Arc<LiveClient>,
    format: &OutputFormat,
    election_id: Option<&str>,
) -> Result<()> {
    let options = normalize_options(&args.sort_by, args.permissive);

    if args.watch {
        return watch(args, live, format, election_id, options).await;
    }

    let query = build_query(args, election_id)?;
    let resp = client.get_contests_with_results(&query).await?;
    if resp.has_more() {
        eprintln!(
            "Showing {} of {} rows; page with --offset",
            resp.data.len(),
            resp.total_count.unwrap_or(0)
        );
    }

    let contests = normalize_each(&resp.data, options);
    if contests.is_empty() {
        eprintln!("No contests matched.");
        return Ok(());
    }
    render(&contests, format)
}

async fn watch(
    args: &ResultsArgs,
    live: &Arc<LiveClient>,
    format: &OutputFormat,
    election_id: Option<&str>,
    options: NormalizeOptions,
) -> Result<()> {
    let markdown = match format {
        OutputFormat::Table => false,
        OutputFormat::Markdown => true,
        _ => bail!("--watch renders tables; use --output table or markdown"),
    };

    let query = build_query(args, election_id)?;
    let watch = Arc::clone(live).watch_contests(query, Duration::from_secs(args.interval));
    let mut rx = watch.subscribe();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("waiting for the first poll...");

    loop {
        if rx.changed().await.is_err() {
            break;
        }
        let snapshot = match rx.borrow_and_update().clone() {
            Some(snapshot) => snapshot,
            None => continue,
        };
        let contests = normalize_each(&snapshot.data, options);
        spinner.suspend(|| {
            println!();
            if snapshot.stale {
                println!("== {} [stale] ==", ap_date_time(snapshot.fetched_at));
            } else {
                println!("== {} ==", ap_date_time(snapshot.fetched_at));
            }
            if contests.is_empty() {
                println!("No contests matched.");
            }
            for contest in &contests {
                output::print_contest_block(contest, markdown);
            }
        });
        spinner.set_message(format!("next poll in {}s", args.interval.max(5)));
    }
    Ok(())
}
