//! The `chamber` subcommand: legislative balance-of-power panel.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use electionwatch_lib::chamber::ChamberSummary;
use electionwatch_lib::format::ap_date_time;
use electionwatch_lib::types::RawResultRow;
use electionwatch_lib::validation;
use electionwatch_lib::{
    aggregate, CachedClient, Chamber, ContestQuery, LiveClient, MalformedPolicy, Query,
};
use indicatif::{ProgressBar, ProgressStyle};

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ChamberArgs {
    /// Which chamber: senate or house (s/h)
    #[arg(long)]
    pub chamber: String,

    /// Party to track for net change (default: DFL for senate, R for house)
    #[arg(long)]
    pub party: Option<String>,

    /// Drop rows with malformed numbers instead of dropping their contest
    #[arg(long)]
    pub permissive: bool,

    /// Keep polling and re-rendering until interrupted
    #[arg(long)]
    pub watch: bool,

    /// Poll interval in seconds for --watch
    #[arg(long, default_value = "30")]
    pub interval: u64,
}

struct ChamberSetup {
    chamber: Chamber,
    tracked_party: String,
    malformed: MalformedPolicy,
}

fn setup(args: &ChamberArgs) -> Result<ChamberSetup> {
    let chamber = validation::validate_chamber(&args.chamber)?;
    let tracked_party = match &args.party {
        Some(party) => validation::validate_party_id(party)?,
        None => chamber.default_tracked_party().to_string(),
    };
    let malformed = if args.permissive {
        MalformedPolicy::DropRow
    } else {
        MalformedPolicy::Fail
    };
    Ok(ChamberSetup {
        chamber,
        tracked_party,
        malformed,
    })
}

fn build_query(chamber: Chamber, election_id: Option<&str>) -> Result<ContestQuery> {
    let mut query = ContestQuery::default()
        .with_scope(chamber.scope())
        .with_limit(validation::MAX_LIMIT);
    if let Some(id) = election_id {
        query = query.with_election_id(&validation::validate_election_id(id)?);
    }
    Ok(query)
}

fn summarize(rows: &[RawResultRow], setup: &ChamberSetup) -> ChamberSummary {
    aggregate(rows, setup.chamber, &setup.tracked_party, setup.malformed)
}

fn render(summary: &ChamberSummary, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => output::print_json(summary),
        OutputFormat::Csv => output::print_csv(&output::build_district_rows(summary))?,
        OutputFormat::Table => {
            println!("{}", output::chamber_headline(summary));
            output::print_table(output::build_district_rows(summary));
        }
        OutputFormat::Markdown => {
            println!("## {}", output::chamber_headline(summary));
            output::print_markdown(output::build_district_rows(summary));
        }
    }
    Ok(())
}

pub async fn run(
    args: &ChamberArgs,
    client: &CachedClient,
    live: &Arc<LiveClient>,
    format: &OutputFormat,
    election_id: Option<&str>,
) -> Result<()> {
    let setup = setup(args)?;

    if args.watch {
        return watch(args, live, format, election_id, setup).await;
    }

    let query = build_query(setup.chamber, election_id)?;
    let resp = client.get_contests_with_results(&query).await?;
    if resp.data.is_empty() {
        eprintln!("No {} contests found.", setup.chamber);
        return Ok(());
    }
    render(&summarize(&resp.data, &setup), format)
}

async fn watch(
    args: &ChamberArgs,
    live: &Arc<LiveClient>,
    format: &OutputFormat,
    election_id: Option<&str>,
    setup: ChamberSetup,
) -> Result<()> {
    if !matches!(format, OutputFormat::Table | OutputFormat::Markdown) {
        bail!("--watch renders tables; use --output table or markdown");
    }

    let query = build_query(setup.chamber, election_id)?;
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
        let summary = summarize(&snapshot.data, &setup);
        let stale = snapshot.stale;
        let fetched_at = snapshot.fetched_at;
        spinner.suspend(|| {
            println!();
            if stale {
                println!("== {} [stale] ==", ap_date_time(fetched_at));
            } else {
                println!("== {} ==", ap_date_time(fetched_at));
            }
            let _ = render(&summary, format);
        });
        spinner.set_message(format!("next poll in {}s", args.interval.max(5)));
    }
    Ok(())
}
