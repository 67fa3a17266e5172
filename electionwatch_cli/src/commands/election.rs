//! The `election` subcommand: election metadata and feed status.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use electionwatch_lib::format::is_test_election;
use electionwatch_lib::types::Election;
use electionwatch_lib::validation;
use electionwatch_lib::{CachedClient, ElectionQuery};

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ElectionArgs {
    /// Election id (default: the newest election)
    #[arg(long)]
    pub id: Option<String>,

    /// List every election the backend knows about
    #[arg(long)]
    pub all: bool,
}

fn test_flags(elections: &[Election]) -> Vec<bool> {
    let now = Utc::now();
    elections
        .iter()
        .map(|e| {
            e.election_date
                .as_deref()
                .map(|date| is_test_election(date, now))
                .unwrap_or(false)
        })
        .collect()
}

fn render(elections: &[Election], format: &OutputFormat) -> Result<()> {
    let flags = test_flags(elections);
    match format {
        OutputFormat::Json => output::print_json(&elections),
        OutputFormat::Csv => output::print_csv(&output::build_election_rows(elections, &flags))?,
        OutputFormat::Table => output::print_table(output::build_election_rows(elections, &flags)),
        OutputFormat::Markdown => {
            output::print_markdown(output::build_election_rows(elections, &flags))
        }
    }
    if flags.iter().any(|test| *test) {
        eprintln!("Note: the feed carries Secretary of State test data until mid-afternoon Central on election day.");
    }
    Ok(())
}

pub async fn run(args: &ElectionArgs, client: &CachedClient, format: &OutputFormat) -> Result<()> {
    if args.all {
        let resp = client.get_elections(&ElectionQuery::default()).await?;
        let mut elections = resp.data;
        elections.sort_by(|a, b| b.election_id.cmp(&a.election_id));
        if elections.is_empty() {
            eprintln!("No elections found.");
            return Ok(());
        }
        return render(&elections, format);
    }

    let election = match &args.id {
        Some(id) => {
            client
                .find_election(&validation::validate_election_id(id)?)
                .await?
        }
        None => client.current_election().await?,
    };
    render(&[election], format)
}
