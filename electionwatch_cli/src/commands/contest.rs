//! The `contest` subcommand: one contest in detail.

use anyhow::{bail, Result};
use clap::Args;
use electionwatch_lib::validation;
use electionwatch_lib::{normalize, CachedClient, ContestQuery, Query};

use crate::commands::results::normalize_options;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ContestArgs {
    /// Contest id (e.g. id-MN---43000-2101)
    pub id: String,

    /// Candidate order: percentage or votes
    #[arg(long, default_value = "percentage")]
    pub sort_by: String,

    /// Drop rows with malformed numbers instead of failing
    #[arg(long)]
    pub permissive: bool,
}

pub async fn run(
    args: &ContestArgs,
    client: &CachedClient,
    format: &OutputFormat,
    election_id: Option<&str>,
) -> Result<()> {
    let id = validation::validate_contest_id(&args.id)?;

    let mut query = ContestQuery::default().with_contest_id(&id);
    if let Some(election) = election_id {
        query = query.with_election_id(&validation::validate_election_id(election)?);
    }

    let resp = client.get_contests_with_results(&query).await?;
    if resp.data.is_empty() {
        bail!("no contest found with id {}", id);
    }

    let contest = normalize(&resp.data, normalize_options(&args.sort_by, args.permissive))?;
    output::print_contest(&contest, format)
}
