mod commands;
mod output;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use electionwatch_lib::cache::MemoryCache;
use electionwatch_lib::{CachedClient, LiveClient};

#[derive(Parser)]
#[command(name = "electionwatch")]
#[command(about = "Follow Minnesota election results from the terminal")]
struct Cli {
    /// Output format: table, json, csv, or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Results API base URL (or ELECTIONWATCH_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Election to query, e.g. id-20221108 (or ELECTIONWATCH_ELECTION_ID;
    /// default: the backend's current election)
    #[arg(long, global = true)]
    election_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and normalize contest results
    Results(Box<commands::results::ResultsArgs>),
    /// Show one contest in detail
    Contest(commands::contest::ContestArgs),
    /// Legislative balance-of-power panel
    Chamber(commands::chamber::ChamberArgs),
    /// Election metadata and feed status
    Election(commands::election::ElectionArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("electionwatch=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = output::parse_format(&cli.output)?;
    let api_url = cli
        .api_url
        .clone()
        .or_else(|| std::env::var("ELECTIONWATCH_API_URL").ok());
    let election_id = cli
        .election_id
        .clone()
        .or_else(|| std::env::var("ELECTIONWATCH_ELECTION_ID").ok());
    let election_id = election_id.as_deref();

    let cache = MemoryCache::new(Duration::from_secs(300));
    let (client, live) = match api_url.as_deref() {
        Some(url) => (
            CachedClient::with_base_url(url, cache),
            LiveClient::with_base_url(url),
        ),
        None => (CachedClient::new(cache), LiveClient::new()),
    };
    let live = Arc::new(live);

    match &cli.command {
        Commands::Results(args) => {
            commands::results::run(args.as_ref(), &client, &live, &format, election_id).await?
        }
        Commands::Contest(args) => {
            commands::contest::run(args, &client, &format, election_id).await?
        }
        Commands::Chamber(args) => {
            commands::chamber::run(args, &client, &live, &format, election_id).await?
        }
        Commands::Election(args) => commands::election::run(args, &client, &format).await?,
    }

    Ok(())
}
