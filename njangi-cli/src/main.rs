//! Njangi CLI - association ledger from the command line.
//!
//! ```bash
//! njangi --journal ./data/ledger.jsonl member register --name "Awa Nfor" --email awa@assoc.cm --phone 677000000
//! njangi --as treasurer@assoc.cm contribution add awa@assoc.cm 50000 --description "January"
//! njangi loan request awa@assoc.cm 150000 --purpose "Market stall"
//! ```
//!
//! Configuration is read from `njangi.toml` (or `--config`) and `NJANGI_*` variables.
//! See `njangi --help` for all commands.

mod commands;

use clap::{Parser, Subcommand};
use commands::{contribution, loan, member, report, Context};
use njangi_core::config::NjangiConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "njangi", about = "Savings association ledger and loan desk", version)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "njangi.toml")]
    config: PathBuf,

    /// Journal file (overrides storage.journal_path)
    #[arg(long, global = true)]
    journal: Option<String>,

    /// Act as the member with this email or id (defaults to the system administrator)
    #[arg(long = "as", global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register and administer members
    #[command(subcommand)]
    Member(member::MemberCommand),

    /// Record, edit and delete contributions
    #[command(subcommand)]
    Contribution(contribution::ContributionCommand),

    /// Request and decide loans
    #[command(subcommand)]
    Loan(loan::LoanCommand),

    /// Policy, totals and activity
    #[command(subcommand)]
    Report(report::ReportCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = NjangiConfig::load_from(&cli.config)?;
    if let Some(journal) = cli.journal {
        config.storage.journal_path = Some(journal);
    }
    njangi_core::logging::init_logging(&config.logging)?;

    let ctx = Context::open(&config, cli.actor.as_deref()).await?;
    match cli.command {
        Commands::Member(cmd) => member::run(&ctx, cmd).await,
        Commands::Contribution(cmd) => contribution::run(&ctx, cmd).await,
        Commands::Loan(cmd) => loan::run(&ctx, cmd).await,
        Commands::Report(cmd) => report::run(&ctx, cmd).await,
    }
}
