//! Ledgerline batch importer.
//!
//! Loads a chart of accounts, validates a batch payload against it and
//! optionally commits the valid groups.
//!
//! Usage: ledgerline-import --chart chart.csv check batch.csv

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use ledgerline_core::import::csv::parse_delimited;
use ledgerline_core::import::ImportSettings;
use ledgerline_core::ledger::{
    Account, AccountType, CachedAccountDirectory, InMemoryAccountDirectory,
};
use ledgerline_core::workflow::WorkflowPolicy;
use ledgerline_core::{LedgerBook, PrefixSequenceAllocator, StaticActor};
use ledgerline_shared::AppConfig;
use ledgerline_shared::types::UserId;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ledgerline-import")]
#[command(about = "Validate and commit batch entry imports", long_about = None)]
struct Cli {
    /// Chart of accounts: code, name, type and optional subtype columns
    #[arg(short, long, default_value = "./chart.csv")]
    chart: PathBuf,

    /// Acting user recorded on created entries
    #[arg(long)]
    actor: Option<UserId>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a batch and print the per-group report
    Check {
        /// Batch payload
        batch: PathBuf,
    },

    /// Validate a batch and commit its valid groups
    Commit {
        /// Batch payload
        batch: PathBuf,
        /// Post committed entries instead of leaving them as drafts
        #[arg(long)]
        post: bool,
    },

    /// Print an empty batch payload with the header row
    Template,
}

#[derive(Serialize)]
struct CommitOutput<'a> {
    report: &'a ledgerline_core::import::ImportReport,
    summary: ledgerline_core::import::CommitSummary,
    trial_balance: ledgerline_core::ledger::TrialBalance,
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut settings = ImportSettings::from_config(&config.import)?;
    let policy = WorkflowPolicy::from_config(&config.ledger)?;

    let chart = load_chart(&cli.chart, settings.delimiter)?;
    info!(accounts = chart.len(), path = %cli.chart.display(), "Chart of accounts loaded");

    if let Commands::Commit { post: true, .. } = cli.command {
        settings.post_on_commit = true;
    }

    let book = LedgerBook::new(
        CachedAccountDirectory::new(chart),
        PrefixSequenceAllocator::new(),
        StaticActor::new(cli.actor.unwrap_or_default()),
    )
    .with_policy(policy)
    .with_import_settings(settings);

    match &cli.command {
        Commands::Template => print!("{}", book.template()),
        Commands::Check { batch } => {
            let report = book.import_csv(&read(batch)?)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Commit { batch, .. } => {
            let report = book.import_csv(&read(batch)?)?;
            let summary = book.commit_batch(&report.valid_ids());
            let output = CommitOutput {
                report: &report,
                summary,
                trial_balance: book.trial_balance(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Reads `code,name,type[,subtype]` rows; a header row is skipped if present.
fn load_chart(path: &Path, delimiter: char) -> anyhow::Result<InMemoryAccountDirectory> {
    let records = parse_delimited(&read(path)?, delimiter)?;
    let mut accounts = Vec::with_capacity(records.len());

    for (i, record) in records.iter().enumerate() {
        let [code, name, kind, rest @ ..] = record.as_slice() else {
            bail!("{}: row {} needs code, name and type", path.display(), i + 1);
        };
        let Some(account_type) = AccountType::parse(kind) else {
            if i == 0 {
                continue;
            }
            bail!("{}: row {} has unknown account type '{kind}'", path.display(), i + 1);
        };

        let mut account = Account::new(code.trim(), name.trim(), account_type);
        if let Some(subtype) = rest.first().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            account = account.with_subtype(subtype);
        }
        accounts.push(account);
    }

    Ok(InMemoryAccountDirectory::new(accounts))
}
