//! Bookmark Harvester main entry point
//!
//! This is the command-line interface for the Bookmark Harvester.

use anyhow::Context;
use bookmark_harvester::browser::ChromePage;
use bookmark_harvester::config::{load_config_with_hash, Config};
use bookmark_harvester::harvester::{HumanPacer, Orchestrator};
use bookmark_harvester::output::stats::DEFAULT_REPORT_LIMIT;
use bookmark_harvester::output::{load_statistics, print_statistics, MarkdownWriter};
use bookmark_harvester::session::{login_interactive, AuthenticatedSession};
use bookmark_harvester::storage::open_ledger;
use bookmark_harvester::{HarvestError, RunOutcome, RunReport};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Configuration file picked up when `--config` is not given
const DEFAULT_CONFIG_PATH: &str = "harvester.toml";

/// Bookmark Harvester: a paced bookmark archiver
///
/// Logs into the site through a real browser, walks the bookmarks list, and
/// saves each bookmarked post as a markdown note. A SQLite ledger makes
/// re-runs skip everything already saved.
#[derive(Parser, Debug)]
#[command(name = "bookmark-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A paced bookmark archiver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to TOML configuration file (defaults to ./harvester.toml if present)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in interactively and save the session
    Auth,

    /// Save up to N bookmarks
    Scrape {
        /// Number of bookmarks to collect
        #[arg(value_name = "N", default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,
    },

    /// Show what has been saved so far
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::InvalidSubcommand
            | ErrorKind::UnknownArgument
            | ErrorKind::MissingSubcommand
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                print_usage()?;
                return Ok(());
            }
            _ => e.exit(),
        },
    };

    let command = match cli.command {
        Some(command) => command,
        None => {
            print_usage()?;
            return Ok(());
        }
    };

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_deref())?;

    match command {
        Command::Auth => handle_auth(&config).await,
        Command::Scrape { count } => handle_scrape(&config, count as usize).await,
        Command::Stats => handle_stats(&config),
    }
}

fn print_usage() -> anyhow::Result<()> {
    Cli::command().print_help()?;
    println!();
    println!("Examples:");
    println!("  bookmark-harvester auth        - Log in and save the session");
    println!("  bookmark-harvester scrape      - Save 10 bookmarks");
    println!("  bookmark-harvester scrape 20   - Save 20 bookmarks");
    println!("  bookmark-harvester stats       - Show ledger statistics");
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bookmark_harvester=info,warn"),
            1 => EnvFilter::new("bookmark_harvester=debug,info"),
            2 => EnvFilter::new("bookmark_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the explicit config, else `harvester.toml` if present, else defaults
fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !default.exists() {
                tracing::info!("No {} found, using default configuration", DEFAULT_CONFIG_PATH);
                return Ok(Config::default());
            }
            default
        }
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Handles the `auth` command: interactive login
async fn handle_auth(config: &Config) -> anyhow::Result<()> {
    println!("Opening {} for login...", config.site.login_url());

    let saved = login_interactive(config)
        .await
        .context("Interactive login failed")?;

    println!(
        "Login successful. Saved {} cookies to {}",
        saved, config.browser.session_path
    );
    Ok(())
}

/// Handles the `scrape` command: one harvesting run
async fn handle_scrape(config: &Config, count: usize) -> anyhow::Result<()> {
    let session = AuthenticatedSession::open(config)
        .await
        .context("Failed to start the browser")?;

    let outcome = run_pipeline(config, session.page(), count).await;

    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close the browser cleanly: {}", e);
    }

    let report = outcome?;
    if report.outcome == RunOutcome::AuthFailed {
        return Err(HarvestError::AuthFailed(
            "the saved session did not reach the home view; please run \"bookmark-harvester auth\" first"
                .to_string(),
        )
        .into());
    }
    print_report(&report);
    Ok(())
}

async fn run_pipeline(config: &Config, page: &ChromePage, count: usize) -> anyhow::Result<RunReport> {
    let ledger = open_ledger(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open ledger at {}", config.output.database_path))?;
    let writer = MarkdownWriter::new(&config.output.output_dir);
    let pacer = HumanPacer;

    let mut orchestrator = Orchestrator::new(config, page, ledger, &writer, &pacer)?;
    let result = orchestrator.run(count).await;
    orchestrator.into_ledger().close()?;

    Ok(result?)
}

fn print_report(report: &RunReport) {
    if report.outcome == RunOutcome::NoItems {
        println!("No bookmarks found to process.");
        return;
    }

    println!(
        "Done! Saved {} new bookmarks ({} already existed, {} failed).",
        report.saved, report.skipped, report.failed
    );
    println!(
        "Ledger: {} items ({} before this run)",
        report.ledger_total, report.ledger_total_before
    );
}

/// Handles the `stats` command: shows statistics from the ledger
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let ledger = open_ledger(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&ledger, DEFAULT_REPORT_LIMIT)?;
    print_statistics(&stats);

    Ok(())
}
