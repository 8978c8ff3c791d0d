//! notecrawler CLI
//!
//! Local execution entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use notecrawler::{
    error::{AppError, Result},
    models::{Config, ExportMode, RunReport, Target, TargetEntry},
    pipeline::BatchOrchestrator,
    services::HttpPlatformClient,
    utils::url::extract_item_id,
};

/// notecrawler - post crawler with spreadsheet snapshots
#[derive(Parser, Debug)]
#[command(
    name = "notecrawler",
    version,
    about = "Crawl posts by URL, search or profile and export snapshots"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Override the configured export mode
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Write the run report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl every configured target
    Run,

    /// Crawl a single post by URL
    Item {
        url: String,

        /// Sink identifier (default: the post id)
        #[arg(long)]
        sink: Option<String>,
    },

    /// Crawl the results of one keyword search
    Search {
        query: String,

        /// Maximum number of posts (default: search.count)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Sink identifier (default: the query)
        #[arg(long)]
        sink: Option<String>,
    },

    /// Crawl every post of a profile
    Profile {
        url: String,

        /// Sink identifier (default: "profile")
        #[arg(long)]
        sink: Option<String>,
    },

    /// Validate the configuration file
    Validate,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    LocalFile,
    RemoteSheet,
    Both,
    None,
}

impl From<ModeArg> for ExportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::LocalFile => ExportMode::LocalFile,
            ModeArg::RemoteSheet => ExportMode::RemoteSheet,
            ModeArg::Both => ExportMode::Both,
            ModeArg::None => ExportMode::None,
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// A config value, falling back to the named environment variable.
fn secret(configured: Option<&String>, env_var: &str) -> Option<String> {
    configured
        .cloned()
        .or_else(|| std::env::var(env_var).ok())
        .filter(|s| !s.trim().is_empty())
}

/// Targets selected by the subcommand.
fn targets_for(command: Command, config: &Config) -> Result<Vec<Target>> {
    let entry = match command {
        Command::Run => return config.targets(),
        Command::Validate => return Ok(Vec::new()),
        Command::Item { url, sink } => TargetEntry {
            label: extract_item_id(&url).unwrap_or_else(|| "item".to_string()),
            sink,
            url: Some(url),
            ..TargetEntry::default()
        },
        Command::Search { query, count, sink } => TargetEntry {
            label: query.clone(),
            sink,
            query: Some(query),
            count,
            ..TargetEntry::default()
        },
        Command::Profile { url, sink } => TargetEntry {
            label: "profile".to_string(),
            sink,
            profile: Some(url),
            ..TargetEntry::default()
        },
    };
    Ok(vec![entry.to_target(&config.search)?])
}

fn save_report(report: &RunReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    log::info!("Run report saved to {}", path.display());
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("notecrawler starting...");

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::load_or_default(&cli.config)
    };
    if let Some(mode) = cli.mode {
        config.export.mode = mode.into();
    }

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    if matches!(cli.command, Command::Validate) {
        log::info!(
            "✓ Config OK ({} targets, export mode {:?})",
            config.targets.len(),
            config.export.mode
        );
        return Ok(());
    }

    let credential = secret(
        config.platform.credential.as_ref(),
        &config.platform.credential_env,
    )
    .unwrap_or_else(|| {
        log::warn!(
            "No platform credential configured (set {})",
            config.platform.credential_env
        );
        String::new()
    });
    let sheets_token = if config.export.mode.uses_remote_sheet() {
        let token = secret(
            config.export.sheets.access_token.as_ref(),
            &config.export.sheets.access_token_env,
        );
        if token.is_none() {
            return Err(AppError::config(format!(
                "remote sheet export needs an access token (set {})",
                config.export.sheets.access_token_env
            )));
        }
        token
    } else {
        None
    };

    let report_path = cli
        .report
        .clone()
        .or_else(|| config.export.report_path.as_ref().map(PathBuf::from));
    let targets = targets_for(cli.command, &config)?;

    let client = Arc::new(HttpPlatformClient::from_config(&config.platform)?);
    let orchestrator = BatchOrchestrator::from_config(&config, client, credential, sheets_token)?;

    let report = orchestrator.run(&targets).await;

    for outcome in report.outcomes.entries() {
        let status = if outcome.success { "✓" } else { "✗" };
        log::info!(
            "{} {} -> {}: {} records ({})",
            status,
            outcome.label,
            outcome.sink,
            outcome.record_count,
            outcome.message
        );
    }

    if let Some(path) = report_path {
        save_report(&report, &path)?;
    }

    log::info!("Done!");

    Ok(())
}
