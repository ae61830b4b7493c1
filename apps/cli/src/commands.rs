//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use listing_core::{BatchProgress, BatchReport, BatchRunner, RecordOutcome, RunStatus};
use listing_inference::InferenceClient;
use listing_shared::{
    AppConfig, PropertyId, PropertyRecord, init_config, load_config, load_config_from,
};
use listing_storage::Storage;
use tracing::{error, info};

/// Crates whose logs are shown at the selected verbosity.
const LOG_TARGETS: &[&str] = &[
    "listing_rewriter",
    "listing_core",
    "listing_inference",
    "listing_storage",
    "listing_shared",
];

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// listing-rewriter: rewrite property listings with a local model.
#[derive(Parser)]
#[command(
    name = "listing-rewriter",
    version,
    about = "Rewrite property listings and generate summaries with a local text-generation model.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.listing-rewriter/listing-rewriter.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Property database path, overriding the config file.
    #[arg(long, env = "LISTING_REWRITER_DB", global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Rewrite every property and store a fresh summary for each.
    Sync,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Sync => cmd_sync(cli.config.as_deref(), cli.database.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(cli.config.as_deref(), cli.database.as_deref()).await,
        },
    }
}

/// Load config from `--config` or the default location, then apply overrides.
fn resolve_config(config_path: Option<&Path>, database: Option<&Path>) -> Result<AppConfig> {
    let mut config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(db) = database {
        config.database.path = db.to_string_lossy().to_string();
    }
    Ok(config)
}

/// Rewrite all properties.
///
/// Processing failures are logged, never turned into an exit code; only an
/// unusable configuration aborts before the run starts.
async fn cmd_sync(config_path: Option<&Path>, database: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path, database)?;
    let client = InferenceClient::new(&config.inference)?;

    info!(
        database = %config.database.path,
        endpoint = %client.endpoint(),
        model = client.model(),
        "starting property sync"
    );

    let storage = match Storage::open(Path::new(&config.database.path)).await {
        Ok(storage) => storage,
        Err(e) => {
            error!(error = %e, "error accessing database");
            info!("processing completed");
            return Ok(());
        }
    };

    let reporter = CliProgress::new();
    let report = BatchRunner::new(&client, &storage, &reporter).run().await;

    if report.status != RunStatus::NothingToDo {
        println!();
        println!("  Properties: {}", report.fetched);
        println!("  Rewritten:  {}", report.rewritten);
        println!("  Summaries:  {}", report.summaries_created);
        println!("  Skipped:    {}", report.skipped);
        println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
        println!();
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl BatchProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn record_started(&self, record: &PropertyRecord, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Rewriting [{current}/{total}] property {}", record.id));
    }

    fn record_finished(&self, id: PropertyId, outcome: RecordOutcome) {
        if let RecordOutcome::Skipped(reason) = outcome {
            self.spinner
                .set_message(format!("Skipped property {id} ({reason})"));
        }
    }

    fn done(&self, _report: &BatchReport) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>, database: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path, database)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
