//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use addonsync_core::{ProgressReporter, SyncReport};
use addonsync_shared::{AppConfig, SyncConfig, curseforge_api_key, init_config, load_config};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// addonsync: enrich an addon catalog with registry metadata.
#[derive(Parser)]
#[command(
    name = "addonsync",
    version,
    about = "Enrich an addon catalog with CurseForge and Modrinth metadata.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Enrich the catalog and rewrite the document, table, and id cache.
    Sync(SyncArgs),

    /// Print the emitted document as JSON.
    Show {
        /// Document path (defaults to the configured one).
        #[arg(long)]
        document: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `sync`. Each one overrides the matching config value.
#[derive(Args, Debug, Default)]
pub(crate) struct SyncArgs {
    /// Scrape CurseForge project pages for ids the table and cache lack.
    #[arg(long)]
    pub scrape: bool,

    /// Source catalog table (CSV).
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Output YAML document.
    #[arg(long)]
    pub document: Option<PathBuf>,

    /// Id cache file (JSON).
    #[arg(long)]
    pub ids: Option<PathBuf>,

    /// Maximum records enriched at once.
    #[arg(long)]
    pub concurrency: Option<usize>,
}

impl SyncArgs {
    /// Merge these flags over the config file values.
    fn apply(&self, mut config: SyncConfig) -> SyncConfig {
        if self.scrape {
            config.deep_resolution = true;
        }
        if let Some(source) = &self.source {
            config.source_path = source.clone();
        }
        if let Some(document) = &self.document {
            config.document_path = document.clone();
        }
        if let Some(ids) = &self.ids {
            config.id_cache_path = ids.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        config
    }
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

    let filter = match cli.verbose {
        0 => "addonsync=info",
        1 => "addonsync=debug",
        _ => "addonsync=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Sync(args) => cmd_sync(&args).await,
        Command::Show { document } => cmd_show(document).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_sync(args: &SyncArgs) -> Result<()> {
    let config = load_config()?;
    // Check the credential before any file or network work.
    let api_key = curseforge_api_key(&config)?;

    let sync_config = args.apply(SyncConfig::from(&config));
    sync_config.validate()?;

    info!(
        source = %sync_config.source_path.display(),
        document = %sync_config.document_path.display(),
        scrape = sync_config.deep_resolution,
        "syncing addon catalog"
    );

    let reporter = CliProgress::new();
    let report = addonsync_core::run_sync(&sync_config, &api_key, &reporter).await?;

    println!();
    println!("  Catalog synced.");
    println!("  Records:    {}", report.records);
    println!("  Enriched:   {}", report.enriched);
    println!("  Partial:    {}", report.partial);
    println!("  No links:   {}", report.unenriched);
    println!(
        "  Ids:        {} cached, {} scraped, {} written to table",
        report.ids_from_cache, report.ids_scraped, report.ids_written
    );
    println!("  Document:   {}", sync_config.document_path.display());
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_show(document: Option<PathBuf>) -> Result<()> {
    let path = match document {
        Some(path) => path,
        None => load_config()?.paths.document,
    };

    let doc = addonsync_storage::load_document(&path).await?;
    let json = serde_json::to_string_pretty(&doc)
        .map_err(|e| eyre!("document at {} cannot be shown as JSON: {e}", path.display()))?;
    println!("{json}");
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
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

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn record_done(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Enriching [{current}/{total}] {name}"));
    }

    fn done(&self, _report: &SyncReport) {
        self.spinner.finish_and_clear();
    }
}
