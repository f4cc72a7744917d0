//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use keywordforge_core::pipeline::{self, ProgressReporter};
use keywordforge_embeddings::AnyEmbedder;
use keywordforge_report::{render_report, report_file_name};
use keywordforge_shared::{
    AppConfig, KeywordForgeError, expand_home, init_config, load_config, validate_api_key,
    validate_email,
};
use keywordforge_storage::Storage;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// KeywordForge — turn raw keyword lists into grouped content plans.
#[derive(Parser)]
#[command(
    name = "keywordforge",
    version,
    about = "Cluster keyword submissions and derive blog post outlines from them.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
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
    /// Submit a comma-separated keyword list to the pool.
    Ingest {
        /// Raw keyword text, e.g. "SEO, content marketing, PPC".
        text: String,

        /// Submitter identifier recorded with the batch.
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Cluster the accumulated keyword pool into semantic groups.
    Group {
        /// Maximum number of groups (defaults to the configured value).
        #[arg(short, long)]
        max_groups: Option<u32>,
    },

    /// Generate blog post outlines from the latest grouping.
    Outline,

    /// Refine the latest outlines and write them as a text report.
    Refine {
        /// Output directory for the report (defaults to the configured one).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Show recent outline batches.
    History {
        /// Number of batches to show.
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },

    /// Record the delivery email address for a user.
    SetEmail {
        /// Email address to record.
        email: String,

        /// User identifier the address belongs to.
        #[arg(short, long, default_value = "local")]
        user: String,
    },

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

    let filter = match cli.verbose {
        0 => "keywordforge=info",
        1 => "keywordforge=debug",
        _ => "keywordforge=trace",
    };

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
///
/// Recoverable pipeline errors (empty submission, missing snapshot, a
/// provider outage) are user notices, not failures: print and exit clean.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let result = match cli.command {
        Command::Ingest { text, user } => cmd_ingest(&text, &user).await,
        Command::Group { max_groups } => cmd_group(max_groups).await,
        Command::Outline => cmd_outline().await,
        Command::Refine { out } => cmd_refine(out.as_deref()).await,
        Command::History { limit } => cmd_history(limit).await,
        Command::SetEmail { email, user } => cmd_set_email(&email, &user).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    };

    match result {
        Err(report) => {
            if let Some(err) = report.downcast_ref::<KeywordForgeError>() {
                if err.is_recoverable() {
                    println!("{err}");
                    return Ok(());
                }
            }
            Err(report)
        }
        ok => ok,
    }
}

/// Open the store at the configured database path, creating parent
/// directories on first use.
async fn open_storage(config: &AppConfig) -> Result<Storage> {
    let db_path = expand_home(&config.defaults.db_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| eyre!("cannot create '{}': {e}", parent.display()))?;
    }
    Ok(Storage::open(&db_path).await?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_ingest(text: &str, user: &str) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let reporter = CliProgress::new();
    let result = pipeline::ingest(&storage, user, text, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Keywords saved!");
    println!("  Batch:    {}", result.batch_id);
    println!("  Keywords: {}", result.keyword_count);
    println!();

    Ok(())
}

async fn cmd_group(max_groups: Option<u32>) -> Result<()> {
    let config = load_config()?;
    validate_api_key(&config)?;

    let storage = open_storage(&config).await?;
    let embedder = AnyEmbedder::from_config(&config.embedding)?;
    let max_groups = max_groups.unwrap_or(config.defaults.max_groups);
    if max_groups == 0 {
        return Err(eyre!("--max-groups must be at least 1"));
    }

    info!(max_groups, "clustering keyword pool");

    let reporter = CliProgress::new();
    let result = pipeline::group(&storage, &embedder, max_groups, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Keyword groups created!");
    println!("  Pool:     {} keywords ({} distinct)", result.pool_size, result.distinct_count);
    println!("  Groups:   {}", result.snapshot.groups.len());
    for (label, keywords) in &result.snapshot.groups {
        println!("    Group {}: {}", label + 1, keywords.join(", "));
    }
    println!();

    Ok(())
}

async fn cmd_outline() -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let reporter = CliProgress::new();
    let batch = pipeline::generate_outlines(&storage, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Outlines generated!");
    for (i, record) in batch.records.iter().enumerate() {
        println!();
        println!("  Group {}: {}", i + 1, record.group_summary);
        println!("  {}", record.idea);
        for line in record.outline_body.lines() {
            println!("    {line}");
        }
    }
    println!();

    Ok(())
}

async fn cmd_refine(out: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let reporter = CliProgress::new();
    let refined = pipeline::refine_latest(&storage, &reporter).await?;
    reporter.finish();

    let output_dir = match out {
        Some(p) => PathBuf::from(p),
        None => expand_home(&config.defaults.output_dir),
    };
    std::fs::create_dir_all(&output_dir)
        .map_err(|e| eyre!("cannot create '{}': {e}", output_dir.display()))?;

    let report = render_report(
        "Refined Content Outlines",
        &refined.records,
        config.report.lines_per_page,
    );
    let path = output_dir.join(report_file_name("refined-outlines", refined.created_at));
    write_report(&path, &report)?;

    println!();
    println!("  Outlines refined!");
    println!("  Records: {}", refined.records.len());
    println!("  Report:  {}", path.display());
    println!();

    Ok(())
}

fn write_report(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)
        .map_err(|e| eyre!("cannot write '{}': {e}", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(())
}

async fn cmd_history(limit: u32) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let entries = pipeline::history(&storage, limit).await?;
    if entries.is_empty() {
        println!("No outline batches yet. Run `keywordforge outline` first.");
        return Ok(());
    }

    println!();
    for entry in &entries {
        println!("  {}", entry.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
        for summary in &entry.group_summaries {
            println!("    - {summary}");
        }
    }
    println!();

    Ok(())
}

async fn cmd_set_email(email: &str, user: &str) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let email = validate_email(email)?;
    storage.upsert_email(user, email).await?;

    println!("Email for '{user}' set to {email}");
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
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }
}
