//! geocache - inspect and maintain a geo-scoped catalogue cache.
//!
//! Operates directly on the store's directory; no network access.

mod commands;
mod config;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::{Config, Overrides};
use geocache_core::models::LocationSummary;
use geocache_core::CatalogueFileStore;

#[derive(Debug, Parser)]
#[command(name = "geocache", version, about = "Inspect and maintain a geo-scoped catalogue cache")]
struct Cli {
    /// Cache root directory
    #[arg(long, env = "GEOCACHE_ROOT", global = true)]
    root: Option<PathBuf>,

    /// Subdirectory of the root holding catalogue data
    #[arg(long, global = true)]
    subdirectory: Option<String>,

    /// Contexts older than this many days are expired
    #[arg(long, global = true)]
    max_age_days: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the cache keys a location maps to
    Keys(LocationArgs),
    /// Persist sections from a JSON file for a location
    Persist {
        /// File containing `{ "sections": [...], "section_order": [...] }`
        file: PathBuf,
        #[command(flatten)]
        location: LocationArgs,
    },
    /// Print the merged sections cached for a location
    Restore(LocationArgs),
    /// Print the sections from the most recent persist
    Last,
    /// List stored contexts
    List,
    /// Delete contexts older than the maximum age
    ClearExpired,
    /// Delete one context by key
    Remove { key: String },
    /// Delete every context and the snapshot
    Clear,
    /// Show or change saved defaults
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    SetRoot { path: PathBuf },
    SetSubdirectory { name: String },
    SetMaxAge { days: i64 },
}

#[derive(Debug, Clone, Args)]
struct LocationArgs {
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    admin_area: Option<String>,
    #[arg(long)]
    locality: Option<String>,
    #[arg(long)]
    sub_locality: Option<String>,
    #[arg(long)]
    timezone: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,
}

impl From<LocationArgs> for LocationSummary {
    fn from(args: LocationArgs) -> Self {
        LocationSummary {
            country_code: args.country,
            admin_area: args.admin_area,
            locality: args.locality,
            sub_locality: args.sub_locality,
            timezone: args.timezone,
            latitude: args.lat,
            longitude: args.lon,
        }
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing();

    let mut config = Config::load()?;
    let overrides = Overrides {
        cache_root: cli.root,
        subdirectory: cli.subdirectory,
        max_context_age_days: cli.max_age_days,
    };

    match cli.command {
        Command::Config { action } => configure(&mut config, &overrides, action),
        Command::Keys(location) => commands::keys(&location.into()),
        Command::Persist { file, location } => {
            let store = open_store(&config, &overrides)?;
            commands::persist(&store, &file, &location.into()).await
        }
        Command::Restore(location) => {
            commands::restore(&open_store(&config, &overrides)?, &location.into()).await
        }
        Command::Last => commands::last(&open_store(&config, &overrides)?).await,
        Command::List => commands::list(&open_store(&config, &overrides)?).await,
        Command::ClearExpired => commands::clear_expired(&open_store(&config, &overrides)?).await,
        Command::Remove { key } => commands::remove(&open_store(&config, &overrides)?, &key).await,
        Command::Clear => commands::clear(&open_store(&config, &overrides)?).await,
    }
}

fn open_store(config: &Config, overrides: &Overrides) -> Result<CatalogueFileStore> {
    let store = commands::open_store(config.store_config(overrides)?)?;
    info!(root = %store.config().catalogue_dir().display(), "Opened catalogue store");
    Ok(store)
}

fn configure(config: &mut Config, overrides: &Overrides, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let store = config.store_config(overrides)?;
            println!("config file:      {}", Config::config_path()?.display());
            println!("catalogue dir:    {}", store.catalogue_dir().display());
            println!("max context age:  {} days", store.max_context_age.num_days());
            return Ok(());
        }
        ConfigAction::SetRoot { path } => config.cache_root = Some(path),
        ConfigAction::SetSubdirectory { name } => config.subdirectory = Some(name),
        ConfigAction::SetMaxAge { days } => {
            anyhow::ensure!(days >= 0, "Maximum context age must not be negative");
            config.max_context_age_days = Some(days);
        }
    }
    config.save()?;
    println!("Saved {}", Config::config_path()?.display());
    Ok(())
}
