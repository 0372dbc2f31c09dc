//! pebind CLI
//!
//! Bind a JSON store to a page, apply path assignments through the binder,
//! and show what the bound elements display afterwards.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pebind_core::{scaffold, shared, BinderConfig, BoundHandle, PathTracking};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod page;

use config::PebindConfig;

#[derive(Parser)]
#[command(name = "pebind")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reactive text binding for JSON stores", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./pebind.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every bindable selector path in a store
    Paths {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Print a page with one bound element per store leaf
    Scaffold {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Apply assignments and print the updated page or store
    Apply {
        #[command(flatten)]
        store: StoreArgs,

        /// Page file to bind instead of a scaffolded page
        #[arg(short, long)]
        page: Option<PathBuf>,

        /// Path tracking mode
        #[arg(short, long, value_enum)]
        tracking: Option<TrackingArg>,

        /// Assignment such as `store.listitems[1].text="Y"`
        #[arg(short = 's', long = "set", value_name = "EXPR=VALUE", required = true)]
        assignments: Vec<String>,

        /// What to print once all assignments are applied
        #[arg(short, long, value_enum, default_value_t = Emit::Html)]
        emit: Emit,
    },
}

#[derive(clap::Args)]
struct StoreArgs {
    /// JSON store file
    #[arg(long = "store")]
    path: Option<PathBuf>,

    /// Symbolic name of the store
    #[arg(short, long)]
    name: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum TrackingArg {
    ChainLocal,
    Shared,
}

impl From<TrackingArg> for PathTracking {
    fn from(arg: TrackingArg) -> Self {
        match arg {
            TrackingArg::ChainLocal => PathTracking::ChainLocal,
            TrackingArg::Shared => PathTracking::Shared,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    Html,
    Store,
    Both,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = PebindConfig::discover(cli.config.as_deref())?;

    match cli.command {
        Commands::Paths { store } => cmd_paths(&config, &store),
        Commands::Scaffold { store } => cmd_scaffold(&config, &store),
        Commands::Apply {
            store,
            page,
            tracking,
            assignments,
            emit,
        } => cmd_apply(
            &config,
            &store,
            page.as_deref(),
            tracking.map(PathTracking::from),
            &assignments,
            emit,
        ),
    }
}

/// Resolve the store name and load its value
fn load_store(config: &PebindConfig, args: &StoreArgs) -> Result<(String, Value)> {
    let name = args.name.clone().unwrap_or_else(|| config.store.name.clone());
    let path = args
        .path
        .as_deref()
        .or(config.store.path.as_deref())
        .context("No store file given. Pass --store or set [store] path in pebind.toml")?;

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    debug!("Loaded store '{}' from {}", name, path.display());
    Ok((name, value))
}

fn cmd_paths(config: &PebindConfig, args: &StoreArgs) -> Result<()> {
    let (name, value) = load_store(config, args)?;
    for (selector, leaf) in scaffold::bindable_paths(&name, &value) {
        println!("{}\t{}", selector, leaf);
    }
    Ok(())
}

fn cmd_scaffold(config: &PebindConfig, args: &StoreArgs) -> Result<()> {
    let (name, value) = load_store(config, args)?;
    let document = scaffold::scaffold(&name, &value, &config.binder.attribute);
    print!("{}", document.to_html());
    Ok(())
}

fn cmd_apply(
    config: &PebindConfig,
    args: &StoreArgs,
    page: Option<&Path>,
    tracking: Option<PathTracking>,
    assignments: &[String],
    emit: Emit,
) -> Result<()> {
    print!("{}", apply(config, args, page, tracking, assignments, emit)?);
    Ok(())
}

/// Bind the store, run every assignment and render what `emit` asks for
fn apply(
    config: &PebindConfig,
    args: &StoreArgs,
    page: Option<&Path>,
    tracking: Option<PathTracking>,
    assignments: &[String],
    emit: Emit,
) -> Result<String> {
    let (name, value) = load_store(config, args)?;

    let mut binder_config: BinderConfig = config.binder.clone();
    if let Some(tracking) = tracking {
        binder_config = binder_config.with_tracking(tracking);
    }

    let document = match page {
        Some(path) => page::load(path, &binder_config.attribute)?,
        None => scaffold::scaffold(&name, &value, &binder_config.attribute),
    };

    let store = shared(value);
    let handle = BoundHandle::builder()
        .data(store.clone())
        .name(name)
        .document(document)
        .config(binder_config)
        .build()?;

    for raw in assignments {
        let (expr, value) = parse_assignment(raw)?;
        let outcome = handle
            .assign(&expr, value)
            .with_context(|| format!("Failed to apply '{}'", raw))?;

        if outcome.updated == 0 {
            warn!("{} matched no bound elements", outcome.selector_path);
        } else {
            info!("{} -> {} element(s)", outcome.selector_path, outcome.updated);
        }
    }

    let stats = handle.stats();
    info!(
        "{} write(s), {} matched, {} unmatched, {} element(s) updated",
        stats.writes, stats.matched_writes, stats.unmatched_writes, stats.elements_updated
    );

    let mut output = String::new();
    if emit != Emit::Store {
        output.push_str(&handle.document().to_html());
    }
    if emit != Emit::Html {
        let json = serde_json::to_string_pretty(&*store.borrow())
            .context("Failed to serialize store")?;
        output.push_str(&json);
        output.push('\n');
    }

    Ok(output)
}

/// Split `EXPR=VALUE`; VALUE is read as JSON, falling back to a plain string
fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let (expr, value) = raw
        .split_once('=')
        .with_context(|| format!("Assignment '{}' is missing '='", raw))?;

    let expr = expr.trim();
    if expr.is_empty() {
        anyhow::bail!("Assignment '{}' has no path expression", raw);
    }

    let value = value.trim();
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((expr.to_string(), value))
}
