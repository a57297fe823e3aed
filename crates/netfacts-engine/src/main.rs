//! netfacts command line.
//!
//! Runs one collection plan against an inventory snapshot, replaying device
//! output from captures, and writes the resulting report as JSON.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use netfacts_driver::{DriverFactory, ReplayConnector};
use netfacts_engine::{CollectionRunner, FactsConfig, NewPlan, StagingStore, DEFAULT_CONFIG_PATH};
use netfacts_inventory::{parse_oui_registry, InventorySnapshot, InventoryStore, MemoryInventory};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Network facts collector
#[derive(Parser, Debug)]
#[command(name = "netfacts")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a collection plan once
    Run {
        /// Plan definition (TOML)
        #[arg(short = 'p', long)]
        plan: PathBuf,

        /// Inventory snapshot (JSON), updated in place unless detect-only
        #[arg(short = 'i', long)]
        inventory: PathBuf,

        /// Directory holding one `<device>.json` capture per device
        #[arg(long)]
        captures: PathBuf,

        /// Record entries without applying them
        #[arg(long)]
        detect_only: bool,

        /// Write the report here instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Validate the configuration file
    CheckConfig,

    /// Load MAC vendors from an IEEE oui.txt file into the inventory
    SyncOui {
        /// Path to oui.txt
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Inventory snapshot (JSON), updated in place
        #[arg(short = 'i', long)]
        inventory: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match FactsConfig::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("netfacts: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);

    match dispatch(args.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = format!("{:#}", e), "netfacts: exiting with error");
            ExitCode::FAILURE
        }
    }
}

/// Initialize structured logging. `RUST_LOG` overrides the configured level.
fn init_logging(config: &FactsConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(true))
            .init();
    }
}

async fn dispatch(command: Command, config: FactsConfig) -> anyhow::Result<()> {
    match command {
        Command::Run {
            plan,
            inventory,
            captures,
            detect_only,
            output,
        } => run_plan(config, &plan, &inventory, captures, detect_only, output.as_deref()).await,
        Command::CheckConfig => {
            config.validate()?;
            config.interfaces_regex()?;
            info!("Configuration is valid");
            Ok(())
        }
        Command::SyncOui { file, inventory } => sync_oui(&file, &inventory).await,
    }
}

async fn run_plan(
    config: FactsConfig,
    plan_path: &Path,
    inventory_path: &Path,
    captures: PathBuf,
    detect_only: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    config.validate()?;

    let text = std::fs::read_to_string(plan_path)
        .with_context(|| format!("reading plan {}", plan_path.display()))?;
    let mut definition: NewPlan =
        toml::from_str(&text).with_context(|| format!("parsing plan {}", plan_path.display()))?;
    if detect_only {
        definition = definition.detect_only();
    }
    if !definition.enabled {
        bail!("plan '{}' is disabled", definition.name);
    }

    let inventory = Arc::new(load_inventory(inventory_path)?);
    let staging = Arc::new(StagingStore::new());
    let factory = DriverFactory::new(Arc::new(ReplayConnector::new(captures)));
    let runner = CollectionRunner::new(
        Arc::clone(&inventory) as Arc<dyn InventoryStore>,
        Arc::clone(&staging),
        factory,
        Arc::new(config),
    );

    let plan = staging.create_plan(definition)?;
    info!(plan = %plan.name, collector = %plan.collector_type, "Running plan");
    let outcome = runner.run(plan.id).await?;

    let json = serde_json::to_string_pretty(&outcome)?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing report {}", path.display()))?,
        None => println!("{}", json),
    }

    if !plan.detect_only {
        save_inventory(inventory_path, &inventory)?;
    }
    info!(
        report = %outcome.report.id,
        status = %outcome.report.status,
        entries = outcome.entries.len(),
        "Done"
    );
    Ok(())
}

async fn sync_oui(file: &Path, inventory_path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let inventory = load_inventory(inventory_path)?;

    let mut added = 0;
    for vendor in parse_oui_registry(&text) {
        if inventory.register_vendor(vendor).await? {
            added += 1;
        }
    }

    save_inventory(inventory_path, &inventory)?;
    info!(added, "MAC vendors synchronized");
    Ok(())
}

fn load_inventory(path: &Path) -> anyhow::Result<MemoryInventory> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading inventory {}", path.display()))?;
    let snapshot: InventorySnapshot = serde_json::from_str(&text)
        .with_context(|| format!("parsing inventory {}", path.display()))?;
    Ok(MemoryInventory::from_snapshot(snapshot))
}

fn save_inventory(path: &Path, inventory: &MemoryInventory) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&inventory.snapshot())?;
    std::fs::write(path, json).with_context(|| format!("writing inventory {}", path.display()))
}
