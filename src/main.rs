use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use colony_directives::config::ColonyDirectivesConfig;
use colony_directives::directive_lifecycle::{CycleHealth, CycleReport, DirectiveEngine, Services};
use colony_directives::observability::{engine_metrics, EngineStats};
use colony_directives::persistence::MemoryStore;
use colony_directives::telemetry::init_telemetry;
use colony_directives::world::sim::{Alert, LogNotifier, RecordingProcessTable, Scenario};

#[derive(Parser)]
#[command(name = "colony-directives")]
#[command(about = "Directive lifecycle and colony assignment engine")]
#[command(long_about = "Runs directive scenarios tick by tick: markers are wrapped into directives, \
                       bound to colonies, relocated, suspended and retired. Durable records can be \
                       persisted between runs and inspected.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file for a number of ticks
    Simulate {
        /// Scenario JSON file
        #[arg(long)]
        scenario: PathBuf,
        /// Number of cycles to run
        #[arg(long, default_value = "1")]
        ticks: u64,
        /// Durable record file to load before and save after the run [default: storage.memory_path]
        #[arg(long)]
        memory: Option<PathBuf>,
        /// Print cycle reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the durable records stored in a file
    Inspect {
        /// Durable record file
        #[arg(long)]
        memory: PathBuf,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct SimulationOutput {
    reports: Vec<CycleReport>,
    alerts: Vec<Alert>,
    active: Vec<String>,
    metrics: EngineStats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match colony_directives::config::config() {
        Ok(config) => config.clone(),
        Err(e) => {
            eprintln!("⚠️  {e}, falling back to default configuration");
            ColonyDirectivesConfig::default()
        }
    };
    init_telemetry(config.observability.json_logs, &config.observability.log_level)?;

    match cli.command {
        Commands::Simulate {
            scenario,
            ticks,
            memory,
            json,
        } => simulate_command(&config, scenario, ticks, memory, json),
        Commands::Inspect { memory, json } => inspect_command(memory, json),
    }
}

fn simulate_command(
    config: &ColonyDirectivesConfig,
    scenario_path: PathBuf,
    ticks: u64,
    memory_path: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let scenario = Scenario::load(&scenario_path)?;

    let memory_path = memory_path.unwrap_or_else(|| PathBuf::from(&config.storage.memory_path));
    let mut store = MemoryStore::load_from_file(&memory_path)
        .with_context(|| format!("Failed to load durable records from {}", memory_path.display()))?;
    scenario.seed_memory(&mut store);

    let mut world = scenario.world();
    let oracle = scenario.oracle();
    let mut processes = RecordingProcessTable::new();
    let mut notifier = LogNotifier::new();
    let mut engine = DirectiveEngine::new(scenario.colonies(), config.engine.assignment_settings());

    let mut reports = Vec::new();
    for _ in 0..ticks {
        let health = CycleHealth::new();
        let mut services = Services {
            world: &mut world,
            memory: &mut store,
            oracle: &oracle,
            processes: &mut processes,
            notifier: &mut notifier,
        };
        reports.push(engine.run_cycle(&mut services, &health));
        world.advance();
    }

    if config.storage.autosave {
        store
            .save_to_file(&memory_path)
            .with_context(|| format!("Failed to save durable records to {}", memory_path.display()))?;
    }

    let output = SimulationOutput {
        reports,
        alerts: notifier.drain(),
        active: engine.directives().map(|d| d.name().to_string()).collect(),
        metrics: engine_metrics().get_stats(),
    };
    engine_metrics().log_stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("🗺️  Scenario {} ({} ticks)", scenario_path.display(), ticks);
    for report in &output.reports {
        println!(
            "  tick {:>6}: {} refreshed, {} constructed, {} removed, {} suspended, {} deferred",
            report.tick,
            report.refreshed.len(),
            report.constructed.len(),
            report.removed.len(),
            report.suspended.len(),
            report.deferred.len()
        );
    }
    println!();
    println!("📌 Active directives:");
    for directive in engine.directives() {
        println!(
            "  {} {} → {} ({} work units)",
            directive.name(),
            directive.pos(),
            directive.colony().unwrap_or("-"),
            directive.work_units().len()
        );
    }
    if !output.alerts.is_empty() {
        println!();
        println!("🚨 Alerts:");
        for alert in &output.alerts {
            println!("  [{:?}] {}: {}", alert.priority, alert.room, alert.message);
        }
    }
    Ok(())
}

fn inspect_command(memory_path: PathBuf, json: bool) -> Result<()> {
    let store = MemoryStore::load_from_file(&memory_path)
        .with_context(|| format!("Failed to load durable records from {}", memory_path.display()))?;

    if json {
        let records: std::collections::BTreeMap<_, _> = store.iter().collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("📦 {} durable records in {}", store.len(), memory_path.display());
    for (name, record) in store.iter() {
        println!(
            "  {name}: colony={} created={} expiration={} persistent={}",
            record.colony.as_deref().unwrap_or("-"),
            record.created.map_or("-".to_string(), |t| t.to_string()),
            record.expiration.map_or("-".to_string(), |t| t.to_string()),
            record.persistent
        );
    }
    Ok(())
}
