//! Swarm mission simulator.
//!
//! Loads a built-in scenario or a JSON mission file, synthesizes every
//! trajectory, runs offline conflict analysis, optionally applies the
//! planned holds and replays the batch with real-time separation checks.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use swarm_cli::sim::{
    crossing_mission, formation_mission, load_mission_file, run_playback, PlaybackReport,
    Scenario,
};
use swarm_cli::Config;
use swarm_core::{
    plan_holds, CollisionLog, ConflictEngine, ConflictEvent, ConflictSummary, Fleet,
    FormationConfig, HoldInstruction,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Available built-in scenarios
#[derive(Debug, Clone, ValueEnum)]
enum ScenarioType {
    /// Four drones from a 2x2 grid flying squares in separate quadrants
    Formation,
    /// Two drones flying head-on with a small lateral offset
    Crossing,
}

/// Drone swarm trajectory and conflict simulator
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Built-in scenario to simulate
    #[arg(long, value_enum, default_value = "formation")]
    scenario: ScenarioType,

    /// JSON mission file (agent id -> waypoints); overrides --scenario
    #[arg(long)]
    mission: Option<PathBuf>,

    /// Base latitude
    #[arg(long, default_value_t = 24.0)]
    lat: f64,

    /// Base longitude
    #[arg(long, default_value_t = 121.0)]
    lon: f64,

    /// Safety distance in meters
    #[arg(long)]
    safety_distance: Option<f64>,

    /// Critical distance in meters
    #[arg(long)]
    critical_distance: Option<f64>,

    /// Warning distance in meters
    #[arg(long)]
    warning_distance: Option<f64>,

    /// Cruise speed in m/s
    #[arg(long)]
    cruise_speed: Option<f64>,

    /// Half length of the crossing legs in meters
    #[arg(long, default_value_t = 60.0)]
    crossing_half_length: f64,

    /// Lateral offset between the crossing legs in meters
    #[arg(long, default_value_t = 4.0)]
    crossing_offset: f64,

    /// Apply planned holds before playback
    #[arg(long)]
    apply_holds: bool,

    /// Playback step in seconds
    #[arg(long, default_value_t = 0.1)]
    step: f64,

    /// Write the collision log to this JSON file
    #[arg(long)]
    export_log: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    scenario: &'a str,
    generated_at: chrono::DateTime<chrono::Utc>,
    agents: usize,
    conflicts: ConflictSummary,
    /// Earliest conflict across all pairs
    first_conflict: Option<&'a ConflictEvent>,
    holds: &'a [HoldInstruction],
    playback: PlaybackReport,
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("swarm_cli=info,swarm_core=info"))
        .context("Invalid log filter")?;
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json)?;

    let mut config = Config::from_env();
    if let Some(v) = args.safety_distance {
        config.safety.safety_distance = v;
    }
    if let Some(v) = args.critical_distance {
        config.safety.critical_distance = v;
    }
    if let Some(v) = args.warning_distance {
        config.safety.warning_distance = v;
    }
    if let Some(v) = args.cruise_speed {
        config.profile.cruise_speed_mps = v;
    }
    config
        .safety
        .validate()
        .context("Invalid safety configuration")?;

    let scenario: Scenario = match &args.mission {
        Some(path) => load_mission_file(path)?,
        None => match args.scenario {
            ScenarioType::Formation => {
                formation_mission(args.lat, args.lon, &FormationConfig::default())
            }
            ScenarioType::Crossing => crossing_mission(
                args.lat,
                args.lon,
                args.crossing_half_length,
                args.crossing_offset,
            ),
        },
    };
    tracing::info!(
        "Scenario {}: {} agents",
        scenario.name,
        scenario.agent_count()
    );

    let mut fleet = Fleet::new(config.profile.clone()).context("Invalid flight profile")?;
    if args.mission.is_none() {
        fleet.set_origin(args.lat, args.lon);
    }
    for (id, waypoints) in scenario.missions.iter().cloned() {
        fleet
            .load_mission(id.as_str(), waypoints)
            .with_context(|| format!("Failed to load mission for {id}"))?;
    }

    let mut engine = ConflictEngine::new(config.safety.clone());
    let conflicts = fleet.analyze(&engine);
    let holds = plan_holds(&conflicts);
    for hold in &holds {
        tracing::info!(
            "{} should hold {:.1}s after waypoint {} (t={:.1}s)",
            hold.agent_id,
            hold.duration_s,
            hold.waypoint_index,
            hold.start_time
        );
    }

    let mut log = CollisionLog::new();
    for conflict in &conflicts {
        log.record_conflict(conflict);
    }

    if args.apply_holds {
        fleet.apply_holds(&holds)?;
    }
    let playback = run_playback(&mut fleet, &mut engine, args.step, &mut log);

    let summary = RunSummary {
        scenario: &scenario.name,
        generated_at: chrono::Utc::now(),
        agents: fleet.len(),
        conflicts: engine.summary(&conflicts),
        first_conflict: conflicts.iter().min_by(|a, b| a.time.total_cmp(&b.time)),
        holds: &holds,
        playback,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(path) = &args.export_log {
        log.export_to_path(path)
            .with_context(|| format!("Failed to export collision log to {}", path.display()))?;
    }

    Ok(())
}
