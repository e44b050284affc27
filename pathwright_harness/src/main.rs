// CLI entry point for the pathwright headless harness.
//
// Loads a navmesh (or builds a flat grid when none is given), spawns point
// body agents spread across it, and ticks one `Navigator` per agent for a
// fixed number of ticks. Each tick every agent's command is integrated onto
// its body (see `world.rs`). At the end a per-agent summary is logged.
// Optionally every `NavEvent` is written out as JSON lines.
//
// Usage:
//   pathwright-harness [OPTIONS]
//     --mesh <PATH>      Navmesh JSON (default: built-in 12x12 grid)
//     --config <PATH>    NavConfig JSON (default: built-in defaults)
//     --ticks <N>        Ticks to run (default: 1200)
//     --dt <SECONDS>     Seconds per tick (default: 0.05)
//     --agents <N>       Number of agents (default: 2)
//     --level <NAME>     Level name, selects the game mode (default: harness)
//     --events <PATH>    Write events as JSON lines

mod summary;
mod world;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use pathwright_sim::{AreaId, NavConfig, NavEvent, NavMesh, Navigator, Vec3};
use serde::Serialize;
use summary::AgentSummary;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use world::HarnessWorld;

const GRID_SIDE: u32 = 12;
const GRID_CELL: f32 = 128.0;

struct HarnessOptions {
    mesh: Option<PathBuf>,
    config: Option<PathBuf>,
    ticks: u32,
    dt: f64,
    agents: usize,
    level: String,
    events: Option<PathBuf>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            mesh: None,
            config: None,
            ticks: 1200,
            dt: 0.05,
            agents: 2,
            level: "harness".to_string(),
            events: None,
        }
    }
}

/// One line of the `--events` output.
#[derive(Serialize)]
struct EventLine<'a> {
    agent: usize,
    #[serde(flatten)]
    event: &'a NavEvent,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let options = parse_args();
    if let Err(e) = run(&options) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(options: &HarnessOptions) -> Result<(), String> {
    let mesh = load_mesh(options)?;
    let config = match &options.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            NavConfig::from_json(&json).map_err(|e| format!("bad config: {e}"))?
        }
        None => NavConfig::default(),
    };
    if mesh.is_empty() {
        return Err("mesh has no areas".to_string());
    }

    let starts = spawn_points(&mesh, options.agents);
    let mut world = HarnessWorld::new(options.level.clone(), &starts);
    let mut navigators: Vec<Navigator> = starts.iter().map(|_| Navigator::new(&config)).collect();
    let mut summaries: Vec<AgentSummary> =
        starts.iter().map(|_| AgentSummary::default()).collect();
    let mut event_log = match &options.events {
        Some(path) => Some(BufWriter::new(
            File::create(path).map_err(|e| format!("failed to create {}: {e}", path.display()))?,
        )),
        None => None,
    };

    info!(
        map = %mesh.map_name,
        areas = mesh.area_count(),
        agents = starts.len(),
        ticks = options.ticks,
        "harness_start"
    );

    let dt = options.dt as f32;
    for tick in 0..options.ticks {
        world.time = f64::from(tick) * options.dt;
        world.refresh_actors();
        for (index, (nav, summary)) in navigators.iter_mut().zip(&mut summaries).enumerate() {
            let out = nav.tick(&mesh, &world.view(index), &config);
            summary.record_events(&out.events);
            if let Some(log) = event_log.as_mut() {
                for event in &out.events {
                    let line = serde_json::to_string(&EventLine {
                        agent: index,
                        event,
                    })
                    .map_err(|e| e.to_string())?;
                    writeln!(log, "{line}").map_err(|e| e.to_string())?;
                }
            }
            summary.distance += world.apply(index, &out.command, &mesh, &config.mesh, dt);
            let here = world.agents[index].position;
            summary.record_area(
                mesh.best_area_from_xyz(here, &config.mesh)
                    .map_or(AreaId::NONE, |a| a.id),
            );
        }
    }
    if let Some(mut log) = event_log {
        log.flush().map_err(|e| e.to_string())?;
    }

    for (index, summary) in summaries.iter().enumerate() {
        info!(
            agent = index,
            areas_visited = summary.areas.len(),
            routes_planned = summary.routes_planned,
            routes_completed = summary.routes_completed,
            plan_failures = summary.plan_failures,
            replans = summary.replans,
            jumps = summary.jumps,
            max_stuck_phase = summary.max_phase,
            distance = summary.distance,
            "agent_summary"
        );
        if summary.routes_completed == 0 {
            warn!(agent = index, "agent never completed a route");
        }
    }
    Ok(())
}

fn load_mesh(options: &HarnessOptions) -> Result<NavMesh, String> {
    match &options.mesh {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            NavMesh::from_json(&json).map_err(|e| format!("bad mesh: {e}"))
        }
        None => NavMesh::grid("grid", GRID_SIDE, GRID_SIDE, GRID_CELL).map_err(|e| e.to_string()),
    }
}

/// Area centers spread evenly through the mesh's area list.
fn spawn_points(mesh: &NavMesh, agents: usize) -> Vec<Vec3> {
    let areas = mesh.areas();
    let stride = (areas.len() / agents.max(1)).max(1);
    (0..agents)
        .map(|i| areas[(i * stride) % areas.len()].center())
        .collect()
}

/// Parse command-line arguments. Simple `std::env::args()` matching.
fn parse_args() -> HarnessOptions {
    let mut options = HarnessOptions::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--mesh" => {
                i += 1;
                options.mesh = Some(args.get(i).map(PathBuf::from).unwrap_or_else(|| {
                    eprintln!("--mesh requires a path");
                    std::process::exit(1);
                }));
            }
            "--config" => {
                i += 1;
                options.config = Some(args.get(i).map(PathBuf::from).unwrap_or_else(|| {
                    eprintln!("--config requires a path");
                    std::process::exit(1);
                }));
            }
            "--ticks" => {
                i += 1;
                options.ticks = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--ticks requires a valid number");
                    std::process::exit(1);
                });
            }
            "--dt" => {
                i += 1;
                options.dt = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .filter(|dt: &f64| *dt > 0.0 && dt.is_finite())
                    .unwrap_or_else(|| {
                        eprintln!("--dt requires a positive number of seconds");
                        std::process::exit(1);
                    });
            }
            "--agents" => {
                i += 1;
                options.agents = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .filter(|n: &usize| *n > 0)
                    .unwrap_or_else(|| {
                        eprintln!("--agents requires a positive number");
                        std::process::exit(1);
                    });
            }
            "--level" => {
                i += 1;
                options.level = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--level requires a value");
                    std::process::exit(1);
                });
            }
            "--events" => {
                i += 1;
                options.events = Some(args.get(i).map(PathBuf::from).unwrap_or_else(|| {
                    eprintln!("--events requires a path");
                    std::process::exit(1);
                }));
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    options
}

fn print_usage() {
    println!("Usage: pathwright-harness [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --mesh <PATH>      Navmesh JSON (default: built-in 12x12 grid)");
    println!("  --config <PATH>    NavConfig JSON (default: built-in defaults)");
    println!("  --ticks <N>        Ticks to run (default: 1200)");
    println!("  --dt <SECONDS>     Seconds per tick (default: 0.05)");
    println!("  --agents <N>       Number of agents (default: 2)");
    println!("  --level <NAME>     Level name, selects the game mode (default: harness)");
    println!("  --events <PATH>    Write events as JSON lines");
    println!("  --help, -h         Show this help");
}
