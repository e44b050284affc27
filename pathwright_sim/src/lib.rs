// pathwright_sim: navigation library for autonomous agents on a navmesh.
//
// This crate contains all navigation logic: the area graph loaded from a
// navmesh, A* route planning over it, goal arbitration between competing
// objectives, and the locomotion controller that turns a route into
// per-tick movement commands with stuck recovery. It has no engine
// dependencies; a host implements `WorldView`, calls `Navigator::tick()`
// once per frame per agent, and applies the returned `MoveCommand`.
//
// Module overview:
// - `navigator.rs`:   Navigator: per-agent state and the tick entry point.
// - `nav.rs`:         NavMesh / Area / Ladder: the area graph, spatial queries.
// - `pathfinding.rs`: SearchGraph / PathSolver traits and the A* solver.
// - `planner.rs`:     PathPlanner: (start, goal) area requests into a Route.
// - `route.rs`:       Route cursor and the bounded visited-area history.
// - `goal.rs`:        Goal producers (capture, positional, explore) + arbiter.
// - `locomotion.rs`:  Route following, stuck escalation, jumps, view steering.
// - `command.rs`:     MoveCommand: the navigator's only output to the host.
// - `event.rs`:       Narrative NavEvents describing what was decided.
// - `world.rs`:       WorldView trait + owned WorldSnapshot.
// - `config.rs`:      NavConfig: every tunable threshold, loadable from JSON.
// - `error.rs`:       MeshError / PlanError / ConfigError.
// - `types.rs`:       Vec3, AreaId and the other small ids, angle helpers.
//
// The library is single-threaded and synchronous. All cross-tick state
// lives in `Navigator` values, so any number of agents can share one
// immutable `NavMesh`.

pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod goal;
pub mod locomotion;
pub mod nav;
pub mod navigator;
pub mod pathfinding;
pub mod planner;
pub mod route;
pub mod types;
pub mod world;

pub use command::{Buttons, MoveCommand, ViewAngles};
pub use config::NavConfig;
pub use error::{ConfigError, MeshError, PlanError};
pub use event::{NavEvent, NavEventKind};
pub use nav::NavMesh;
pub use navigator::{NavStatus, Navigator, TickOutput};
pub use types::{AreaId, Vec3};
pub use world::{AgentState, WorldSnapshot, WorldView};
