// Read-only view of the live world, as the navigator needs it.
//
// The navigator never owns world state. Each tick it is handed something
// implementing `WorldView` and reads the clock, the level name, the agent's
// own state, other actors, objective flags, and control points from it. A
// host wires this trait to whatever entity system it has; `WorldSnapshot`
// is the owned, serializable implementation used by tests and the harness.
//
// Positions are world-space `Vec3`s with Z up; yaw is in degrees (see
// `types.rs`). Time is seconds as `f64` so long-running hosts don't lose
// timer resolution.
//
// See also: `goal.rs` which reads flags, control points, and actors to
// produce goal candidates, `navigator.rs` which reads the agent each tick.

use crate::types::{ActorId, Team, Vec3};
use serde::{Deserialize, Serialize};

/// The controlled agent's own state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub id: ActorId,
    pub position: Vec3,
    /// Current facing, in degrees.
    pub yaw: f32,
    pub team: Team,
    pub alive: bool,
    /// Incremented by the host every time the agent respawns.
    pub life_epoch: u32,
    pub on_ground: bool,
    /// False while the host says a jump would be wasted or harmful
    /// (e.g. the agent is channeling an action).
    pub can_jump: bool,
    /// True while the agent is firing; the navigator leaves the view alone.
    pub attacking: bool,
}

/// Another actor in the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorState {
    pub id: ActorId,
    pub team: Team,
    pub position: Vec3,
    pub alive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagStatus {
    Home,
    Carried,
    Dropped,
}

/// A capturable team flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlagState {
    /// Team that owns (defends) the flag.
    pub team: Team,
    pub position: Vec3,
    pub status: FlagStatus,
    pub carrier: Option<ActorId>,
}

/// A capturable control point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub position: Vec3,
    /// Current owner, or `None` while neutral.
    pub owner: Option<Team>,
    pub locked: bool,
    /// Teams currently allowed to capture this point.
    pub capturable_by: Vec<Team>,
}

impl ControlPoint {
    pub fn can_capture(&self, team: Team) -> bool {
        self.capturable_by.contains(&team)
    }
}

/// Everything the navigator reads from the world.
pub trait WorldView {
    /// Current world time in seconds.
    fn now(&self) -> f64;
    fn level_name(&self) -> &str;
    /// The controlled agent, or `None` when it isn't present.
    fn agent(&self) -> Option<&AgentState>;
    /// All other actors (may include the agent; it is filtered by id).
    fn actors(&self) -> &[ActorState];
    fn flags(&self) -> &[FlagState];
    fn control_points(&self) -> &[ControlPoint];
}

/// Owned world state for tests and headless hosts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub time: f64,
    pub level_name: String,
    pub agent: Option<AgentState>,
    #[serde(default)]
    pub actors: Vec<ActorState>,
    #[serde(default)]
    pub flags: Vec<FlagState>,
    #[serde(default)]
    pub control_points: Vec<ControlPoint>,
}

impl WorldSnapshot {
    /// A world containing only a live, grounded agent at `position`.
    pub fn with_agent(level_name: impl Into<String>, position: Vec3) -> Self {
        Self {
            time: 0.0,
            level_name: level_name.into(),
            agent: Some(AgentState {
                id: ActorId(1),
                position,
                yaw: 0.0,
                team: Team(2),
                alive: true,
                life_epoch: 0,
                on_ground: true,
                can_jump: true,
                attacking: false,
            }),
            actors: Vec::new(),
            flags: Vec::new(),
            control_points: Vec::new(),
        }
    }
}

impl WorldView for WorldSnapshot {
    fn now(&self) -> f64 {
        self.time
    }

    fn level_name(&self) -> &str {
        &self.level_name
    }

    fn agent(&self) -> Option<&AgentState> {
        self.agent.as_ref()
    }

    fn actors(&self) -> &[ActorState] {
        &self.actors
    }

    fn flags(&self) -> &[FlagState] {
        &self.flags
    }

    fn control_points(&self) -> &[ControlPoint] {
        &self.control_points
    }
}
