// Goal arbitration: decide where the agent should be heading this tick.
//
// Three independent producers each propose at most one target point:
// - Capture: the game objective (flags in CTF, control points in CP/KOTH),
//   chosen by the game mode encoded in the level name prefix.
// - Positional: a point on a slowly rotating orbit around the nearest live
//   opponent, so the agent keeps shifting its angle of approach.
// - Explore: the center of the farthest area the agent hasn't recently
//   visited.
//
// `arbitrate()` keeps the valid candidate with the lowest configured
// priority; equal priorities resolve Capture > Positional > Explore. The
// result is a pure function of world state, mesh, visited history, and
// config, so two calls with the same inputs always agree.
//
// The anti-oscillation latches (don't re-plan an exploration goal that is
// already being walked, rate-limit positional retargets) need cross-tick
// state and live on the navigator, not here.
//
// See also: `world.rs` for the inputs, `nav.rs` for exploration goal
// selection, `navigator.rs` which turns the winner into a route.

use crate::config::{GoalPolicy, NavConfig, OrbitParams};
use crate::nav::NavMesh;
use crate::route::VisitedAreas;
use crate::types::{AreaId, Vec3};
use crate::world::{ActorState, AgentState, ControlPoint, FlagState, FlagStatus, WorldView};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// Which producer a goal came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalKind {
    #[default]
    None,
    Capture,
    Positional,
    Explore,
}

impl GoalKind {
    /// Tie-break rank among equal priorities (lower wins).
    fn tie_rank(self) -> u8 {
        match self {
            GoalKind::Capture => 0,
            GoalKind::Positional => 1,
            GoalKind::Explore => 2,
            GoalKind::None => u8::MAX,
        }
    }
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GoalKind::None => "none",
            GoalKind::Capture => "capture",
            GoalKind::Positional => "positional",
            GoalKind::Explore => "explore",
        };
        f.write_str(name)
    }
}

/// One producer's proposal for this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GoalCandidate {
    pub kind: GoalKind,
    /// `None` when the producer has nothing to propose.
    pub target: Option<Vec3>,
}

impl GoalCandidate {
    pub fn none() -> Self {
        Self::default()
    }

    fn from_target(kind: GoalKind, target: Option<Vec3>) -> Self {
        match target {
            Some(point) => Self {
                kind,
                target: Some(point),
            },
            None => Self::none(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.kind != GoalKind::None && self.target.is_some()
    }
}

// ---------------------------------------------------------------------------
// Game mode
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Unknown,
    Ctf,
    Cp,
    Pl,
    Plr,
    Koth,
}

impl GameMode {
    /// Mode from the level name prefix before the first `_`
    /// (`ctf_2fort` -> `Ctf`). The whole name is the prefix when there is
    /// no underscore.
    pub fn from_level_name(level: &str) -> Self {
        let prefix = level.split('_').next().unwrap_or(level);
        match prefix {
            "ctf" => GameMode::Ctf,
            "cp" => GameMode::Cp,
            "pl" => GameMode::Pl,
            "plr" => GameMode::Plr,
            "koth" => GameMode::Koth,
            _ => GameMode::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// Producers
// ---------------------------------------------------------------------------

/// Objective target for the current game mode, if any.
pub fn capture_target(world: &dyn WorldView, agent: &AgentState) -> Option<Vec3> {
    match GameMode::from_level_name(world.level_name()) {
        GameMode::Ctf => flag_target(world.flags(), agent),
        GameMode::Koth | GameMode::Cp => control_point_target(world.control_points(), agent),
        GameMode::Pl | GameMode::Plr | GameMode::Unknown => None,
    }
}

/// Capture-the-flag rules. Both flags must exist.
/// 1. Our flag is carried or lying dropped: go recover it.
/// 2. Otherwise, if we aren't carrying the enemy flag: go get it.
/// 3. If we are carrying it and our flag is home: bring it back there.
pub fn flag_target(flags: &[FlagState], agent: &AgentState) -> Option<Vec3> {
    let own = flags.iter().find(|f| f.team == agent.team)?;
    let enemy = flags.iter().find(|f| f.team != agent.team)?;

    if own.carrier.is_some() || own.status == FlagStatus::Dropped {
        Some(own.position)
    } else if enemy.carrier != Some(agent.id) {
        Some(enemy.position)
    } else if own.status == FlagStatus::Home {
        Some(own.position)
    } else {
        None
    }
}

/// Nearest point (in the plane) that is unlocked, capturable by the
/// agent's team, and not already owned by it.
pub fn control_point_target(points: &[ControlPoint], agent: &AgentState) -> Option<Vec3> {
    points
        .iter()
        .filter(|cp| !cp.locked && cp.can_capture(agent.team) && cp.owner != Some(agent.team))
        .map(|cp| (cp.position, agent.position.distance_squared_2d(cp.position)))
        .fold(None::<(Vec3, f32)>, |best, (pos, d2)| match best {
            Some((_, best_d2)) if best_d2 <= d2 => best,
            _ => Some((pos, d2)),
        })
        .map(|(pos, _)| pos)
}

/// Orbit point around the nearest live opponent. The orbit angle advances
/// by `step_angle` every `step_time` seconds of world time.
pub fn positional_target(
    actors: &[ActorState],
    agent: &AgentState,
    now: f64,
    orbit: &OrbitParams,
) -> Option<Vec3> {
    let enemy = actors
        .iter()
        .filter(|a| a.id != agent.id && a.team != agent.team && a.alive)
        .map(|a| (a, agent.position.distance_squared_2d(a.position)))
        .fold(None::<(&ActorState, f32)>, |best, (a, d2)| match best {
            Some((_, best_d2)) if best_d2 <= d2 => best,
            _ => Some((a, d2)),
        })
        .map(|(a, _)| a)?;

    let step = (now / f64::from(orbit.step_time)).floor();
    let angle = (step * f64::from(orbit.step_angle)) as f32;
    Some(Vec3::new(
        enemy.position.x + angle.cos() * orbit.radius,
        enemy.position.y + angle.sin() * orbit.radius,
        enemy.position.z,
    ))
}

/// Center of the exploration goal picked from the agent's area (or the
/// nearest area in the plane when it isn't standing in one).
pub fn explore_target(
    mesh: &NavMesh,
    agent: &AgentState,
    from_area: AreaId,
    visited: &VisitedAreas,
    config: &NavConfig,
) -> Option<Vec3> {
    let from = if from_area.is_some() {
        from_area
    } else {
        mesh.nearest_area_2d(agent.position, &config.mesh)?.id
    };
    let goal = mesh.pick_exploration_goal(from, agent.position, visited);
    mesh.area_by_id(goal).map(|area| area.center())
}

// ---------------------------------------------------------------------------
// Arbitration
// ---------------------------------------------------------------------------

/// Everything the producers read for one tick.
pub struct GoalInputs<'a> {
    pub world: &'a dyn WorldView,
    pub mesh: &'a NavMesh,
    pub agent: &'a AgentState,
    /// Area the agent is standing in, or `AreaId::NONE`.
    pub from_area: AreaId,
    pub visited: &'a VisitedAreas,
    pub config: &'a NavConfig,
}

/// Run every enabled producer. Disabled producers report no candidate.
pub fn propose(inputs: &GoalInputs<'_>) -> [GoalCandidate; 3] {
    let goals = &inputs.config.goals;
    let capture = if goals.capture.enabled {
        GoalCandidate::from_target(GoalKind::Capture, capture_target(inputs.world, inputs.agent))
    } else {
        GoalCandidate::none()
    };
    let positional = if goals.positional.enabled {
        GoalCandidate::from_target(
            GoalKind::Positional,
            positional_target(
                inputs.world.actors(),
                inputs.agent,
                inputs.world.now(),
                &inputs.config.positional,
            ),
        )
    } else {
        GoalCandidate::none()
    };
    let explore = if goals.explore.enabled {
        GoalCandidate::from_target(
            GoalKind::Explore,
            explore_target(
                inputs.mesh,
                inputs.agent,
                inputs.from_area,
                inputs.visited,
                inputs.config,
            ),
        )
    } else {
        GoalCandidate::none()
    };
    [capture, positional, explore]
}

/// Pick the valid candidate with the lowest priority, ties broken by kind.
pub fn arbitrate(candidates: &[GoalCandidate], policy: &GoalPolicy) -> GoalCandidate {
    candidates
        .iter()
        .filter(|c| c.is_valid())
        .min_by_key(|c| (priority_of(c.kind, policy), c.kind.tie_rank()))
        .copied()
        .unwrap_or_default()
}

fn priority_of(kind: GoalKind, policy: &GoalPolicy) -> i32 {
    match kind {
        GoalKind::Capture => policy.capture.priority,
        GoalKind::Positional => policy.positional.priority,
        GoalKind::Explore => policy.explore.priority,
        GoalKind::None => i32::MAX,
    }
}

/// Propose and arbitrate in one step.
pub fn pick_goal(inputs: &GoalInputs<'_>) -> GoalCandidate {
    arbitrate(&propose(inputs), &inputs.config.goals)
}
