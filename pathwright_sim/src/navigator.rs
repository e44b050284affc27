// Per-agent navigator: the once-per-tick entry point.
//
// A `Navigator` owns every piece of cross-tick state one agent needs (its
// route, planner, locomotion timers, and the arbiter's latches) and borrows
// everything else. Many navigators can share one `NavMesh` and one
// `WorldView`; each host agent gets its own navigator.
//
// `tick()` runs, in order:
//   1. Gate: navigation disabled, agent missing, or agent dead -> clear
//      everything and return an idle command.
//   2. Locate the agent on the mesh.
//   3. Arbitrate a goal among the enabled producers (`goal.rs`).
//   4. Apply the latches: an exploration goal already being walked is not
//      re-picked, and positional goals are not re-targeted more often than
//      the orbit cooldown allows.
//   5. Resolve the goal point to an area and plan when that area differs
//      from the active route's goal and from the agent's own area.
//   6. Hand the route to the locomotion controller for this tick's command.
//
// Everything the navigator decided is reported as `NavEvent`s alongside the
// command. A failed plan leaves the route inactive so the next tick tries
// again; nothing in the tick path is fatal.
//
// See also: `goal.rs`, `planner.rs`, `locomotion.rs`, `event.rs`.

use crate::command::MoveCommand;
use crate::config::NavConfig;
use crate::event::{ClearReason, EventSink, NavEvent, NavEventKind};
use crate::goal::{GoalInputs, GoalKind, pick_goal};
use crate::locomotion::{FollowContext, LocomotionController, StuckPhase};
use crate::nav::NavMesh;
use crate::planner::PathPlanner;
use crate::route::Route;
use crate::types::{AreaId, Vec3};
use crate::world::WorldView;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What one tick produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickOutput {
    pub command: MoveCommand,
    pub events: Vec<NavEvent>,
}

/// Snapshot of a navigator's state for debug overlays.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavStatus {
    pub goal_kind: GoalKind,
    pub goal_area: AreaId,
    pub next_area: Option<AreaId>,
    pub cursor: usize,
    pub path_len: usize,
    pub phase: StuckPhase,
}

#[derive(Debug)]
pub struct Navigator {
    route: Route,
    planner: PathPlanner,
    locomotion: LocomotionController,
    /// Winning producer on the previous tick.
    goal_kind: GoalKind,
    /// Exploration goal currently being walked; suppresses re-picking.
    active_explore_goal: AreaId,
    last_positional_retarget: Option<f64>,
}

impl Navigator {
    pub fn new(config: &NavConfig) -> Self {
        Self::with_planner(config, PathPlanner::new())
    }

    /// A navigator using a custom planner (e.g. a non-default solver).
    pub fn with_planner(config: &NavConfig, planner: PathPlanner) -> Self {
        Self {
            route: Route::new(config.visited_capacity),
            planner,
            locomotion: LocomotionController::new(),
            goal_kind: GoalKind::None,
            active_explore_goal: AreaId::NONE,
            last_positional_retarget: None,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn planner(&self) -> &PathPlanner {
        &self.planner
    }

    pub fn locomotion(&self) -> &LocomotionController {
        &self.locomotion
    }

    pub fn debug_status(&self) -> NavStatus {
        NavStatus {
            goal_kind: self.goal_kind,
            goal_area: self.route.goal,
            next_area: self.route.next(),
            cursor: self.route.cursor,
            path_len: self.route.path.len(),
            phase: self.locomotion.phase(),
        }
    }

    /// Forget the route, the visited history, every timer, and the latches.
    pub fn clear(&mut self) {
        self.route.clear();
        self.locomotion.reset();
        self.goal_kind = GoalKind::None;
        self.active_explore_goal = AreaId::NONE;
        self.last_positional_retarget = None;
    }

    /// Advance this agent's navigation by one tick.
    pub fn tick(
        &mut self,
        mesh: &NavMesh,
        world: &dyn WorldView,
        config: &NavConfig,
    ) -> TickOutput {
        let now = world.now();
        let mut events = EventSink::new(now);

        let agent = match world.agent() {
            Some(agent) if agent.alive && config.enabled => agent,
            _ => {
                let reason = if config.enabled {
                    ClearReason::AgentUnavailable
                } else {
                    ClearReason::Disabled
                };
                if self.route.is_active() {
                    events.push(NavEventKind::RouteCleared { reason });
                    debug!(?reason, "route_cleared");
                }
                self.clear();
                return TickOutput {
                    command: MoveCommand::idle(),
                    events: events.into_events(),
                };
            }
        };

        let from_area = mesh
            .best_area_from_xyz(agent.position, &config.mesh)
            .map_or(AreaId::NONE, |area| area.id);

        let candidate = pick_goal(&GoalInputs {
            world,
            mesh,
            agent,
            from_area,
            visited: &self.route.visited,
            config,
        });
        if candidate.kind != self.goal_kind {
            events.push(NavEventKind::GoalChanged {
                from: self.goal_kind,
                to: candidate.kind,
            });
            if config.debug_logging {
                info!(from = %self.goal_kind, to = %candidate.kind, "goal_changed");
            } else {
                debug!(from = %self.goal_kind, to = %candidate.kind, "goal_changed");
            }
            self.goal_kind = candidate.kind;
        }

        let mut target = candidate.target;
        if candidate.kind == GoalKind::Explore {
            if self.route.goal.is_some() && self.active_explore_goal == self.route.goal {
                target = None;
            }
        } else {
            self.active_explore_goal = AreaId::NONE;
        }
        if candidate.kind == GoalKind::Positional && self.route.goal.is_some() {
            let cooldown = f64::from(config.positional.retarget_cooldown);
            if self
                .last_positional_retarget
                .is_some_and(|t| now - t < cooldown)
            {
                target = None;
            }
        }

        if candidate.kind == GoalKind::None {
            if self.route.is_active() {
                self.route.reset_current();
                events.push(NavEventKind::RouteCleared {
                    reason: ClearReason::NoGoal,
                });
                debug!("route_cleared_no_goal");
            }
        } else if let Some(point) = target {
            self.retarget(mesh, config, candidate.kind, point, from_area, now, &mut events);
        }

        let command = if self.route.is_active() {
            let ctx = FollowContext {
                mesh,
                config,
                agent,
                now,
            };
            self.locomotion
                .follow(&ctx, &mut self.route, &mut self.planner, &mut events)
        } else {
            MoveCommand::idle()
        };

        TickOutput {
            command,
            events: events.into_events(),
        }
    }

    /// Plan toward the area containing `point` unless the route already
    /// leads there.
    #[allow(clippy::too_many_arguments)]
    fn retarget(
        &mut self,
        mesh: &NavMesh,
        config: &NavConfig,
        kind: GoalKind,
        point: Vec3,
        from_area: AreaId,
        now: f64,
        events: &mut EventSink,
    ) {
        let Some(goal_area) = mesh.resolve_goal_area(point, &config.mesh).map(|a| a.id) else {
            return;
        };
        if from_area.is_none() || self.route.goal == goal_area {
            return;
        }
        if goal_area == from_area {
            // Already standing in the goal area: nothing to plan or walk.
            self.route.record_area(from_area);
            if self.route.is_active() {
                self.route.reset_current();
                events.push(NavEventKind::RouteCleared {
                    reason: ClearReason::GoalReached,
                });
                debug!(goal = %goal_area, "route_cleared_goal_reached");
            }
            return;
        }

        match self.planner.plan(mesh, &mut self.route, from_area, goal_area) {
            Ok(()) => {
                events.push(NavEventKind::RoutePlanned {
                    start: from_area,
                    goal: goal_area,
                    len: self.route.path.len(),
                });
                match kind {
                    GoalKind::Explore => self.active_explore_goal = goal_area,
                    GoalKind::Positional => self.last_positional_retarget = Some(now),
                    GoalKind::Capture | GoalKind::None => {}
                }
            }
            Err(err) => {
                events.push(NavEventKind::PlanFailed {
                    start: from_area,
                    goal: goal_area,
                });
                debug!(error = %err, "plan_failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::{Area, Direction};
    use crate::types::{ActorId, Team};
    use crate::world::{ActorState, ControlPoint, WorldSnapshot};

    /// Three areas in a row along +X, 100 units each.
    fn row() -> NavMesh {
        let mut a = Area::flat(AreaId(1), 0.0, 0.0, 100.0, 100.0, 0.0);
        let mut b = Area::flat(AreaId(2), 100.0, 0.0, 200.0, 100.0, 0.0);
        let mut c = Area::flat(AreaId(3), 200.0, 0.0, 300.0, 100.0, 0.0);
        a.connect(Direction::East, AreaId(2));
        b.connect(Direction::West, AreaId(1));
        b.connect(Direction::East, AreaId(3));
        c.connect(Direction::West, AreaId(2));
        NavMesh::new("row", vec![a, b, c], Vec::new()).unwrap()
    }

    fn explore_only() -> NavConfig {
        let mut config = NavConfig::default();
        config.goals.capture.enabled = false;
        config.goals.positional.enabled = false;
        config
    }

    #[test]
    fn explores_to_the_far_end() {
        let mesh = row();
        let config = explore_only();
        let mut nav = Navigator::new(&config);
        let world = WorldSnapshot::with_agent("test", Vec3::new(50.0, 50.0, 0.0));

        let out = nav.tick(&mesh, &world, &config);
        assert!(out.events.iter().any(|e| e.kind
            == NavEventKind::GoalChanged {
                from: GoalKind::None,
                to: GoalKind::Explore
            }));
        assert!(out.events.iter().any(|e| e.kind
            == NavEventKind::RoutePlanned {
                start: AreaId(1),
                goal: AreaId(3),
                len: 3
            }));
        assert!(out.command.forward > 0.0);

        let status = nav.debug_status();
        assert_eq!(status.goal_kind, GoalKind::Explore);
        assert_eq!(status.goal_area, AreaId(3));
        assert_eq!(status.next_area, Some(AreaId(2)));
        assert_eq!(status.cursor, 1);
        assert_eq!(status.path_len, 3);
    }

    #[test]
    fn explore_latch_holds_the_route() {
        let mesh = row();
        let config = explore_only();
        let mut nav = Navigator::new(&config);
        let mut world = WorldSnapshot::with_agent("test", Vec3::new(50.0, 50.0, 0.0));
        nav.tick(&mesh, &world, &config);
        assert_eq!(nav.planner().searches(), 1);

        // From area 2, the farthest unvisited area would still be 3, but the
        // latch means no new plan is issued at all.
        world.time = 0.1;
        if let Some(agent) = world.agent.as_mut() {
            agent.position = Vec3::new(150.0, 50.0, 0.0);
        }
        let out = nav.tick(&mesh, &world, &config);
        assert_eq!(nav.planner().searches(), 1);
        assert!(!out
            .events
            .iter()
            .any(|e| matches!(e.kind, NavEventKind::RoutePlanned { .. })));
        assert_eq!(nav.route().next(), Some(AreaId(3)));
    }

    #[test]
    fn dead_or_disabled_agent_clears_everything() {
        let mesh = row();
        let mut config = explore_only();
        let mut nav = Navigator::new(&config);
        let mut world = WorldSnapshot::with_agent("test", Vec3::new(50.0, 50.0, 0.0));
        nav.tick(&mesh, &world, &config);
        assert!(nav.route().is_active());

        if let Some(agent) = world.agent.as_mut() {
            agent.alive = false;
        }
        let out = nav.tick(&mesh, &world, &config);
        assert!(out.command.is_idle());
        assert!(out.events.iter().any(|e| e.kind
            == NavEventKind::RouteCleared {
                reason: ClearReason::AgentUnavailable
            }));
        assert!(!nav.route().is_active());
        assert!(nav.route().visited.is_empty());
        assert_eq!(nav.debug_status(), NavStatus::default());

        // Nothing to clear: no event.
        let out = nav.tick(&mesh, &world, &config);
        assert!(out.events.is_empty());

        if let Some(agent) = world.agent.as_mut() {
            agent.alive = true;
        }
        nav.tick(&mesh, &world, &config);
        assert!(nav.route().is_active());
        config.enabled = false;
        let out = nav.tick(&mesh, &world, &config);
        assert!(out.events.iter().any(|e| e.kind
            == NavEventKind::RouteCleared {
                reason: ClearReason::Disabled
            }));
    }

    #[test]
    fn capture_outranks_exploration() {
        let mesh = row();
        let config = NavConfig::default();
        let mut nav = Navigator::new(&config);
        let mut world = WorldSnapshot::with_agent("koth_test", Vec3::new(250.0, 50.0, 0.0));
        world.control_points.push(ControlPoint {
            position: Vec3::new(150.0, 50.0, 0.0),
            owner: None,
            locked: false,
            capturable_by: vec![Team(2)],
        });
        nav.tick(&mesh, &world, &config);
        let status = nav.debug_status();
        assert_eq!(status.goal_kind, GoalKind::Capture);
        assert_eq!(status.goal_area, AreaId(2));
    }

    #[test]
    fn positional_retarget_is_rate_limited() {
        let mesh = row();
        let mut config = NavConfig::default();
        config.goals.capture.enabled = false;
        config.goals.explore.enabled = false;
        config.positional.radius = 10.0;
        let mut nav = Navigator::new(&config);
        let mut world = WorldSnapshot::with_agent("test", Vec3::new(50.0, 50.0, 0.0));
        world.actors.push(ActorState {
            id: ActorId(7),
            team: Team(3),
            position: Vec3::new(150.0, 50.0, 0.0),
            alive: true,
        });
        nav.tick(&mesh, &world, &config);
        assert_eq!(nav.route().goal, AreaId(2));
        assert_eq!(nav.planner().searches(), 1);

        // The enemy moves to area 3, but the cooldown holds the old goal.
        world.actors[0].position = Vec3::new(250.0, 50.0, 0.0);
        world.time = 0.5;
        nav.tick(&mesh, &world, &config);
        assert_eq!(nav.route().goal, AreaId(2));

        world.time = 0.8;
        nav.tick(&mesh, &world, &config);
        assert_eq!(nav.route().goal, AreaId(3));
    }

    #[test]
    fn no_goal_clears_the_route() {
        let mesh = row();
        let mut config = explore_only();
        let mut nav = Navigator::new(&config);
        let world = WorldSnapshot::with_agent("test", Vec3::new(50.0, 50.0, 0.0));
        nav.tick(&mesh, &world, &config);
        assert!(nav.route().is_active());

        config.goals.explore.enabled = false;
        let out = nav.tick(&mesh, &world, &config);
        assert!(out.events.iter().any(|e| e.kind
            == NavEventKind::RouteCleared {
                reason: ClearReason::NoGoal
            }));
        assert!(!nav.route().is_active());
        assert!(out.command.is_idle());
        // The visited history survives a plain reset.
        assert!(nav.route().visited.contains(AreaId(1)));
    }

    #[test]
    fn standing_in_the_goal_area_plans_nothing() {
        let mesh = row();
        let mut config = NavConfig::default();
        config.goals.explore.enabled = false;
        let mut nav = Navigator::new(&config);
        let mut world = WorldSnapshot::with_agent("koth_test", Vec3::new(50.0, 50.0, 0.0));
        world.control_points.push(ControlPoint {
            position: Vec3::new(150.0, 50.0, 0.0),
            owner: None,
            locked: false,
            capturable_by: vec![Team(2)],
        });
        nav.tick(&mesh, &world, &config);
        assert_eq!(nav.route().goal, AreaId(2));
        assert_eq!(nav.planner().searches(), 1);

        // Holding the point: the route completes once, then every later
        // tick is quiet.
        if let Some(agent) = world.agent.as_mut() {
            agent.position = Vec3::new(150.0, 50.0, 0.0);
        }
        for i in 1..20 {
            world.time = 0.05 * f64::from(i);
            let out = nav.tick(&mesh, &world, &config);
            assert!(out.command.is_idle());
            if i > 1 {
                assert!(out.events.is_empty(), "tick {i}: {:?}", out.events);
            }
        }
        assert_eq!(nav.planner().searches(), 1);
        assert!(!nav.route().is_active());

        // An active route elsewhere is dropped once the goal moves under
        // the agent.
        world.control_points[0].position = Vec3::new(250.0, 50.0, 0.0);
        world.time = 2.0;
        nav.tick(&mesh, &world, &config);
        assert_eq!(nav.route().goal, AreaId(3));
        world.control_points[0].position = Vec3::new(150.0, 50.0, 0.0);
        world.time = 2.05;
        let out = nav.tick(&mesh, &world, &config);
        assert!(out.events.iter().any(|e| e.kind
            == NavEventKind::RouteCleared {
                reason: ClearReason::GoalReached
            }));
        assert!(!nav.route().is_active());
        assert_eq!(nav.planner().searches(), 2);
    }

    #[test]
    fn walk_disabled_plans_but_stands_still() {
        let mesh = row();
        let mut config = explore_only();
        config.walk = false;
        let mut nav = Navigator::new(&config);
        let world = WorldSnapshot::with_agent("test", Vec3::new(50.0, 50.0, 0.0));
        let out = nav.tick(&mesh, &world, &config);
        assert!(nav.route().is_active());
        assert!(out.command.is_idle());
    }
}
