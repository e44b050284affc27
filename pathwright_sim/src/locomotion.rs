// Locomotion: walk the active route and get unstuck when the body won't.
//
// Each tick `LocomotionController::follow()` does two things.
//
// Route following keeps the cursor honest against where the agent actually
// is: it records visited areas, skips or replans when the cursor has sat on
// one node too long (dwell watchdog), repairs a next node that isn't
// adjacent to the current area (lookahead skip, else replan), completes the
// route on arrival, fast-forwards past nodes the agent overshot, and cuts
// corners when the node after next is clearly closer.
//
// Driving turns the next node into a `MoveCommand` and runs the stuck state
// machine on top of it:
//
//   Normal -> Wiggle -> Backoff -> ForcedReplan
//
// The phase climbs one level per tick while the agent is commanding motion
// toward a node it isn't getting closer to, and drops to Normal the tick
// distance progress resumes. Wiggle adds a lateral oscillation, Backoff adds
// a backward bias and an unstuck hop, ForcedReplan re-routes to the same goal
// and falls back to Wiggle on the same tick. While the forced-replan cooldown
// runs the climb stops at Backoff. Independently, a big height mismatch with the
// next node triggers a rate-limited replan, and a walkable-but-too-tall step
// ahead triggers a ledge crouch-jump.
//
// All cross-tick timers live in `LocomotionState` and are replaced as a
// whole whenever the route's goal or the agent's life changes.
//
// See also: `route.rs` for the cursor, `planner.rs` for replans,
// `config.rs` (`LocomotionParams`) for every threshold used here,
// `navigator.rs` which calls `follow()` once per tick.

use crate::command::{Buttons, MoveCommand, ViewAngles};
use crate::config::NavConfig;
use crate::event::{EventSink, JumpReason, NavEventKind, ReplanReason};
use crate::nav::{Area, NavMesh};
use crate::planner::PathPlanner;
use crate::route::Route;
use crate::types::{AreaId, Vec3, wrap_degrees};
use crate::world::AgentState;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum StuckPhase {
    #[default]
    Normal = 0,
    Wiggle = 1,
    Backoff = 2,
    ForcedReplan = 3,
}

impl StuckPhase {
    pub fn level(self) -> u8 {
        self as u8
    }

    /// The next phase up, saturating at `ForcedReplan`.
    pub fn escalated(self) -> Self {
        match self {
            StuckPhase::Normal => StuckPhase::Wiggle,
            StuckPhase::Wiggle => StuckPhase::Backoff,
            StuckPhase::Backoff | StuckPhase::ForcedReplan => StuckPhase::ForcedReplan,
        }
    }
}

/// An in-progress crouch-jump: jump pressed on the first tick, duck held
/// until the agent lands again or the tick cap runs out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CrouchJump {
    pub ticks: u32,
    pub left_ground: bool,
}

/// Cross-tick locomotion timers. Times are world seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct LocomotionState {
    /// Goal area and life these timers belong to.
    pub goal: AreaId,
    pub life_epoch: u32,

    pub phase: StuckPhase,
    pub phase_since: f64,

    pub last_progress_time: f64,
    /// Hysteresis baseline for the distance to the next node.
    pub best_distance: f32,
    pub pending_progress_reset: bool,
    pub last_sample_time: Option<f64>,
    pub last_sample_pos: Option<Vec3>,

    /// +1 or -1.
    pub wiggle_sign: f32,
    pub last_wiggle_toggle: Option<f64>,

    pub last_forced_replan: Option<f64>,
    pub last_offpath_replan: Option<f64>,
    pub last_unstuck_hop: Option<f64>,
    pub last_jump: Option<f64>,
    pub crouch_jump: Option<CrouchJump>,

    /// Route node the dwell watchdog is timing, and since when.
    pub dwell_node: AreaId,
    pub dwell_since: Option<f64>,
    pub last_dwell_check: Option<f64>,
}

impl Default for LocomotionState {
    fn default() -> Self {
        Self::new(AreaId::NONE, 0)
    }
}

impl LocomotionState {
    pub fn new(goal: AreaId, life_epoch: u32) -> Self {
        Self {
            goal,
            life_epoch,
            phase: StuckPhase::Normal,
            phase_since: 0.0,
            last_progress_time: 0.0,
            best_distance: f32::INFINITY,
            pending_progress_reset: true,
            last_sample_time: None,
            last_sample_pos: None,
            wiggle_sign: 1.0,
            last_wiggle_toggle: None,
            last_forced_replan: None,
            last_offpath_replan: None,
            last_unstuck_hop: None,
            last_jump: None,
            crouch_jump: None,
            dwell_node: AreaId::NONE,
            dwell_since: None,
            last_dwell_check: None,
        }
    }
}

/// True when `since` is unset or more than `cooldown` seconds ago.
fn elapsed(since: Option<f64>, now: f64, cooldown: f32) -> bool {
    since.is_none_or(|t| now - t > f64::from(cooldown))
}

fn clamp_move(value: f32, max: f32) -> f32 {
    value.clamp(-max, max)
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Read-only inputs for one tick of route following.
pub struct FollowContext<'a> {
    pub mesh: &'a NavMesh,
    pub config: &'a NavConfig,
    pub agent: &'a AgentState,
    pub now: f64,
}

#[derive(Clone, Debug, Default)]
pub struct LocomotionController {
    state: LocomotionState,
}

impl LocomotionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LocomotionState {
        &self.state
    }

    pub fn phase(&self) -> StuckPhase {
        self.state.phase
    }

    /// Drop every timer, e.g. when navigation is switched off.
    pub fn reset(&mut self) {
        self.state = LocomotionState::default();
    }

    /// Walk `route` for one tick and return the movement command.
    ///
    /// Returns an idle command when there is no active route, walking is
    /// disabled, or the route ends this tick.
    pub fn follow(
        &mut self,
        ctx: &FollowContext<'_>,
        route: &mut Route,
        planner: &mut PathPlanner,
        events: &mut EventSink,
    ) -> MoveCommand {
        if !route.is_active() {
            return MoveCommand::idle();
        }
        if self.state.goal != route.goal || self.state.life_epoch != ctx.agent.life_epoch {
            self.state = LocomotionState::new(route.goal, ctx.agent.life_epoch);
        }

        let current = ctx
            .mesh
            .best_area_from_xyz(ctx.agent.position, &ctx.config.mesh);
        let current_id = current.map_or(AreaId::NONE, |a| a.id);
        route.record_area(current_id);

        self.watch_dwell(ctx, route, planner, current_id, events);
        if route.is_active() {
            self.repair_adjacency(ctx, route, planner, current_id, events);
        }
        if route.is_active() && current_id.is_some() {
            self.track_cursor(ctx, route, current_id, events);
        }
        if route.is_active() && route.is_finished() {
            complete(route, events);
        }

        if !route.is_active() || !ctx.config.walk {
            return MoveCommand::idle();
        }
        let Some(next) = route.next().and_then(|id| ctx.mesh.area_by_id(id)) else {
            return MoveCommand::idle();
        };
        self.drive(ctx, route, planner, current, next, events)
    }

    // -- route following ----------------------------------------------------

    /// Skip ahead or replan when the cursor has been parked on one node for
    /// longer than `dwell_timeout`.
    fn watch_dwell(
        &mut self,
        ctx: &FollowContext<'_>,
        route: &mut Route,
        planner: &mut PathPlanner,
        current: AreaId,
        events: &mut EventSink,
    ) {
        let loco = &ctx.config.locomotion;
        let now = ctx.now;
        if !elapsed(self.state.last_dwell_check, now, loco.dwell_check_interval) {
            return;
        }
        self.state.last_dwell_check = Some(now);

        let Some(node) = route.next() else {
            return;
        };
        if node != self.state.dwell_node {
            self.state.dwell_node = node;
            self.state.dwell_since = None;
            return;
        }
        let Some(since) = self.state.dwell_since else {
            self.state.dwell_since = Some(now);
            return;
        };
        if now - since <= f64::from(loco.dwell_timeout) {
            return;
        }

        let remaining = route.path.len() - route.cursor - 1;
        let skips = loco.dwell_max_skips.min(remaining);
        let recovered = if skips > 0 {
            route.skip(skips);
            debug!(node = %node, skips, "dwell_skip");
            true
        } else {
            self.replan(ctx, route, planner, current, ReplanReason::Dwell, events)
        };
        if recovered {
            self.state.dwell_node = AreaId::NONE;
            self.state.dwell_since = None;
        }
    }

    /// Make sure the next node is reachable from the current area: skip to
    /// an adjacent node within the lookahead window, else replan.
    fn repair_adjacency(
        &mut self,
        ctx: &FollowContext<'_>,
        route: &mut Route,
        planner: &mut PathPlanner,
        current: AreaId,
        events: &mut EventSink,
    ) {
        let mesh = ctx.mesh;
        let Some(next) = route.next() else {
            return;
        };
        if current.is_none()
            || current == next
            || mesh.area_by_id(next).is_none()
            || mesh.connected(current, next)
        {
            return;
        }

        let window = ctx.config.locomotion.lookahead_window;
        let adjacent = (1..=window).find(|&offset| {
            route
                .peek(offset)
                .is_some_and(|id| mesh.area_by_id(id).is_some() && mesh.connected(current, id))
        });
        match adjacent {
            Some(offset) => {
                route.skip(offset);
                trace!(from = %current, offset, "lookahead_skip");
            }
            None => {
                self.replan(ctx, route, planner, current, ReplanReason::Disconnected, events);
            }
        }
    }

    /// Arrival, advance, overshoot, and corner-cutting.
    fn track_cursor(
        &mut self,
        ctx: &FollowContext<'_>,
        route: &mut Route,
        current: AreaId,
        events: &mut EventSink,
    ) {
        if current == route.goal {
            complete(route, events);
            return;
        }
        if route.next() == Some(current) && !route.advance() {
            complete(route, events);
            return;
        }
        if route.is_finished() {
            return;
        }

        if let Some(index) = route.position_from_cursor(current) {
            if !route.jump_past(index) {
                complete(route, events);
            }
            return;
        }

        let loco = &ctx.config.locomotion;
        let position = ctx.agent.position;
        for _ in 0..loco.max_corner_skips {
            let (Some(a), Some(b)) = (route.next(), route.peek(1)) else {
                break;
            };
            let (Some(a), Some(b)) = (ctx.mesh.area_by_id(a), ctx.mesh.area_by_id(b)) else {
                break;
            };
            let d_next = position.distance_2d(a.center());
            let d_after = position.distance_2d(b.center());
            if d_after + loco.corner_skip_margin < d_next {
                route.advance();
            } else {
                break;
            }
        }
    }

    // -- driving --------------------------------------------------------------

    fn drive(
        &mut self,
        ctx: &FollowContext<'_>,
        route: &mut Route,
        planner: &mut PathPlanner,
        current: Option<&Area>,
        next: &Area,
        events: &mut EventSink,
    ) -> MoveCommand {
        let loco = &ctx.config.locomotion;
        let mesh_params = &ctx.config.mesh;
        let agent = ctx.agent;
        let now = ctx.now;
        let position = agent.position;
        let current_id = current.map_or(AreaId::NONE, |a| a.id);

        let next_center = next.center();
        let delta_yaw = wrap_degrees(position.bearing_to(next_center) - agent.yaw);
        let (sin, cos) = delta_yaw.to_radians().sin_cos();
        let mut command = MoveCommand {
            forward: clamp_move(cos * loco.move_speed, loco.max_move),
            side: clamp_move(-sin * loco.move_speed, loco.max_move),
            view: None,
            buttons: Buttons::NONE,
        };

        let distance = position.distance_2d(next_center);
        self.measure_progress(ctx, distance, events);

        let since_progress = (now - self.state.last_progress_time) as f32;
        let moving_to_goal = (command.forward.abs() > loco.min_command
            || command.side.abs() > loco.min_command)
            && distance > loco.min_distance;
        if moving_to_goal {
            let due = if since_progress > loco.replan_after {
                StuckPhase::ForcedReplan
            } else if since_progress > loco.backoff_after {
                StuckPhase::Backoff
            } else if since_progress > loco.wiggle_after {
                StuckPhase::Wiggle
            } else {
                StuckPhase::Normal
            };
            let next_phase = self.state.phase.escalated();
            // ForcedReplan only exists on the tick the replan fires, so the
            // climb holds at Backoff while the replan cooldown runs.
            let replan_ready =
                elapsed(self.state.last_forced_replan, now, loco.forced_replan_cooldown);
            if due > self.state.phase && (next_phase < StuckPhase::ForcedReplan || replan_ready) {
                self.set_phase(next_phase, now, events);
            }
        } else if self.state.phase > StuckPhase::Normal && since_progress < loco.settle_window {
            self.set_phase(StuckPhase::Normal, now, events);
        }

        // Displaced far above or below the route.
        let dz = (next.sample_z_at_xy(position.x, position.y) - position.z).abs();
        let offpath_dz = mesh_params.jump_height * 1.5 + mesh_params.z_slop;
        if dz > offpath_dz && elapsed(self.state.last_offpath_replan, now, loco.offpath_cooldown) {
            self.state.last_offpath_replan = Some(now);
            if self.replan(ctx, route, planner, current_id, ReplanReason::OffPath, events) {
                self.state.pending_progress_reset = true;
                self.set_phase(StuckPhase::Wiggle, now, events);
            }
        }

        let mut yaw_scrub = 0.0;
        if self.state.phase >= StuckPhase::Wiggle {
            if elapsed(self.state.last_wiggle_toggle, now, loco.wiggle_period) {
                self.state.wiggle_sign = -self.state.wiggle_sign;
                self.state.last_wiggle_toggle = Some(now);
            }
            command.side = clamp_move(
                command.side + loco.wiggle_side * self.state.wiggle_sign,
                loco.max_move,
            );
            yaw_scrub = loco.wiggle_yaw_scrub * self.state.wiggle_sign;
        }

        if self.state.phase >= StuckPhase::Backoff {
            command.forward = clamp_move(command.forward - loco.backoff_forward, loco.max_move);
            if self.can_start_jump(ctx)
                && elapsed(self.state.last_unstuck_hop, now, loco.unstuck_hop_cooldown)
            {
                self.state.last_unstuck_hop = Some(now);
                self.start_jump(now, JumpReason::Unstuck, events);
            }
        }

        if self.state.phase == StuckPhase::ForcedReplan {
            self.state.last_forced_replan = Some(now);
            self.replan(ctx, route, planner, current_id, ReplanReason::Stuck, events);
            self.set_phase(StuckPhase::Wiggle, now, events);
        }

        if !route.is_active() {
            return MoveCommand::idle();
        }

        if let Some(current) = current {
            if self.ledge_ahead(ctx, route, current) && self.can_start_jump(ctx) {
                self.start_jump(now, JumpReason::Ledge, events);
            }
        }

        if let Some(jump) = self.state.crouch_jump.as_mut() {
            if jump.ticks == 0 {
                command.buttons |= Buttons::JUMP;
            }
            command.buttons |= Buttons::DUCK;
            jump.ticks += 1;
            if !agent.on_ground {
                jump.left_ground = true;
            }
            let landed =
                jump.left_ground && agent.on_ground && jump.ticks > loco.crouch_jump_min_ticks;
            if landed || jump.ticks > loco.crouch_jump_max_ticks {
                self.state.crouch_jump = None;
            }
        }

        if ctx.config.look_along_path && !agent.attacking {
            let smoothness = if ctx.config.look_smoothness <= 0.0 {
                1.0
            } else {
                ctx.config.look_smoothness
            };
            command.view = Some(ViewAngles {
                pitch: 0.0,
                yaw: wrap_degrees(delta_yaw / smoothness + agent.yaw + yaw_scrub),
            });
        }

        command
    }

    /// Distance hysteresis plus the coarse raw-position check.
    fn measure_progress(&mut self, ctx: &FollowContext<'_>, distance: f32, events: &mut EventSink) {
        let loco = &ctx.config.locomotion;
        let now = ctx.now;
        let state = &mut self.state;

        if state.pending_progress_reset {
            state.best_distance = distance + loco.progress_reset_slack;
            state.last_progress_time = now;
            state.pending_progress_reset = false;
        }

        if distance + loco.progress_margin < state.best_distance {
            state.last_progress_time = now;
            state.best_distance = distance;
            state.wiggle_sign = 1.0;
            if state.phase != StuckPhase::Normal {
                self.set_phase(StuckPhase::Normal, now, events);
            }
        } else {
            state.best_distance = (state.best_distance + loco.baseline_drift).min(distance);
        }

        let state = &mut self.state;
        if elapsed(state.last_sample_time, now, loco.position_sample_interval) {
            let position = ctx.agent.position;
            let min_delta = loco.position_sample_min_delta;
            if let Some(last) = state.last_sample_pos {
                if position.distance_squared_2d(last) > min_delta * min_delta {
                    state.last_progress_time = now;
                }
            }
            state.last_sample_pos = Some(position);
            state.last_sample_time = Some(now);
        }
    }

    /// A step up to the next area that is too tall to walk but low enough
    /// to jump, with the agent close to the edge and no big drop right after.
    fn ledge_ahead(&self, ctx: &FollowContext<'_>, route: &Route, current: &Area) -> bool {
        let mesh_params = &ctx.config.mesh;
        let loco = &ctx.config.locomotion;
        let Some(next) = route.next().and_then(|id| ctx.mesh.area_by_id(id)) else {
            return false;
        };

        let next_center = next.center();
        let drop_follows = route
            .peek(1)
            .and_then(|id| ctx.mesh.area_by_id(id))
            .is_some_and(|after| next_center.z - after.center().z >= mesh_params.jump_height);
        if drop_follows {
            return false;
        }

        let approach = current.closest_point_to(next_center);
        let step = next.sample_z_at_xy(approach.x, approach.y)
            - current.sample_z_at_xy(approach.x, approach.y);
        let needs_jump = step > mesh_params.step_height + loco.step_jump_tolerance
            && step <= mesh_params.jump_height + mesh_params.z_slop;
        let trigger = mesh_params.hull_width * 0.75 + loco.edge_trigger_extra;
        needs_jump && ctx.agent.position.distance_2d(approach) <= trigger
    }

    fn can_start_jump(&self, ctx: &FollowContext<'_>) -> bool {
        let since_jump_ok = self
            .state
            .last_jump
            .is_none_or(|t| ctx.now - t >= f64::from(ctx.config.locomotion.jump_cooldown));
        self.state.crouch_jump.is_none()
            && ctx.agent.on_ground
            && ctx.agent.can_jump
            && since_jump_ok
    }

    fn start_jump(&mut self, now: f64, reason: JumpReason, events: &mut EventSink) {
        self.state.crouch_jump = Some(CrouchJump::default());
        self.state.last_jump = Some(now);
        events.push(NavEventKind::JumpStarted { reason });
        trace!(?reason, "crouch_jump");
    }

    fn set_phase(&mut self, phase: StuckPhase, now: f64, events: &mut EventSink) {
        let from = self.state.phase;
        self.state.phase = phase;
        self.state.phase_since = now;
        if from != phase {
            events.push(NavEventKind::StuckPhaseChanged { from, to: phase });
            debug!(from = ?from, to = ?phase, "stuck_phase");
        }
    }

    /// Re-route from `from` to the route's existing goal.
    fn replan(
        &mut self,
        ctx: &FollowContext<'_>,
        route: &mut Route,
        planner: &mut PathPlanner,
        from: AreaId,
        reason: ReplanReason,
        events: &mut EventSink,
    ) -> bool {
        let goal = route.goal;
        let result = planner.plan(ctx.mesh, route, from, goal);
        let success = result.is_ok();
        events.push(NavEventKind::Replanned { reason, success });
        match result {
            Ok(()) => debug!(?reason, from = %from, goal = %goal, "replanned"),
            Err(err) => debug!(?reason, error = %err, "replan_failed"),
        }
        success
    }
}

fn complete(route: &mut Route, events: &mut EventSink) {
    let goal = route.goal;
    route.reset_current();
    events.push(NavEventKind::RouteCompleted { goal });
    debug!(goal = %goal, "route_completed");
}
