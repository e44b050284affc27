// Navigation events: a narrative record of what a navigator decided.
//
// Each `Navigator::tick()` returns the events it produced alongside the
// movement command. Nothing inside the library consumes them; they exist for
// hosts (debug overlays, the harness summary, tests) that want to know *why*
// the agent is doing what it's doing without scraping log output.
//
// Events are plain data and serializable, so a host can stream them out as
// JSON lines.
//
// See also: `navigator.rs` and `locomotion.rs` which emit these,
// `pathwright_harness` which tallies them per agent.

use crate::goal::GoalKind;
use crate::locomotion::StuckPhase;
use crate::types::AreaId;
use serde::{Deserialize, Serialize};

/// A narrative event emitted by a navigator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavEvent {
    /// World time at which the event happened, in seconds.
    pub time: f64,
    pub kind: NavEventKind,
}

/// Why a route was thrown away.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearReason {
    /// Navigation was switched off by policy.
    Disabled,
    /// The agent is missing or not alive.
    AgentUnavailable,
    /// The arbiter produced no goal this tick.
    NoGoal,
    /// The goal resolved to the area the agent is already in.
    GoalReached,
}

/// What triggered a replan of the current goal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplanReason {
    /// The next node was not adjacent and no lookahead node was either.
    Disconnected,
    /// The agent sat on the same route node for too long.
    Dwell,
    /// The agent is far above or below the next node.
    OffPath,
    /// The stuck escalation reached its forced-replan phase.
    Stuck,
}

/// What triggered a crouch-jump.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpReason {
    /// Backoff hop while stuck.
    Unstuck,
    /// Approaching a step too tall to walk up.
    Ledge,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NavEventKind {
    /// The winning goal producer changed.
    GoalChanged { from: GoalKind, to: GoalKind },
    /// A new route was installed for a new goal area.
    RoutePlanned {
        start: AreaId,
        goal: AreaId,
        len: usize,
    },
    /// Planning toward a goal area failed; the route is inactive.
    PlanFailed { start: AreaId, goal: AreaId },
    /// The agent reached the goal area.
    RouteCompleted { goal: AreaId },
    RouteCleared { reason: ClearReason },
    StuckPhaseChanged { from: StuckPhase, to: StuckPhase },
    /// The current goal was replanned from the agent's area. `success` is
    /// false when no route could be found and the route is now inactive.
    Replanned { reason: ReplanReason, success: bool },
    JumpStarted { reason: JumpReason },
}

/// Collects events for one tick, stamping each with the tick's time.
#[derive(Clone, Debug, Default)]
pub struct EventSink {
    time: f64,
    events: Vec<NavEvent>,
}

impl EventSink {
    pub fn new(time: f64) -> Self {
        Self {
            time,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: NavEventKind) {
        self.events.push(NavEvent {
            time: self.time,
            kind,
        });
    }

    pub fn events(&self) -> &[NavEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<NavEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_stamps_events_with_tick_time() {
        let mut sink = EventSink::new(12.5);
        sink.push(NavEventKind::RouteCompleted { goal: AreaId(3) });
        sink.push(NavEventKind::JumpStarted {
            reason: JumpReason::Ledge,
        });
        let events = sink.into_events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.time == 12.5));
    }

    #[test]
    fn events_serialize_as_tagged_json() {
        let event = NavEvent {
            time: 1.0,
            kind: NavEventKind::StuckPhaseChanged {
                from: StuckPhase::Normal,
                to: StuckPhase::Wiggle,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("StuckPhaseChanged"));
        assert!(json.contains("Wiggle"));
    }
}
