// Per-agent tallies for the end-of-run report.

use pathwright_sim::event::{NavEvent, NavEventKind};
use pathwright_sim::types::AreaId;
use rustc_hash::FxHashSet;

#[derive(Debug, Default)]
pub struct AgentSummary {
    pub areas: FxHashSet<AreaId>,
    pub routes_planned: u32,
    pub routes_completed: u32,
    pub plan_failures: u32,
    pub replans: u32,
    pub jumps: u32,
    pub max_phase: u8,
    pub distance: f32,
}

impl AgentSummary {
    pub fn record_area(&mut self, area: AreaId) {
        if area.is_some() {
            self.areas.insert(area);
        }
    }

    pub fn record_events(&mut self, events: &[NavEvent]) {
        for event in events {
            match event.kind {
                NavEventKind::RoutePlanned { .. } => self.routes_planned += 1,
                NavEventKind::RouteCompleted { .. } => self.routes_completed += 1,
                NavEventKind::PlanFailed { .. } => self.plan_failures += 1,
                NavEventKind::Replanned { .. } => self.replans += 1,
                NavEventKind::JumpStarted { .. } => self.jumps += 1,
                NavEventKind::StuckPhaseChanged { to, .. } => {
                    self.max_phase = self.max_phase.max(to.level());
                }
                NavEventKind::GoalChanged { .. } | NavEventKind::RouteCleared { .. } => {}
            }
        }
    }
}
