// Per-agent route state: the active path, its cursor, and the bounded
// history of recently visited areas.
//
// A `Route` is "active" when its goal is a real area id. The path always
// starts where the plan started and ends at the goal; `cursor` indexes the
// node the agent is currently walking toward and satisfies
// `cursor <= path.len()` at all times. A cursor equal to the length means the
// route has been fully walked and is about to be reset.
//
// `VisitedAreas` is a FIFO with a companion `FxHashSet` for O(1) membership.
// It survives route resets (exploration needs the history across goals) and
// is only forgotten by `Route::clear()`, i.e. when the agent dies, the map
// changes, or navigation is switched off.
//
// See also: `planner.rs` which fills a `Route`, `locomotion.rs` which walks
// and repairs it, `nav.rs` whose `pick_exploration_goal` reads the history.

use crate::types::AreaId;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Visited history
// ---------------------------------------------------------------------------

/// Bounded set of recently visited areas, oldest evicted first.
#[derive(Clone, Debug)]
pub struct VisitedAreas {
    order: VecDeque<AreaId>,
    members: FxHashSet<AreaId>,
    capacity: usize,
}

impl VisitedAreas {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            members: FxHashSet::default(),
            capacity: capacity.max(1),
        }
    }

    /// Record an area. Id 0 and areas already present are ignored. When
    /// full, exactly one oldest entry is evicted to make room.
    pub fn insert(&mut self, id: AreaId) {
        if id.is_none() || self.members.contains(&id) {
            return;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.order.push_back(id);
        self.members.insert(id);
    }

    pub fn contains(&self, id: AreaId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = AreaId> + '_ {
        self.order.iter().copied()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Route {
    /// Goal area; `AreaId::NONE` when no route is active.
    pub goal: AreaId,
    pub path: Vec<AreaId>,
    /// Index of the next node to walk toward.
    pub cursor: usize,
    pub visited: VisitedAreas,
    /// Last area recorded into `visited`.
    pub last_area: AreaId,
}

impl Route {
    pub fn new(visited_capacity: usize) -> Self {
        Self {
            goal: AreaId::NONE,
            path: Vec::new(),
            cursor: 0,
            visited: VisitedAreas::new(visited_capacity),
            last_area: AreaId::NONE,
        }
    }

    pub fn is_active(&self) -> bool {
        self.goal.is_some() && !self.path.is_empty()
    }

    /// The node at the cursor, if any.
    pub fn next(&self) -> Option<AreaId> {
        self.path.get(self.cursor).copied()
    }

    /// The node `offset` places past the cursor.
    pub fn peek(&self, offset: usize) -> Option<AreaId> {
        self.path.get(self.cursor + offset).copied()
    }

    /// Move the cursor forward by one. Returns `true` while the route still
    /// has nodes left to walk.
    pub fn advance(&mut self) -> bool {
        self.skip(1)
    }

    /// Move the cursor forward by `count`, saturating at the path length.
    pub fn skip(&mut self, count: usize) -> bool {
        self.cursor = (self.cursor + count).min(self.path.len());
        self.cursor < self.path.len()
    }

    /// Place the cursor just past `index`, saturating at the path length.
    pub fn jump_past(&mut self, index: usize) -> bool {
        self.cursor = (index + 1).min(self.path.len());
        self.cursor < self.path.len()
    }

    /// Whether every node has been walked.
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.path.len()
    }

    /// Index of the first occurrence of `id` at or after the cursor.
    pub fn position_from_cursor(&self, id: AreaId) -> Option<usize> {
        self.path
            .iter()
            .skip(self.cursor)
            .position(|&n| n == id)
            .map(|offset| self.cursor + offset)
    }

    /// Install a freshly planned path.
    pub fn install(&mut self, goal: AreaId, path: Vec<AreaId>, cursor: usize) {
        self.cursor = cursor.min(path.len());
        self.path = path;
        self.goal = goal;
    }

    /// Drop the current goal and path but keep the visited history.
    pub fn reset_current(&mut self) {
        self.goal = AreaId::NONE;
        self.path.clear();
        self.cursor = 0;
    }

    /// Forget everything, including the visited history.
    pub fn clear(&mut self) {
        self.reset_current();
        self.visited.clear();
        self.last_area = AreaId::NONE;
    }

    /// Record the agent's current area into the history when it changed.
    /// Returns `true` when a new area was entered.
    pub fn record_area(&mut self, id: AreaId) -> bool {
        if id.is_none() || id == self.last_area {
            return false;
        }
        self.visited.insert(id);
        self.last_area = id;
        true
    }
}
