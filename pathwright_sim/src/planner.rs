// Route planning: turns a (start area, goal area) request into a `Route`.
//
// The planner owns a boxed `PathSolver` (A* unless told otherwise) and a
// running count of the searches it has issued. `plan()` always resets the
// route's current goal and path first, so after any failure the caller sees
// an inactive route rather than a stale one. The visited history on the
// route is never touched here.
//
// Requests that cannot succeed are rejected before any search runs: a zero
// endpoint, an endpoint missing from the mesh, or start == goal (which is
// satisfied trivially with a one-node route).
//
// See also: `pathfinding.rs` for the solver traits and A*, `route.rs` for
// the cursor semantics, `navigator.rs` and `locomotion.rs` which call
// `plan()` for new goals and replans.

use crate::error::PlanError;
use crate::nav::NavMesh;
use crate::pathfinding::{AStar, PathSolver};
use crate::route::Route;
use crate::types::AreaId;
use std::fmt;
use tracing::debug;

pub struct PathPlanner {
    solver: Box<dyn PathSolver<NavMesh> + Send>,
    searches: u64,
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self::with_solver(AStar::new())
    }
}

impl fmt::Debug for PathPlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPlanner")
            .field("searches", &self.searches)
            .finish_non_exhaustive()
    }
}

impl PathPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solver(solver: impl PathSolver<NavMesh> + Send + 'static) -> Self {
        Self {
            solver: Box::new(solver),
            searches: 0,
        }
    }

    /// Number of searches issued so far.
    pub fn searches(&self) -> u64 {
        self.searches
    }

    /// Plan a route from `start` to `goal` into `route`.
    ///
    /// On success the route's goal is `goal`, its path runs from `start` to
    /// `goal`, and the cursor is 1 when the path begins at `start` (the
    /// agent is already there) or 0 otherwise. On failure the route is left
    /// inactive.
    pub fn plan(
        &mut self,
        mesh: &NavMesh,
        route: &mut Route,
        start: AreaId,
        goal: AreaId,
    ) -> Result<(), PlanError> {
        route.reset_current();

        if start.is_none() || goal.is_none() {
            return Err(PlanError::InvalidEndpoint { start, goal });
        }
        for id in [start, goal] {
            if mesh.area_by_id(id).is_none() {
                return Err(PlanError::UnknownArea { id });
            }
        }

        if start == goal {
            route.install(goal, vec![start], 1);
            debug!(area = %start, "route_trivial");
            return Ok(());
        }

        self.searches += 1;
        let result = self
            .solver
            .solve(mesh, start, goal)
            .filter(|r| !r.nodes.is_empty())
            .ok_or(PlanError::NoPath { start, goal })?;

        let cursor = usize::from(result.nodes[0] == start);
        debug!(
            start = %start,
            goal = %goal,
            len = result.nodes.len(),
            cost = result.total_cost,
            "route_planned"
        );
        route.install(goal, result.nodes, cursor);
        Ok(())
    }
}
