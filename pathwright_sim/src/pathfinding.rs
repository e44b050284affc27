// Graph search behind a pluggable solver interface.
//
// Two traits split the concerns: `SearchGraph` adapts any graph (nodes with
// dense indices, weighted successors, an admissible heuristic) and
// `PathSolver` is a search strategy over such a graph. `NavMesh` implements
// `SearchGraph` with edge cost = planar distance between area centers and the
// same distance as heuristic. `AStar` is the default solver.
//
// `AStar` uses a `BinaryHeap` (min-heap via reversed ordering) and keeps its
// score, came-from, and closed buffers in `Vec`s indexed by dense node index.
// Those buffers live on the solver and are reused across searches, so a
// solver owned by a long-lived planner keeps its allocations between plans.
//
// See also: `nav.rs` for the mesh being searched, `planner.rs` which owns a
// solver and turns its results into routes.
//
// Search is a pure function of graph and endpoints: ties in f-score break on
// node index, so repeated searches return identical paths.

use crate::nav::NavMesh;
use crate::types::AreaId;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Graph adapter consumed by a `PathSolver`.
pub trait SearchGraph {
    type Node: Copy + Eq;

    /// Upper bound (exclusive) on `node_index` results.
    fn node_count(&self) -> usize;

    /// Dense index of a node, or `None` if the node isn't in the graph.
    fn node_index(&self, node: Self::Node) -> Option<usize>;

    /// Append `(successor, edge_cost)` pairs for `node` to `out`.
    fn successors(&self, node: Self::Node, out: &mut Vec<(Self::Node, f32)>);

    /// Admissible estimate of the remaining cost from `from` to `to`.
    fn heuristic(&self, from: Self::Node, to: Self::Node) -> f32;
}

/// A search strategy over a `SearchGraph`.
pub trait PathSolver<G: SearchGraph> {
    /// Find a path from `start` to `goal`, inclusive of both ends.
    fn solve(&mut self, graph: &G, start: G::Node, goal: G::Node) -> Option<PathResult<G::Node>>;
}

/// The result of a successful search.
#[derive(Clone, Debug, PartialEq)]
pub struct PathResult<N> {
    /// Sequence of nodes from start to goal (inclusive).
    pub nodes: Vec<N>,
    /// Total traversal cost.
    pub total_cost: f32,
}

// ---------------------------------------------------------------------------
// NavMesh adapter
// ---------------------------------------------------------------------------

impl SearchGraph for NavMesh {
    type Node = AreaId;

    fn node_count(&self) -> usize {
        self.area_count()
    }

    fn node_index(&self, node: AreaId) -> Option<usize> {
        self.index_of(node)
    }

    fn successors(&self, node: AreaId, out: &mut Vec<(AreaId, f32)>) {
        let Some(area) = self.area_by_id(node) else {
            return;
        };
        let from = area.center();
        for id in area.neighbor_ids() {
            // Dangling connections are skipped, not fatal.
            if let Some(next) = self.area_by_id(id) {
                out.push((id, from.distance_2d(next.center())));
            }
        }
    }

    fn heuristic(&self, from: AreaId, to: AreaId) -> f32 {
        match (self.area_by_id(from), self.area_by_id(to)) {
            (Some(a), Some(b)) => a.center().distance_2d(b.center()),
            _ => 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// A*
// ---------------------------------------------------------------------------

/// Entry in the A* open set (min-heap via reversed ordering).
struct OpenEntry {
    index: usize,
    f_score: f32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f_score.total_cmp(&other.f_score) == Ordering::Equal && self.index == other.index
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: smallest f_score is "greatest".
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// A* search with reusable scratch buffers.
#[derive(Default)]
pub struct AStar {
    g_score: Vec<f32>,
    /// came_from[i] = index of the node we reached `i` from.
    came_from: Vec<Option<usize>>,
    closed: Vec<bool>,
    open: BinaryHeap<OpenEntry>,
}

impl AStar {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, n: usize) {
        self.g_score.clear();
        self.g_score.resize(n, f32::INFINITY);
        self.came_from.clear();
        self.came_from.resize(n, None);
        self.closed.clear();
        self.closed.resize(n, false);
        self.open.clear();
    }
}

impl<G: SearchGraph> PathSolver<G> for AStar {
    fn solve(
        &mut self,
        graph: &G,
        start: G::Node,
        goal: G::Node,
    ) -> Option<PathResult<G::Node>> {
        let n = graph.node_count();
        let start_index = graph.node_index(start)?;
        let goal_index = graph.node_index(goal)?;
        if start_index >= n || goal_index >= n {
            return None;
        }
        if start == goal {
            return Some(PathResult {
                nodes: vec![start],
                total_cost: 0.0,
            });
        }

        self.reset(n);
        self.g_score[start_index] = 0.0;
        self.open.push(OpenEntry {
            index: start_index,
            f_score: graph.heuristic(start, goal),
        });
        // Node value for each index we've touched, so the heap can carry
        // plain indices.
        let mut node_at: Vec<Option<G::Node>> = vec![None; n];
        node_at[start_index] = Some(start);
        let mut successors = Vec::new();

        while let Some(current) = self.open.pop() {
            let ci = current.index;
            if ci == goal_index {
                return Some(self.reconstruct_path(&node_at, start_index, goal_index));
            }
            if self.closed[ci] {
                continue;
            }
            self.closed[ci] = true;

            let Some(current_node) = node_at[ci] else {
                continue;
            };
            let current_g = self.g_score[ci];

            successors.clear();
            graph.successors(current_node, &mut successors);
            for &(neighbor, cost) in &successors {
                let Some(ni) = graph.node_index(neighbor) else {
                    continue;
                };
                if ni >= n || self.closed[ni] {
                    continue;
                }

                let tentative_g = current_g + cost;
                if tentative_g < self.g_score[ni] {
                    self.g_score[ni] = tentative_g;
                    self.came_from[ni] = Some(ci);
                    node_at[ni] = Some(neighbor);
                    let f = tentative_g + graph.heuristic(neighbor, goal);
                    self.open.push(OpenEntry { index: ni, f_score: f });
                }
            }
        }

        None // No path found.
    }
}

impl AStar {
    /// Walk came-from links back from the goal.
    fn reconstruct_path<N: Copy>(
        &self,
        node_at: &[Option<N>],
        start_index: usize,
        goal_index: usize,
    ) -> PathResult<N> {
        let mut nodes = Vec::new();
        let mut index = goal_index;
        loop {
            if let Some(node) = node_at[index] {
                nodes.push(node);
            }
            if index == start_index {
                break;
            }
            match self.came_from[index] {
                Some(prev) => index = prev,
                None => break,
            }
        }
        nodes.reverse();
        PathResult {
            nodes,
            total_cost: self.g_score[goal_index],
        }
    }
}
