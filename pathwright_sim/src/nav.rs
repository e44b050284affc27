// Navigation mesh: the static per-map graph of walkable areas.
//
// A `NavMesh` is a set of `Area`s (axis-aligned footprints with four corner
// elevations) connected by directed, direction-bucketed adjacency lists, plus
// the `Ladder` connectors authored alongside them. The mesh is built once per
// map, either in code via `NavMesh::new()` or from its JSON form, and is
// read-only afterwards. Many navigators share one `&NavMesh`.
//
// Besides id lookup the mesh answers the spatial queries the navigator needs:
// which area a point is standing in (`best_area_from_xyz`), which area is the
// nearest plausible goal for a point (`nearest_area_2d`, `resolve_goal_area`),
// and where to explore next (`pick_exploration_goal`).
//
// Storage is a `Vec<Area>` in authored order plus an `FxHashMap` from id to
// index. Iteration always walks the `Vec`, so every query is deterministic
// and ties resolve to the earliest-authored area. The index is transient and
// rebuilt after deserialization.
//
// See also: `pathfinding.rs` for the `SearchGraph` impl that lets A* walk
// this mesh, `planner.rs` which turns searches into routes, `config.rs` for
// the `MeshParams` consulted by the height-aware queries.

use crate::config::MeshParams;
use crate::error::MeshError;
use crate::route::VisitedAreas;
use crate::types::{AreaId, LadderId, Vec3};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ---------------------------------------------------------------------------
// Area attributes
// ---------------------------------------------------------------------------

/// Generic mesh attribute bit marking an area as a navigation blocker.
pub const NAV_BLOCKER_ATTRIBUTE: u32 = 0x8000_0000;

/// Game-specific traversal flags carried by an area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaFlags(pub u32);

impl AreaFlags {
    pub const BLOCKED: AreaFlags = AreaFlags(0x0000_0001);
    pub const SPAWN_ROOM_RED: AreaFlags = AreaFlags(0x0000_0002);
    pub const SPAWN_ROOM_BLUE: AreaFlags = AreaFlags(0x0000_0004);
    pub const SPAWN_ROOM_EXIT: AreaFlags = AreaFlags(0x0000_0008);
    pub const BLUE_SETUP_GATE: AreaFlags = AreaFlags(0x0000_0800);
    pub const RED_SETUP_GATE: AreaFlags = AreaFlags(0x0000_1000);
    pub const BLOCKED_AFTER_POINT_CAPTURE: AreaFlags = AreaFlags(0x0000_2000);
    pub const BLOCKED_UNTIL_POINT_CAPTURE: AreaFlags = AreaFlags(0x0000_4000);
    pub const BLUE_ONE_WAY_DOOR: AreaFlags = AreaFlags(0x0000_8000);
    pub const RED_ONE_WAY_DOOR: AreaFlags = AreaFlags(0x0001_0000);
    pub const NO_SPAWNING: AreaFlags = AreaFlags(0x0200_0000);

    /// Flags that make an area unusable as a goal. Spawn-room exits and
    /// no-spawning areas are ordinary walkable space and stay eligible.
    pub const BAD_GOAL: AreaFlags = AreaFlags(
        Self::BLOCKED.0
            | Self::SPAWN_ROOM_RED.0
            | Self::SPAWN_ROOM_BLUE.0
            | Self::BLUE_SETUP_GATE.0
            | Self::RED_SETUP_GATE.0
            | Self::BLOCKED_AFTER_POINT_CAPTURE.0
            | Self::BLOCKED_UNTIL_POINT_CAPTURE.0
            | Self::BLUE_ONE_WAY_DOOR.0
            | Self::RED_ONE_WAY_DOOR.0,
    );

    pub const fn empty() -> Self {
        AreaFlags(0)
    }

    pub const fn union(self, other: AreaFlags) -> AreaFlags {
        AreaFlags(self.0 | other.0)
    }

    pub fn intersects(self, other: AreaFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn contains(self, other: AreaFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Compass direction of an adjacency bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];
}

// ---------------------------------------------------------------------------
// Area
// ---------------------------------------------------------------------------

/// One walkable region of the mesh.
///
/// The footprint is the axis-aligned rectangle spanned by the `nw` and `se`
/// corners (whichever way round they were authored). Each of the four
/// corners carries its own elevation: `nw.z`, `se.z`, `ne_z`, `sw_z`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub nw: Vec3,
    pub se: Vec3,
    pub ne_z: f32,
    pub sw_z: f32,
    /// Outgoing connections, one bucket per `Direction`. Not guaranteed
    /// symmetric: `a -> b` does not imply `b -> a`.
    #[serde(default)]
    pub connections: [SmallVec<[AreaId; 4]>; 4],
    /// Generic mesh attribute bits (see `NAV_BLOCKER_ATTRIBUTE`).
    #[serde(default)]
    pub attributes: u32,
    #[serde(default)]
    pub flags: AreaFlags,
    #[serde(default)]
    pub ladders_up: Vec<LadderId>,
    #[serde(default)]
    pub ladders_down: Vec<LadderId>,
}

impl Area {
    /// A flat rectangular area at height `z` spanning `min`..`max` in XY.
    pub fn flat(id: AreaId, min_x: f32, min_y: f32, max_x: f32, max_y: f32, z: f32) -> Self {
        Self {
            id,
            nw: Vec3::new(min_x, max_y, z),
            se: Vec3::new(max_x, min_y, z),
            ne_z: z,
            sw_z: z,
            connections: Default::default(),
            attributes: 0,
            flags: AreaFlags::empty(),
            ladders_up: Vec::new(),
            ladders_down: Vec::new(),
        }
    }

    /// Add a one-way connection to `to` in the given direction bucket.
    pub fn connect(&mut self, dir: Direction, to: AreaId) {
        let bucket = &mut self.connections[dir as usize];
        if !bucket.contains(&to) {
            bucket.push(to);
        }
    }

    /// Planar midpoint of the footprint; Z is the mean of the four corners.
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            0.5 * (self.nw.x + self.se.x),
            0.5 * (self.nw.y + self.se.y),
            0.25 * (self.nw.z + self.se.z + self.ne_z + self.sw_z),
        )
    }

    /// `(min_x, min_y, max_x, max_y)` of the footprint.
    pub fn bounds_xy(&self) -> (f32, f32, f32, f32) {
        (
            self.nw.x.min(self.se.x),
            self.nw.y.min(self.se.y),
            self.nw.x.max(self.se.x),
            self.nw.y.max(self.se.y),
        )
    }

    /// Lowest and highest corner elevation.
    pub fn min_max_z(&self) -> (f32, f32) {
        let zs = [self.nw.z, self.se.z, self.ne_z, self.sw_z];
        let min = zs.iter().copied().fold(f32::INFINITY, f32::min);
        let max = zs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        (min, max)
    }

    /// Whether the point's XY lies inside the footprint (edges inclusive).
    pub fn contains_xy(&self, point: Vec3) -> bool {
        let (min_x, min_y, max_x, max_y) = self.bounds_xy();
        point.x >= min_x && point.x <= max_x && point.y >= min_y && point.y <= max_y
    }

    /// Floor height at (x, y), bilinearly interpolated between the four
    /// corners. Points outside the footprint are clamped onto it. A
    /// degenerate (zero-width) axis samples its midpoint.
    pub fn sample_z_at_xy(&self, x: f32, y: f32) -> f32 {
        let (min_x, min_y, max_x, max_y) = self.bounds_xy();
        let tx = if max_x > min_x {
            (x.clamp(min_x, max_x) - min_x) / (max_x - min_x)
        } else {
            0.5
        };
        let ty = if max_y > min_y {
            (y.clamp(min_y, max_y) - min_y) / (max_y - min_y)
        } else {
            0.5
        };
        // SW = (min_x, min_y), SE = (max_x, min_y), NW = (min_x, max_y),
        // NE = (max_x, max_y).
        let along_min_y = self.sw_z * (1.0 - tx) + self.se.z * tx;
        let along_max_y = self.nw.z * (1.0 - tx) + self.ne_z * tx;
        along_min_y * (1.0 - ty) + along_max_y * ty
    }

    /// The point of the footprint closest to `target` in the plane, with Z
    /// sampled from the floor there.
    pub fn closest_point_to(&self, target: Vec3) -> Vec3 {
        let (min_x, min_y, max_x, max_y) = self.bounds_xy();
        let x = target.x.clamp(min_x, max_x);
        let y = target.y.clamp(min_y, max_y);
        Vec3::new(x, y, self.sample_z_at_xy(x, y))
    }

    /// Whether this area must never be chosen as a goal.
    pub fn is_disallowed_for_goal(&self) -> bool {
        self.flags.intersects(AreaFlags::BAD_GOAL) || self.attributes & NAV_BLOCKER_ATTRIBUTE != 0
    }

    /// All outgoing connections, bucket by bucket.
    pub fn neighbor_ids(&self) -> impl Iterator<Item = AreaId> + '_ {
        self.connections.iter().flat_map(|bucket| bucket.iter().copied())
    }
}

// ---------------------------------------------------------------------------
// Ladder
// ---------------------------------------------------------------------------

/// A climbable connector between areas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ladder {
    pub id: LadderId,
    pub width: f32,
    pub top: Vec3,
    pub bottom: Vec3,
    pub length: f32,
    /// Direction the climber faces.
    pub direction: Direction,
    #[serde(default)]
    pub dangling: bool,
    #[serde(default)]
    pub top_forward_area: AreaId,
    #[serde(default)]
    pub top_left_area: AreaId,
    #[serde(default)]
    pub top_right_area: AreaId,
    #[serde(default)]
    pub top_behind_area: AreaId,
    #[serde(default)]
    pub bottom_area: AreaId,
}

// ---------------------------------------------------------------------------
// NavMesh
// ---------------------------------------------------------------------------

/// The loaded mesh for one map.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NavMesh {
    pub map_name: String,
    areas: Vec<Area>,
    #[serde(default)]
    ladders: Vec<Ladder>,
    /// Area id -> index into `areas`. Rebuilt after deserialization.
    #[serde(skip)]
    index_by_id: FxHashMap<AreaId, usize>,
    #[serde(skip)]
    ladder_index_by_id: FxHashMap<LadderId, usize>,
}

impl NavMesh {
    /// Build a mesh, rejecting zero or duplicate area ids. Connections to
    /// areas that don't exist are tolerated (lookups simply miss); use
    /// `validate_connections` to reject them.
    pub fn new(
        map_name: impl Into<String>,
        areas: Vec<Area>,
        ladders: Vec<Ladder>,
    ) -> Result<Self, MeshError> {
        let mut mesh = Self {
            map_name: map_name.into(),
            areas,
            ladders,
            index_by_id: FxHashMap::default(),
            ladder_index_by_id: FxHashMap::default(),
        };
        mesh.rebuild_index()?;
        Ok(mesh)
    }

    /// A flat `cols` x `rows` grid of square areas at z = 0, each connected
    /// both ways to its four-way neighbours. Ids run row-major from 1 and
    /// the grid's south-west corner sits at the origin.
    pub fn grid(
        map_name: impl Into<String>,
        cols: u32,
        rows: u32,
        cell_size: f32,
    ) -> Result<Self, MeshError> {
        let id_at = |col: u32, row: u32| AreaId(row * cols + col + 1);
        let mut areas = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let x = col as f32 * cell_size;
                let y = row as f32 * cell_size;
                let mut area =
                    Area::flat(id_at(col, row), x, y, x + cell_size, y + cell_size, 0.0);
                if row + 1 < rows {
                    area.connect(Direction::North, id_at(col, row + 1));
                }
                if col + 1 < cols {
                    area.connect(Direction::East, id_at(col + 1, row));
                }
                if row > 0 {
                    area.connect(Direction::South, id_at(col, row - 1));
                }
                if col > 0 {
                    area.connect(Direction::West, id_at(col - 1, row));
                }
                areas.push(area);
            }
        }
        Self::new(map_name, areas, Vec::new())
    }

    fn rebuild_index(&mut self) -> Result<(), MeshError> {
        self.index_by_id.clear();
        self.index_by_id.reserve(self.areas.len());
        for (i, area) in self.areas.iter().enumerate() {
            if area.id.is_none() {
                return Err(MeshError::ZeroAreaId);
            }
            if self.index_by_id.insert(area.id, i).is_some() {
                return Err(MeshError::DuplicateAreaId { id: area.id });
            }
        }
        self.ladder_index_by_id = self
            .ladders
            .iter()
            .enumerate()
            .map(|(i, ladder)| (ladder.id, i))
            .collect();
        Ok(())
    }

    /// Reject any connection that names an area not in the mesh.
    pub fn validate_connections(&self) -> Result<(), MeshError> {
        for area in &self.areas {
            for to in area.neighbor_ids() {
                if !self.index_by_id.contains_key(&to) {
                    return Err(MeshError::DanglingConnection { from: area.id, to });
                }
            }
        }
        Ok(())
    }

    /// Load a mesh from its JSON form. The id index is rebuilt and validated.
    pub fn from_json(json: &str) -> Result<Self, MeshError> {
        let mut mesh: NavMesh = serde_json::from_str(json)?;
        mesh.rebuild_index()?;
        Ok(mesh)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn ladders(&self) -> &[Ladder] {
        &self.ladders
    }

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Position of an area in authored order. Used by the search adapter.
    pub fn index_of(&self, id: AreaId) -> Option<usize> {
        self.index_by_id.get(&id).copied()
    }

    /// O(1) lookup. Id 0 and unknown ids return `None`.
    pub fn area_by_id(&self, id: AreaId) -> Option<&Area> {
        if id.is_none() {
            return None;
        }
        self.index_of(id).and_then(|i| self.areas.get(i))
    }

    pub fn ladder_by_id(&self, id: LadderId) -> Option<&Ladder> {
        self.ladder_index_by_id
            .get(&id)
            .and_then(|&i| self.ladders.get(i))
    }

    /// Outgoing connections of `id` (empty for unknown ids).
    pub fn neighbors(&self, id: AreaId) -> impl Iterator<Item = AreaId> + '_ {
        self.area_by_id(id)
            .into_iter()
            .flat_map(|area| area.neighbor_ids())
    }

    /// True iff `b` appears in any of `a`'s direction buckets.
    pub fn connected(&self, a: AreaId, b: AreaId) -> bool {
        self.area_by_id(a)
            .is_some_and(|area| area.connections.iter().any(|bucket| bucket.contains(&b)))
    }

    /// Nearest area to `point` by planar distance between `point` and area
    /// centers. Skips goal-disallowed areas and areas whose floor is more
    /// than `jump_height + z_slop` above the point.
    pub fn nearest_area_2d(&self, point: Vec3, params: &MeshParams) -> Option<&Area> {
        let reach = params.jump_height + params.z_slop;
        let mut best: Option<(&Area, f32)> = None;
        for area in &self.areas {
            if area.is_disallowed_for_goal() {
                continue;
            }
            let (min_z, _) = area.min_max_z();
            if min_z - point.z > reach {
                continue;
            }
            let d2 = point.distance_squared_2d(area.center());
            if best.is_none_or(|(_, best_d2)| d2 < best_d2) {
                best = Some((area, d2));
            }
        }
        best.map(|(area, _)| area)
    }

    /// The area `point` is standing in. Only areas whose footprint contains
    /// the point's XY are considered, in three tiers:
    /// 1. the point's Z is within `z_slop` of the area's height range
    ///    (smallest distance to the clamped range wins);
    /// 2. the point's Z plus `jump_height` is within that window;
    /// 3. otherwise, the smallest vertical gap to the height range.
    pub fn best_area_from_xyz(&self, point: Vec3, params: &MeshParams) -> Option<&Area> {
        let slop = params.z_slop;
        let mut best_in: Option<(&Area, f32)> = None;
        let mut best_jump: Option<(&Area, f32)> = None;
        let mut best_overlap: Option<(&Area, f32)> = None;

        for area in &self.areas {
            if !area.contains_xy(point) {
                continue;
            }
            let (min_z, max_z) = area.min_max_z();

            if point.z >= min_z - slop && point.z <= max_z + slop {
                let dz = (point.z - point.z.clamp(min_z, max_z)).abs();
                if best_in.is_none_or(|(_, best)| dz < best) {
                    best_in = Some((area, dz));
                }
                continue;
            }

            let zj = point.z + params.jump_height;
            if zj >= min_z - slop && zj <= max_z + slop {
                let dz = (zj - zj.clamp(min_z, max_z)).abs();
                if best_jump.is_none_or(|(_, best)| dz < best) {
                    best_jump = Some((area, dz));
                }
            }

            let gap = if point.z < min_z {
                min_z - point.z
            } else if point.z > max_z {
                point.z - max_z
            } else {
                0.0
            };
            if best_overlap.is_none_or(|(_, best)| gap < best) {
                best_overlap = Some((area, gap));
            }
        }

        best_in.or(best_jump).or(best_overlap).map(|(area, _)| area)
    }

    /// Choose an exploration target: the goal-eligible area (other than
    /// `from`) whose center is farthest from `point` in the plane and that
    /// is not in `visited`. When every candidate has been visited, the
    /// farthest candidate regardless of history. Returns `AreaId::NONE` only
    /// when `from` is none or no other eligible area exists.
    pub fn pick_exploration_goal(
        &self,
        from: AreaId,
        point: Vec3,
        visited: &VisitedAreas,
    ) -> AreaId {
        if from.is_none() {
            return AreaId::NONE;
        }
        let mut best_fresh: Option<(AreaId, f32)> = None;
        let mut best_any: Option<(AreaId, f32)> = None;
        for area in &self.areas {
            if area.id == from || area.is_disallowed_for_goal() {
                continue;
            }
            let d2 = point.distance_squared_2d(area.center());
            if best_any.is_none_or(|(_, best)| d2 > best) {
                best_any = Some((area.id, d2));
            }
            if !visited.contains(area.id) && best_fresh.is_none_or(|(_, best)| d2 > best) {
                best_fresh = Some((area.id, d2));
            }
        }
        best_fresh
            .or(best_any)
            .map_or(AreaId::NONE, |(id, _)| id)
    }

    /// Map a goal point to the area a route should end in: nearest eligible
    /// area in the plane, falling back to the area containing the point. If
    /// that area is goal-disallowed, its nearest eligible neighbour (by
    /// center distance) is used instead when one exists.
    pub fn resolve_goal_area(&self, point: Vec3, params: &MeshParams) -> Option<&Area> {
        let area = self
            .nearest_area_2d(point, params)
            .or_else(|| self.best_area_from_xyz(point, params))?;
        if !area.is_disallowed_for_goal() {
            return Some(area);
        }
        let center = area.center();
        let substitute = area
            .neighbor_ids()
            .filter_map(|id| self.area_by_id(id))
            .filter(|n| !n.is_disallowed_for_goal())
            .map(|n| (n, center.distance_squared_2d(n.center())))
            .fold(None::<(&Area, f32)>, |best, (n, d2)| match best {
                Some((_, best_d2)) if best_d2 <= d2 => best,
                _ => Some((n, d2)),
            });
        Some(substitute.map_or(area, |(n, _)| n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> MeshParams {
        MeshParams::default()
    }

    /// Three 100x100 tiles in a row along +X at z = 0: 1 <-> 2 -> 3.
    fn strip() -> NavMesh {
        let mut a = Area::flat(AreaId(1), 0.0, 0.0, 100.0, 100.0, 0.0);
        let mut b = Area::flat(AreaId(2), 100.0, 0.0, 200.0, 100.0, 0.0);
        let c = Area::flat(AreaId(3), 200.0, 0.0, 300.0, 100.0, 0.0);
        a.connect(Direction::East, AreaId(2));
        b.connect(Direction::West, AreaId(1));
        b.connect(Direction::East, AreaId(3));
        NavMesh::new("strip", vec![a, b, c], Vec::new()).unwrap()
    }

    #[test]
    fn new_rejects_zero_and_duplicate_ids() {
        let zero = Area::flat(AreaId::NONE, 0.0, 0.0, 1.0, 1.0, 0.0);
        assert!(matches!(
            NavMesh::new("m", vec![zero], Vec::new()),
            Err(MeshError::ZeroAreaId)
        ));

        let a = Area::flat(AreaId(4), 0.0, 0.0, 1.0, 1.0, 0.0);
        let b = Area::flat(AreaId(4), 1.0, 0.0, 2.0, 1.0, 0.0);
        assert!(matches!(
            NavMesh::new("m", vec![a, b], Vec::new()),
            Err(MeshError::DuplicateAreaId { id: AreaId(4) })
        ));
    }

    #[test]
    fn area_lookup_misses_on_zero_and_unknown() {
        let mesh = strip();
        assert_eq!(mesh.area_by_id(AreaId(2)).map(|a| a.id), Some(AreaId(2)));
        assert!(mesh.area_by_id(AreaId::NONE).is_none());
        assert!(mesh.area_by_id(AreaId(99)).is_none());
    }

    #[test]
    fn grid_connects_four_way_neighbours() {
        let mesh = NavMesh::grid("grid", 3, 2, 100.0).unwrap();
        assert_eq!(mesh.area_count(), 6);
        // Row-major ids: 1 2 3 on the bottom row, 4 5 6 above.
        assert!(mesh.connected(AreaId(1), AreaId(2)));
        assert!(mesh.connected(AreaId(2), AreaId(1)));
        assert!(mesh.connected(AreaId(2), AreaId(5)));
        assert!(!mesh.connected(AreaId(3), AreaId(4)));
        assert_eq!(mesh.neighbors(AreaId(5)).count(), 3);
        assert!(mesh.validate_connections().is_ok());
        assert_eq!(
            mesh.area_by_id(AreaId(6)).map(|a| a.center()),
            Some(Vec3::new(250.0, 150.0, 0.0))
        );
    }

    #[test]
    fn connected_is_directional() {
        let mesh = strip();
        assert!(mesh.connected(AreaId(1), AreaId(2)));
        assert!(mesh.connected(AreaId(2), AreaId(1)));
        assert!(mesh.connected(AreaId(2), AreaId(3)));
        assert!(!mesh.connected(AreaId(3), AreaId(2)));
        assert!(!mesh.connected(AreaId(1), AreaId(3)));
        assert!(!mesh.connected(AreaId(42), AreaId(1)));
    }

    #[test]
    fn dangling_connections_fail_strict_validation() {
        let mut a = Area::flat(AreaId(1), 0.0, 0.0, 1.0, 1.0, 0.0);
        a.connect(Direction::North, AreaId(7));
        let mesh = NavMesh::new("m", vec![a], Vec::new()).unwrap();
        assert!(!mesh.connected(AreaId(7), AreaId(1)));
        assert!(matches!(
            mesh.validate_connections(),
            Err(MeshError::DanglingConnection {
                from: AreaId(1),
                to: AreaId(7)
            })
        ));
        assert!(strip().validate_connections().is_ok());
    }

    #[test]
    fn center_averages_corner_heights() {
        let mut area = Area::flat(AreaId(1), 0.0, 0.0, 100.0, 50.0, 0.0);
        area.nw.z = 40.0;
        area.ne_z = 40.0;
        let c = area.center();
        assert_eq!((c.x, c.y, c.z), (50.0, 25.0, 20.0));
        assert_eq!(area.min_max_z(), (0.0, 40.0));
    }

    #[test]
    fn sample_z_interpolates_a_ramp_and_clamps() {
        // Ramp rising toward +Y: south edge at 0, north edge at 100.
        let mut area = Area::flat(AreaId(1), 0.0, 0.0, 100.0, 100.0, 0.0);
        area.nw.z = 100.0;
        area.ne_z = 100.0;
        assert_eq!(area.sample_z_at_xy(50.0, 0.0), 0.0);
        assert_eq!(area.sample_z_at_xy(50.0, 100.0), 100.0);
        assert_eq!(area.sample_z_at_xy(10.0, 25.0), 25.0);
        // Outside the footprint the sample clamps to the nearest edge.
        assert_eq!(area.sample_z_at_xy(50.0, 500.0), 100.0);

        let p = area.closest_point_to(Vec3::new(-20.0, 75.0, 0.0));
        assert_eq!((p.x, p.y, p.z), (0.0, 75.0, 75.0));
    }

    #[test]
    fn degenerate_footprint_samples_midpoint() {
        let mut line = Area::flat(AreaId(1), 10.0, 0.0, 10.0, 100.0, 0.0);
        line.se.z = 20.0;
        line.ne_z = 20.0;
        // tx is pinned at 0.5 so the sample sits halfway between west and east.
        assert_eq!(line.sample_z_at_xy(10.0, 0.0), 10.0);
    }

    #[test]
    fn bad_goal_mask_excludes_exits_and_no_spawn() {
        let mut area = Area::flat(AreaId(1), 0.0, 0.0, 1.0, 1.0, 0.0);
        area.flags = AreaFlags::SPAWN_ROOM_EXIT.union(AreaFlags::NO_SPAWNING);
        assert!(!area.is_disallowed_for_goal());
        area.flags = AreaFlags::RED_ONE_WAY_DOOR;
        assert!(area.is_disallowed_for_goal());
        area.flags = AreaFlags::empty();
        area.attributes = NAV_BLOCKER_ATTRIBUTE;
        assert!(area.is_disallowed_for_goal());
    }

    #[test]
    fn nearest_area_2d_skips_disallowed_and_unreachable() {
        let mut areas = vec![
            Area::flat(AreaId(1), 0.0, 0.0, 100.0, 100.0, 0.0),
            Area::flat(AreaId(2), 100.0, 0.0, 200.0, 100.0, 0.0),
            // High ledge directly over the query point.
            Area::flat(AreaId(3), 0.0, 0.0, 100.0, 100.0, 200.0),
        ];
        areas[0].flags = AreaFlags::BLOCKED;
        let mesh = NavMesh::new("m", areas, Vec::new()).unwrap();
        let found = mesh.nearest_area_2d(Vec3::new(50.0, 50.0, 0.0), &params());
        assert_eq!(found.map(|a| a.id), Some(AreaId(2)));

        assert!(NavMesh::default()
            .nearest_area_2d(Vec3::ZERO, &params())
            .is_none());
    }

    #[test]
    fn best_area_prefers_direct_containment_then_jump_then_overlap() {
        let floor = Area::flat(AreaId(1), 0.0, 0.0, 100.0, 100.0, 0.0);
        let balcony = Area::flat(AreaId(2), 0.0, 0.0, 100.0, 100.0, 140.0);
        let mesh = NavMesh::new("m", vec![floor, balcony], Vec::new()).unwrap();
        let p = params();

        let on_floor = mesh.best_area_from_xyz(Vec3::new(50.0, 50.0, 10.0), &p);
        assert_eq!(on_floor.map(|a| a.id), Some(AreaId(1)));
        let on_balcony = mesh.best_area_from_xyz(Vec3::new(50.0, 50.0, 140.0), &p);
        assert_eq!(on_balcony.map(|a| a.id), Some(AreaId(2)));

        // 60 above the floor: outside both slop windows. The floor has the
        // smaller vertical gap, but a jump reaches the balcony band first.
        let mid_air = mesh.best_area_from_xyz(Vec3::new(50.0, 50.0, 60.0), &p);
        assert_eq!(mid_air.map(|a| a.id), Some(AreaId(2)));

        // Far below both: the nearest height range wins.
        let below = mesh.best_area_from_xyz(Vec3::new(50.0, 50.0, -500.0), &p);
        assert_eq!(below.map(|a| a.id), Some(AreaId(1)));

        assert!(mesh
            .best_area_from_xyz(Vec3::new(500.0, 50.0, 0.0), &p)
            .is_none());
    }

    #[test]
    fn exploration_prefers_farthest_unvisited() {
        let mesh = strip();
        let mut visited = VisitedAreas::new(8);
        let here = Vec3::new(50.0, 50.0, 0.0);
        assert_eq!(mesh.pick_exploration_goal(AreaId(1), here, &visited), AreaId(3));

        visited.insert(AreaId(3));
        assert_eq!(mesh.pick_exploration_goal(AreaId(1), here, &visited), AreaId(2));
    }

    #[test]
    fn exploration_falls_back_to_farthest_when_all_visited() {
        let mesh = strip();
        let mut visited = VisitedAreas::new(8);
        for id in [1, 2, 3] {
            visited.insert(AreaId(id));
        }
        let here = Vec3::new(50.0, 50.0, 0.0);
        assert_eq!(mesh.pick_exploration_goal(AreaId(1), here, &visited), AreaId(3));
        assert_eq!(
            mesh.pick_exploration_goal(AreaId::NONE, here, &visited),
            AreaId::NONE
        );

        let lonely = NavMesh::new(
            "m",
            vec![Area::flat(AreaId(1), 0.0, 0.0, 1.0, 1.0, 0.0)],
            Vec::new(),
        )
        .unwrap();
        assert_eq!(
            lonely.pick_exploration_goal(AreaId(1), here, &visited),
            AreaId::NONE
        );
    }

    #[test]
    fn resolve_goal_area_substitutes_allowed_neighbour() {
        // Only area 1 contains the point but it is a spawn room; the
        // nearest-2d pass skips it and lands on 2 directly.
        let mut mesh = strip();
        mesh.areas[0].flags = AreaFlags::SPAWN_ROOM_RED;
        mesh.rebuild_index().unwrap();
        let found = mesh.resolve_goal_area(Vec3::new(50.0, 50.0, 0.0), &params());
        assert_eq!(found.map(|a| a.id), Some(AreaId(2)));

        // When every area is too high for nearest-2d, the containing area is
        // used, and swapped for its allowed neighbour if it is disallowed.
        let mut low = Area::flat(AreaId(1), 0.0, 0.0, 100.0, 100.0, 500.0);
        low.flags = AreaFlags::BLOCKED;
        low.connect(Direction::East, AreaId(2));
        let side = Area::flat(AreaId(2), 100.0, 0.0, 200.0, 100.0, 500.0);
        let mesh = NavMesh::new("m", vec![low, side], Vec::new()).unwrap();
        let found = mesh.resolve_goal_area(Vec3::new(50.0, 50.0, 0.0), &params());
        assert_eq!(found.map(|a| a.id), Some(AreaId(2)));
    }

    #[test]
    fn mesh_json_rebuilds_index() {
        let mut mesh = strip();
        mesh.ladders.push(Ladder {
            id: LadderId(9),
            width: 20.0,
            top: Vec3::new(0.0, 0.0, 100.0),
            bottom: Vec3::ZERO,
            length: 100.0,
            direction: Direction::North,
            dangling: false,
            top_forward_area: AreaId(2),
            top_left_area: AreaId::NONE,
            top_right_area: AreaId::NONE,
            top_behind_area: AreaId::NONE,
            bottom_area: AreaId(1),
        });
        let json = mesh.to_json().unwrap();
        let restored = NavMesh::from_json(&json).unwrap();
        assert_eq!(restored.map_name, "strip");
        assert!(restored.connected(AreaId(2), AreaId(3)));
        assert_eq!(
            restored.ladder_by_id(LadderId(9)).map(|l| l.bottom_area),
            Some(AreaId(1))
        );
    }

    #[test]
    fn mesh_json_accepts_sparse_areas() {
        let json = r#"{
            "map_name": "cp_tiny",
            "areas": [
                { "id": 5, "nw": {"x":0,"y":10,"z":0}, "se": {"x":10,"y":0,"z":0},
                  "ne_z": 0, "sw_z": 0, "connections": [[6],[],[],[]] },
                { "id": 6, "nw": {"x":10,"y":10,"z":0}, "se": {"x":20,"y":0,"z":0},
                  "ne_z": 0, "sw_z": 0 }
            ]
        }"#;
        let mesh = NavMesh::from_json(json).unwrap();
        assert_eq!(mesh.area_count(), 2);
        assert!(mesh.connected(AreaId(5), AreaId(6)));
        assert_eq!(mesh.neighbors(AreaId(5)).collect::<Vec<_>>(), vec![AreaId(6)]);
    }
}
