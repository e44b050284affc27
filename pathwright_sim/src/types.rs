// Core types shared across the navigation library.
//
// Defines world-space positions (`Vec3`), strongly-typed mesh identifiers
// (`AreaId`, `LadderId`), team and actor identifiers, and the small set of
// angle helpers the locomotion controller needs. All types derive
// `Serialize`/`Deserialize` so meshes, snapshots, and configs can round-trip
// through JSON.
//
// Conventions follow the host world the meshes are authored for:
// - X/Y span the ground plane, Z is up.
// - Yaw is measured in degrees, counter-clockwise from +X, normalized to
//   the half-open range (-180, 180].
// - Pitch is in degrees, positive looking down.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A point or displacement in world space, in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared distance in the ground plane, ignoring Z.
    pub fn distance_squared_2d(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance in the ground plane, ignoring Z.
    pub fn distance_2d(self, other: Self) -> f32 {
        self.distance_squared_2d(other).sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        let dz = self.z - other.z;
        (self.distance_squared_2d(other) + dz * dz).sqrt()
    }

    /// Planar bearing from `self` toward `other`, in degrees.
    pub fn bearing_to(self, other: Self) -> f32 {
        (other.y - self.y).atan2(other.x - self.x).to_degrees()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// Wrap an angle in degrees into (-180, 180].
pub fn wrap_degrees(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    }
    if a <= -180.0 {
        a += 360.0;
    }
    a
}

// ---------------------------------------------------------------------------
// Mesh identifiers
// ---------------------------------------------------------------------------

/// Identifier of a navigation area, stable within one loaded mesh.
///
/// Id 0 is reserved: it never names a real area and is used throughout as
/// "no area" (e.g. a route whose goal is `AreaId::NONE` is inactive).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AreaId(pub u32);

impl AreaId {
    pub const NONE: AreaId = AreaId(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn is_some(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a ladder connector.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LadderId(pub u32);

// ---------------------------------------------------------------------------
// World identifiers
// ---------------------------------------------------------------------------

/// Opaque actor identifier handed out by the world.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ActorId(pub u32);

/// Team number as reported by the world. Two actors are opponents when
/// their teams differ.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Team(pub u8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_distance_ignores_height() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 100.0);
        assert_eq!(a.distance_squared_2d(b), 25.0);
        assert_eq!(a.distance_2d(b), 5.0);
        assert!(a.distance(b) > 100.0);
    }

    #[test]
    fn wrap_degrees_stays_in_half_open_range() {
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(-180.0), 180.0);
        assert_eq!(wrap_degrees(720.0 + 45.0), 45.0);
    }

    #[test]
    fn bearing_points_along_axes() {
        let o = Vec3::ZERO;
        assert_eq!(o.bearing_to(Vec3::new(10.0, 0.0, 0.0)), 0.0);
        assert!((o.bearing_to(Vec3::new(0.0, 10.0, 0.0)) - 90.0).abs() < 1e-4);
    }

    #[test]
    fn area_id_zero_is_none() {
        assert!(AreaId::NONE.is_none());
        assert!(AreaId(7).is_some());
        assert_eq!(AreaId(7).to_string(), "#7");
    }
}
