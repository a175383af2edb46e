//! World coordinates of trackside infrastructure.
//!
//! Level crossings and other event sources report a location in world
//! metres.  The scheduler only needs to know whether two reports refer to the
//! same physical object, so `WorldLocation` offers a tolerance comparison and
//! no projection maths.

use serde::{Deserialize, Serialize};

/// A point in the host's world frame, in metres.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[derive(Serialize, Deserialize)]
pub struct WorldLocation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldLocation {
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Straight-line distance in metres.
    pub fn distance_m(self, other: WorldLocation) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// `true` if both points lie within `tolerance_m` of each other.
    #[inline]
    pub fn same_place(self, other: WorldLocation, tolerance_m: f32) -> bool {
        self.distance_m(other) <= tolerance_m
    }
}

impl std::fmt::Display for WorldLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}
