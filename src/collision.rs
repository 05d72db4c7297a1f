//! Raw terrain query results.

use bevy::prelude::*;

/// The nearest contact found by a terrain probe.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProbeHit {
    /// World position of the contact point.
    pub point: Vec3,
    /// Surface normal at the contact point (unit length).
    pub normal: Vec3,
    /// Distance travelled along the cast before the contact.
    pub distance: f32,
}

impl ProbeHit {
    /// Create a probe hit.
    pub fn new(point: Vec3, normal: Vec3, distance: f32) -> Self {
        Self {
            point,
            normal,
            distance,
        }
    }
}
