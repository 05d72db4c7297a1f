//! Analytic terrain.
//!
//! Exact sphere casts against infinite planes with rectangular holes. Used by
//! [`StaticTerrainBackend`](crate::systems::StaticTerrainBackend) for headless
//! hosts that have no physics engine, and by tests.

use bevy::prelude::*;

use crate::backend::{ProbeRay, TerrainProbe};
use crate::collision::ProbeHit;

/// An axis-aligned hole in a plane, in world XZ coordinates.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct TerrainGap {
    /// Minimum corner (x, z).
    pub min: Vec2,
    /// Maximum corner (x, z).
    pub max: Vec2,
}

impl TerrainGap {
    /// Create a gap. Corners are sorted.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Whether the world point's XZ projection lies inside the gap.
    pub fn contains(&self, point: Vec3) -> bool {
        let xz = point.xz();
        xz.cmpge(self.min).all() && xz.cmple(self.max).all()
    }
}

/// A one-sided infinite plane. Casts from behind it never hit.
#[derive(Resource, Reflect, Debug, Clone, PartialEq)]
#[reflect(Resource)]
pub struct PlaneTerrain {
    /// Any point on the plane.
    pub point: Vec3,
    /// Unit normal of the solid side.
    pub normal: Vec3,
    /// Holes cut into the plane.
    pub gaps: Vec<TerrainGap>,
}

impl Default for PlaneTerrain {
    fn default() -> Self {
        Self::flat(0.0)
    }
}

impl PlaneTerrain {
    /// Plane through `point` facing `normal`. A zero normal becomes world up.
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.try_normalize().unwrap_or(Vec3::Y),
            gaps: Vec::new(),
        }
    }

    /// Horizontal ground at `height`.
    pub fn flat(height: f32) -> Self {
        Self::new(Vec3::new(0.0, height, 0.0), Vec3::Y)
    }

    /// Builder: cut a hole.
    pub fn with_gap(mut self, gap: TerrainGap) -> Self {
        self.gaps.push(gap);
        self
    }

    /// Signed distance of `point` above the plane.
    pub fn height_above(&self, point: Vec3) -> f32 {
        self.normal.dot(point - self.point)
    }
}

impl TerrainProbe for PlaneTerrain {
    fn cast(&self, ray: ProbeRay) -> Option<ProbeHit> {
        let start = self.height_above(ray.origin);
        let closing = self.normal.dot(ray.direction);
        if closing >= 0.0 || start < -ray.radius {
            return None;
        }

        let distance = ((start - ray.radius) / -closing).max(0.0);
        if distance > ray.max_distance {
            return None;
        }

        let point = ray.at(distance) - self.normal * ray.radius;
        if self.gaps.iter().any(|gap| gap.contains(point)) {
            return None;
        }
        Some(ProbeHit::new(point, self.normal, distance))
    }
}

/// Several planes; a cast returns the nearest hit among them.
#[derive(Resource, Reflect, Debug, Clone, Default, PartialEq)]
#[reflect(Resource)]
pub struct TerrainSet(pub Vec<PlaneTerrain>);

impl TerrainProbe for TerrainSet {
    fn cast(&self, ray: ProbeRay) -> Option<ProbeHit> {
        self.0
            .iter()
            .filter_map(|plane| plane.cast(ray))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
