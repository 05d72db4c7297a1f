//! Terrain backend abstraction.
//!
//! This module defines the two seams between the locomotion core and the
//! outside world:
//!
//! - [`TerrainProbe`]: one sphere-cast query, answered by any collision
//!   backend (Rapier, an analytic terrain, a test double).
//! - [`LocomotionBackend`]: the plugin that knows how to build a probe for an
//!   entity and therefore owns the tick systems.

use bevy::prelude::*;

use crate::collision::ProbeHit;

/// A sphere-swept ray query against world geometry.
///
/// Implementations must return the *nearest* intersection along the cast,
/// or `None` when nothing is hit within `max_distance`.
///
/// Any closure `Fn(ProbeRay) -> Option<ProbeHit>` is a probe, which is how
/// backends bind a per-entity query (excluded body, collision groups)
/// without a dedicated type:
///
/// ```rust
/// use bevy::prelude::*;
/// use arthropod_locomotion::prelude::*;
///
/// let floor = |ray: ProbeRay| {
///     (ray.direction.y < 0.0).then(|| ProbeHit::new(ray.origin.with_y(0.0), Vec3::Y, ray.origin.y))
/// };
/// let hit = floor.cast(ProbeRay::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y, 0.1, 2.0));
/// assert!(hit.is_some());
/// ```
pub trait TerrainProbe {
    /// Cast a sphere of `ray.radius` from `ray.origin` along `ray.direction`.
    fn cast(&self, ray: ProbeRay) -> Option<ProbeHit>;
}

impl<F> TerrainProbe for F
where
    F: Fn(ProbeRay) -> Option<ProbeHit>,
{
    fn cast(&self, ray: ProbeRay) -> Option<ProbeHit> {
        self(ray)
    }
}

/// Trait for backend implementations.
///
/// The backend plugin adds the tick systems to
/// [`LocomotionSet::Tick`](crate::LocomotionSet::Tick). Those systems build a
/// [`TerrainProbe`] for each creature and hand it to
/// [`Creature::tick`](crate::creature::Creature::tick) or
/// [`Crawler::tick`](crate::support::Crawler::tick).
pub trait LocomotionBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;
}

/// Parameters of a single sphere cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeRay {
    /// Origin of the cast.
    pub origin: Vec3,
    /// Direction of the cast (normalized).
    pub direction: Vec3,
    /// Radius of the swept sphere.
    pub radius: f32,
    /// Maximum distance to cast.
    pub max_distance: f32,
}

impl ProbeRay {
    /// Create a new probe ray. The direction is normalized.
    pub fn new(origin: Vec3, direction: Vec3, radius: f32, max_distance: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            radius,
            max_distance,
        }
    }

    /// Point reached after travelling `distance` along the cast.
    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}
