//! Resolved footholds.
//!
//! A [`TerrainSample`] is what foot placement hands to a step motion: the
//! point a leg will land on and, when a probe touched terrain, the surface
//! normal there. It lives only as long as the step that consumes it.

use bevy::prelude::*;

use crate::collision::ProbeHit;

/// A foothold resolved against terrain.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
pub struct TerrainSample {
    /// World position the leg will land on.
    pub point: Vec3,
    /// Surface normal, or `None` when no probe found terrain.
    pub normal: Option<Vec3>,
}

impl TerrainSample {
    /// A foothold on terrain.
    pub fn contact(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: Some(normal),
        }
    }

    /// A foothold in empty space (no terrain contact).
    pub fn floating(point: Vec3) -> Self {
        Self {
            point,
            normal: None,
        }
    }

    /// Whether this foothold touches terrain.
    pub fn has_contact(&self) -> bool {
        self.normal.is_some()
    }
}

impl From<ProbeHit> for TerrainSample {
    fn from(hit: ProbeHit) -> Self {
        Self::contact(hit.point, hit.normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floating_sample_has_no_contact() {
        let sample = TerrainSample::floating(Vec3::new(0.0, -1.0, 0.0));
        assert!(!sample.has_contact());
        assert!(sample.normal.is_none());
        assert_eq!(sample.point, Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn sample_from_probe_hit() {
        let hit = ProbeHit::new(Vec3::X, Vec3::Y, 1.0);
        let sample = TerrainSample::from(hit);
        assert!(sample.has_contact());
        assert_eq!(sample.point, Vec3::X);
        assert_eq!(sample.normal, Some(Vec3::Y));
    }
}
