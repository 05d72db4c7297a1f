//! Body orientation from planted-leg geometry.

use bevy::prelude::*;

use crate::leg::Leg;
use crate::pose::{look_rotation, BodyPose};

/// Default orientation pairs for `leg_count` legs.
///
/// For an even count of at least four: `[0, n/2 - 1]` and `[n/2, n - 1]`,
/// the two diagonals spanning each gait group. Other counts have no default
/// and must be configured explicitly.
pub fn default_pairs(leg_count: usize) -> Vec<[usize; 2]> {
    if leg_count < 4 || leg_count % 2 != 0 {
        return Vec::new();
    }
    let half = leg_count / 2;
    vec![[0, half - 1], [half, leg_count - 1]]
}

/// Unit normal of the plane spanned by the leg pairs.
///
/// Pairs are consumed two at a time; each couple contributes
/// `cross(p[a0] - p[b0], p[a1] - p[b1])` and the contributions are summed.
/// Returns `None` with fewer than two pairs, an index outside `legs`, or
/// collinear geometry.
pub fn support_normal(legs: &[Leg], pairs: &[[usize; 2]]) -> Option<Vec3> {
    if pairs.len() < 2 {
        return None;
    }

    let span = |[a, b]: [usize; 2]| -> Option<Vec3> {
        Some(legs.get(a)?.position - legs.get(b)?.position)
    };

    let mut sum = Vec3::ZERO;
    for couple in pairs.chunks_exact(2) {
        sum += span(couple[0])?.cross(span(couple[1])?);
    }
    sum.try_normalize()
}

/// Blends the body's up toward the support normal of its legs.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct BodyOrientationStabilizer {
    last_up: Vec3,
}

impl Default for BodyOrientationStabilizer {
    fn default() -> Self {
        Self::new(Vec3::Y)
    }
}

impl BodyOrientationStabilizer {
    pub fn new(up: Vec3) -> Self {
        Self {
            last_up: up.try_normalize().unwrap_or(Vec3::Y),
        }
    }

    /// Up direction produced by the last blend.
    pub fn last_up(&self) -> Vec3 {
        self.last_up
    }

    pub fn reset(&mut self, up: Vec3) {
        *self = Self::new(up);
    }

    /// Blend `last_up` toward `normal` by `blend` and return the new up.
    ///
    /// A normal pointing into the opposite hemisphere is flipped first, so the
    /// handedness of the leg ordering cannot turn the body over.
    pub fn blend(&mut self, normal: Vec3, blend: f32) -> Vec3 {
        let normal = if normal.dot(self.last_up) < 0.0 {
            -normal
        } else {
            normal
        };
        let up = self.last_up.lerp(normal, blend).try_normalize().unwrap_or(normal);
        self.last_up = up;
        up
    }

    /// Re-orient `pose` from the legs' geometry.
    ///
    /// The body keeps its parent-frame forward and takes the blended up as
    /// the secondary axis. Returns `false`, leaving the pose untouched, when
    /// the pairs do not span a plane.
    pub fn stabilize(
        &mut self,
        legs: &[Leg],
        pairs: &[[usize; 2]],
        blend: f32,
        pose: &mut BodyPose,
    ) -> bool {
        let Some(normal) = support_normal(legs, pairs) else {
            if pairs.len() >= 2 {
                debug!("orientation pairs {:?} do not span a plane, keeping pose", pairs);
            }
            return false;
        };

        let up = self.blend(normal, blend);
        pose.rotation = look_rotation(pose.frame_forward, up);
        true
    }
}
