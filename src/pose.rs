//! Minimal pose math.
//!
//! The locomotion core never touches the scene graph directly. It reads and
//! writes a [`BodyPose`], which the tick systems build from (and write back
//! to) the body's `Transform`.

use bevy::prelude::*;

/// The parent frame a body orients against.
///
/// Optional. When absent, the body orients against world up and keeps its
/// own current forward direction.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct ReferenceFrame {
    /// Parent "up" direction.
    pub up: Vec3,
    /// Parent "forward" direction.
    pub forward: Vec3,
}

impl Default for ReferenceFrame {
    fn default() -> Self {
        Self {
            up: Vec3::Y,
            forward: Vec3::NEG_Z,
        }
    }
}

impl ReferenceFrame {
    /// Create a frame. Zero-length inputs fall back to the world defaults.
    pub fn new(up: Vec3, forward: Vec3) -> Self {
        Self {
            up: up.try_normalize().unwrap_or(Vec3::Y),
            forward: forward.try_normalize().unwrap_or(Vec3::NEG_Z),
        }
    }

    /// Take up/forward from a transform (e.g. the controller a body rides on).
    pub fn from_transform(transform: &Transform) -> Self {
        Self::new(*transform.up(), *transform.forward())
    }
}

/// World pose of a creature body plus the parent frame it orients against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    /// World position.
    pub translation: Vec3,
    /// World rotation.
    pub rotation: Quat,
    /// World scale, applied to rest offsets.
    pub scale: Vec3,
    /// Parent-space up, used to bias terrain probes.
    pub frame_up: Vec3,
    /// Parent-space forward, preserved when the body is re-oriented.
    pub frame_forward: Vec3,
}

impl Default for BodyPose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

impl BodyPose {
    /// A pose whose frame is world up and the body's own forward.
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::ONE,
            frame_up: Vec3::Y,
            frame_forward: rotation * Vec3::NEG_Z,
        }
    }

    /// Build a pose from a top-level transform.
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            scale: transform.scale,
            ..Self::new(transform.translation, transform.rotation)
        }
    }

    /// Replace the parent frame.
    pub fn with_frame(mut self, frame: ReferenceFrame) -> Self {
        self.frame_up = frame.up;
        self.frame_forward = frame.forward;
        self
    }

    /// Write translation and rotation back into a transform.
    pub fn apply_to(&self, transform: &mut Transform) {
        transform.translation = self.translation;
        transform.rotation = self.rotation;
    }

    /// Body "up".
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Body "forward" (Bevy convention, -Z).
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Body "right".
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Convert a body-local point to world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.translation + self.rotation * (self.scale * local)
    }

    /// Convert a world point to body-local space.
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        (self.rotation.inverse() * (world - self.translation)) / self.scale
    }
}

/// Remove the component of `v` along `normal`.
#[inline]
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    let n = normal.normalize_or_zero();
    v - n * v.dot(n)
}

/// Rotation whose forward (-Z) is exactly `forward` and whose up is `up`
/// made orthogonal to it.
///
/// Degenerate input (zero forward, or up parallel to forward) falls back to
/// the shortest arc from -Z to `forward`, or identity.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let Some(f) = forward.try_normalize() else {
        return Quat::IDENTITY;
    };
    let Some(right) = f.cross(up).try_normalize() else {
        return Quat::from_rotation_arc(Vec3::NEG_Z, f);
    };
    let up = right.cross(f);
    Quat::from_mat3(&Mat3::from_cols(right, up, -f)).normalize()
}
