//! Movement intent.
//!
//! Intents carry the desired planar movement from player input or AI. Only
//! the whole-body [`Crawler`](crate::support::Crawler) reads them; legged
//! creatures observe the resulting body displacement instead.

use bevy::prelude::*;

/// Desired planar movement of a crawler.
///
/// # Example
///
/// ```rust
/// use arthropod_locomotion::prelude::*;
///
/// let mut intent = MovementIntent::new();
/// intent.set_forward(2.0);
/// assert_eq!(intent.forward, 1.0);
/// assert!(intent.is_active());
///
/// intent.clear();
/// assert!(!intent.is_active());
/// ```
#[derive(Component, Reflect, Debug, Clone, Default, PartialEq)]
#[reflect(Component)]
pub struct MovementIntent {
    /// Forward axis (-1.0 = backward, 1.0 = forward).
    pub forward: f32,
    /// Sideways axis (-1.0 = left, 1.0 = right).
    pub strafe: f32,
    /// Whether the boost multiplier applies.
    pub boost: bool,
}

impl MovementIntent {
    /// Create a new empty movement intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the forward axis, clamped to [-1, 1].
    pub fn set_forward(&mut self, value: f32) {
        self.forward = value.clamp(-1.0, 1.0);
    }

    /// Set the sideways axis, clamped to [-1, 1].
    pub fn set_strafe(&mut self, value: f32) {
        self.strafe = value.clamp(-1.0, 1.0);
    }

    pub fn set_boost(&mut self, boost: bool) {
        self.boost = boost;
    }

    /// Builder: set the forward axis.
    pub fn with_forward(mut self, value: f32) -> Self {
        self.set_forward(value);
        self
    }

    /// Builder: set the sideways axis.
    pub fn with_strafe(mut self, value: f32) -> Self {
        self.set_strafe(value);
        self
    }

    /// Builder: set boost.
    pub fn with_boost(mut self, boost: bool) -> Self {
        self.boost = boost;
        self
    }

    /// Clear both axes. Boost is left as is.
    pub fn clear(&mut self) {
        self.forward = 0.0;
        self.strafe = 0.0;
    }

    /// Whether either axis is non-zero.
    pub fn is_active(&self) -> bool {
        self.forward != 0.0 || self.strafe != 0.0
    }
}
