//! Smoothed body velocity.
//!
//! Velocity here is displacement per tick, not per second: the gait and
//! placement constants (`velocity_multiplier`, probe biases) are tuned
//! against per-tick displacement.

use bevy::prelude::*;

/// Dead-zone used by legged creatures.
pub const LEG_VELOCITY_EPSILON: f32 = 2.5e-5;

/// Dead-zone used by whole-body crawlers.
pub const BODY_VELOCITY_EPSILON: f32 = 2.5e-4;

/// Single-pole low-pass filter over body displacement.
///
/// `velocity = (displacement + smoothness * last_velocity) / (smoothness + 1)`.
/// Results shorter than `epsilon` are discarded and the previous velocity is
/// held instead, so floating-point noise on a resting body cannot jitter the
/// gait or orientation.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct VelocityEstimator {
    smoothness: f32,
    epsilon: f32,
    last_position: Vec3,
    velocity: Vec3,
    last_velocity: Vec3,
}

impl VelocityEstimator {
    /// Create an estimator anchored at the origin.
    pub fn new(smoothness: f32, epsilon: f32) -> Self {
        Self {
            smoothness: smoothness.max(0.0),
            epsilon,
            last_position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            last_velocity: Vec3::ZERO,
        }
    }

    /// Forget all history and anchor at `position`.
    pub fn reset(&mut self, position: Vec3) {
        self.last_position = position;
        self.velocity = Vec3::ZERO;
        self.last_velocity = Vec3::ZERO;
    }

    /// Feed the current body position and return the smoothed velocity.
    pub fn update(&mut self, position: Vec3) -> Vec3 {
        let displacement = position - self.last_position;
        let velocity =
            (displacement + self.smoothness * self.last_velocity) / (self.smoothness + 1.0);

        if velocity.length() < self.epsilon {
            self.velocity = self.last_velocity;
        } else {
            self.velocity = velocity;
            self.last_velocity = velocity;
        }

        self.last_position = position;
        self.velocity
    }

    /// Smoothed velocity from the last update.
    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Length of the smoothed velocity.
    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Body position seen by the last update.
    #[inline]
    pub fn last_position(&self) -> Vec3 {
        self.last_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_is_scaled_displacement() {
        let mut estimator = VelocityEstimator::new(8.0, LEG_VELOCITY_EPSILON);
        let v = estimator.update(Vec3::new(0.9, 0.0, 0.0));
        assert!((v - Vec3::new(0.1, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn converges_to_constant_displacement() {
        let mut estimator = VelocityEstimator::new(8.0, LEG_VELOCITY_EPSILON);
        let step = Vec3::new(0.0, 0.0, -0.01);
        let mut position = Vec3::ZERO;
        for _ in 0..200 {
            position += step;
            estimator.update(position);
        }
        assert!((estimator.velocity() - step).length() < 1e-6);
    }

    #[test]
    fn dead_zone_holds_previous_velocity() {
        let mut estimator = VelocityEstimator::new(8.0, LEG_VELOCITY_EPSILON);
        let mut position = Vec3::ZERO;
        // Sub-epsilon jitter never escapes the dead zone.
        for i in 0..50 {
            position.x += if i % 2 == 0 { 1e-6 } else { -1e-6 };
            let before = estimator.velocity();
            let after = estimator.update(position);
            assert_eq!(before, after);
        }
        assert_eq!(estimator.velocity(), Vec3::ZERO);
    }

    #[test]
    fn dead_zone_holds_last_real_velocity() {
        let mut estimator = VelocityEstimator::new(0.0, 1e-3);
        estimator.update(Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(estimator.velocity(), Vec3::new(0.5, 0.0, 0.0));

        // Body stops: raw velocity collapses below epsilon, previous value held.
        let held = estimator.update(Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(held, Vec3::new(0.5, 0.0, 0.0));
        let held = estimator.update(Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(held, Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn reset_clears_history() {
        let mut estimator = VelocityEstimator::new(2.0, BODY_VELOCITY_EPSILON);
        estimator.update(Vec3::X);
        estimator.reset(Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(estimator.velocity(), Vec3::ZERO);
        assert_eq!(estimator.last_position(), Vec3::new(5.0, 0.0, 0.0));
    }
}
