//! Foot placement.
//!
//! Decides whether a leg must step and, if so, where it lands:
//!
//! 1. The rest anchor is moved into world space.
//! 2. The planar deviation between the anchor (pushed ahead by the velocity
//!    lookahead) and the leg's committed position is compared to
//!    `step_size`.
//! 3. A target ahead of the anchor is predicted and resolved against terrain
//!    with two directional probes. The forward-biased probe wins when it
//!    touches terrain, then the backward-biased one; when both miss the leg
//!    steps to the unprojected target.

use bevy::prelude::*;

use crate::backend::{ProbeRay, TerrainProbe};
use crate::config::LocomotionConfig;
use crate::detection::TerrainSample;
use crate::leg::Leg;
use crate::pose::{project_on_plane, BodyPose};

/// Outcome of evaluating one leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// The leg is already stepping.
    Skip,
    /// The leg is within `step_size` and holds its ground.
    Hold,
    /// The leg must step onto this foothold.
    Step(TerrainSample),
}

/// Foot placement for one tick of one creature.
#[derive(Debug, Clone, Copy)]
pub struct FootPlacementSampler<'a> {
    config: &'a LocomotionConfig,
    pose: &'a BodyPose,
    velocity: Vec3,
}

impl<'a> FootPlacementSampler<'a> {
    /// Create a sampler for the current body pose and smoothed velocity.
    pub fn new(config: &'a LocomotionConfig, pose: &'a BodyPose, velocity: Vec3) -> Self {
        Self {
            config,
            pose,
            velocity,
        }
    }

    /// World position of the leg's rest anchor.
    #[inline]
    pub fn desired(&self, leg: &Leg) -> Vec3 {
        self.pose.transform_point(leg.rest_offset)
    }

    /// Velocity lookahead `velocity * velocity_multiplier`.
    #[inline]
    pub fn lookahead(&self) -> Vec3 {
        self.velocity * self.config.velocity_multiplier
    }

    /// Planar distance between the anchor (plus `damping` times the
    /// lookahead) and the leg's committed position.
    pub fn deviation(&self, leg: &Leg, damping: f32) -> f32 {
        let predicted = self.desired(leg) + self.lookahead() * damping;
        project_on_plane(predicted - leg.committed, self.pose.up()).length()
    }

    /// Evaluate a leg: skip it, hold it, or resolve its next foothold.
    pub fn evaluate<P: TerrainProbe + ?Sized>(
        &self,
        leg: &Leg,
        damping: f32,
        probe: &P,
    ) -> Placement {
        if leg.moving {
            return Placement::Skip;
        }
        if self.deviation(leg, damping) <= self.config.step_size {
            return Placement::Hold;
        }
        Placement::Step(self.resolve(leg, probe))
    }

    /// Predicted landing point before terrain matching.
    ///
    /// `desired + clamp(|v|·K, 0, max_overshoot)·(desired − current) + v·K`
    pub fn target_point(&self, leg: &Leg) -> Vec3 {
        let desired = self.desired(leg);
        let lookahead = self.lookahead();
        let overshoot = lookahead.length().clamp(0.0, self.config.max_overshoot);
        desired + overshoot * (desired - leg.position) + lookahead
    }

    /// Resolve the leg's landing point against terrain.
    pub fn resolve<P: TerrainProbe + ?Sized>(&self, leg: &Leg, probe: &P) -> TerrainSample {
        let target = self.target_point(leg);
        let frame_up = self.pose.frame_up;
        let speed = self.velocity.length();

        let forward_up = (frame_up - self.velocity * self.config.forward_probe_bias)
            .try_normalize()
            .unwrap_or(frame_up);
        let forward = self.match_to_surface(target, self.config.raycast_range, forward_up, probe);
        if forward.has_contact() {
            return forward;
        }

        let backward_up = (frame_up + self.velocity * self.config.backward_probe_bias)
            .try_normalize()
            .unwrap_or(frame_up);
        let backward = self.match_to_surface(
            target,
            self.config.raycast_range * (1.0 + speed),
            backward_up,
            probe,
        );
        if !backward.has_contact() {
            debug!(
                "leg {} found no terrain around {:?}, stepping to unprojected target",
                leg.index, target
            );
        }
        backward
    }

    fn match_to_surface<P: TerrainProbe + ?Sized>(
        &self,
        point: Vec3,
        half_range: f32,
        up: Vec3,
        probe: &P,
    ) -> TerrainSample {
        match_to_surface_from_above(point, half_range, up, self.config.probe_radius, probe)
    }
}

/// Project `point` onto terrain along `-up`.
///
/// The cast starts `half_range / 2` above the point and travels
/// `2 * half_range`. A miss returns the point itself with no normal.
pub fn match_to_surface_from_above<P: TerrainProbe + ?Sized>(
    point: Vec3,
    half_range: f32,
    up: Vec3,
    radius: f32,
    probe: &P,
) -> TerrainSample {
    let ray = ProbeRay::new(point + up * (half_range / 2.0), -up, radius, 2.0 * half_range);
    probe
        .cast(ray)
        .map(TerrainSample::from)
        .unwrap_or_else(|| TerrainSample::floating(point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{PlaneTerrain, TerrainGap};

    fn leg_at_rest(pose: &BodyPose, rest: Vec3) -> Leg {
        Leg::new(0, 2, rest, pose.transform_point(rest))
    }

    fn body() -> BodyPose {
        BodyPose::new(Vec3::new(0.0, 0.5, 0.0), Quat::IDENTITY)
    }

    fn no_terrain(_: ProbeRay) -> Option<crate::collision::ProbeHit> {
        None
    }

    // ==================== Deviation Tests ====================

    #[test]
    fn resting_leg_has_no_deviation() {
        let config = LocomotionConfig::default();
        let pose = body();
        let leg = leg_at_rest(&pose, Vec3::new(0.5, -0.5, 0.0));
        let sampler = FootPlacementSampler::new(&config, &pose, Vec3::ZERO);
        assert!(sampler.deviation(&leg, 1.0) < 1e-6);
        assert_eq!(sampler.evaluate(&leg, 1.0, &no_terrain), Placement::Hold);
    }

    #[test]
    fn deviation_ignores_vertical_offset() {
        let config = LocomotionConfig::default();
        let pose = body();
        let mut leg = leg_at_rest(&pose, Vec3::new(0.5, -0.5, 0.0));
        leg.committed.y -= 3.0;
        let sampler = FootPlacementSampler::new(&config, &pose, Vec3::ZERO);
        assert!(sampler.deviation(&leg, 1.0) < 1e-6);
    }

    #[test]
    fn velocity_lookahead_triggers_step() {
        let config = LocomotionConfig::default();
        let pose = body();
        let leg = leg_at_rest(&pose, Vec3::new(0.5, -0.5, 0.0));
        // 0.01 per tick * 30 = 0.3 > step_size
        let sampler = FootPlacementSampler::new(&config, &pose, Vec3::new(0.0, 0.0, -0.01));
        assert!((sampler.deviation(&leg, 1.0) - 0.3).abs() < 1e-5);

        let terrain = PlaneTerrain::flat(0.0);
        assert!(matches!(
            sampler.evaluate(&leg, 1.0, &terrain),
            Placement::Step(_)
        ));
    }

    #[test]
    fn damping_scales_lookahead() {
        let config = LocomotionConfig::default();
        let pose = body();
        let leg = leg_at_rest(&pose, Vec3::new(0.5, -0.5, 0.0));
        let sampler = FootPlacementSampler::new(&config, &pose, Vec3::new(0.0, 0.0, -0.01));
        assert!((sampler.deviation(&leg, 1.0 / 9.0) - 0.3 / 9.0).abs() < 1e-5);
    }

    #[test]
    fn moving_leg_is_skipped() {
        let config = LocomotionConfig::default();
        let pose = body();
        let mut leg = leg_at_rest(&pose, Vec3::new(0.5, -0.5, 0.0));
        leg.committed.x += 10.0;
        leg.moving = true;
        let sampler = FootPlacementSampler::new(&config, &pose, Vec3::ZERO);
        assert_eq!(sampler.evaluate(&leg, 1.0, &no_terrain), Placement::Skip);
    }

    // ==================== Target Tests ====================

    #[test]
    fn target_overshoot_is_capped() {
        let config = LocomotionConfig::default();
        let pose = body();
        let mut leg = leg_at_rest(&pose, Vec3::new(0.5, -0.5, 0.0));
        leg.position.z += 1.0; // foot trails 1 unit behind the anchor
        let velocity = Vec3::new(0.0, 0.0, -1.0); // absurd speed
        let sampler = FootPlacementSampler::new(&config, &pose, velocity);

        let desired = sampler.desired(&leg);
        let expected = desired + 1.5 * (desired - leg.position) + velocity * 30.0;
        assert!((sampler.target_point(&leg) - expected).length() < 1e-4);
    }

    #[test]
    fn target_at_rest_is_the_anchor() {
        let config = LocomotionConfig::default();
        let pose = body();
        let leg = leg_at_rest(&pose, Vec3::new(0.5, -0.5, 0.0));
        let sampler = FootPlacementSampler::new(&config, &pose, Vec3::ZERO);
        assert!((sampler.target_point(&leg) - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);
    }

    // ==================== Terrain Resolution Tests ====================

    #[test]
    fn stationary_target_lands_on_flat_ground() {
        let config = LocomotionConfig::default();
        let pose = body();
        let mut leg = leg_at_rest(&pose, Vec3::new(0.5, -0.5, 0.0));
        leg.position = Vec3::new(0.5, 0.0, 0.0);
        let sampler = FootPlacementSampler::new(&config, &pose, Vec3::ZERO);

        let terrain = PlaneTerrain::flat(-0.2);
        let sample = sampler.resolve(&leg, &terrain);
        assert_eq!(sample.normal, Some(Vec3::Y));
        assert!((sample.point - Vec3::new(0.5, -0.2, 0.0)).length() < 1e-4);
    }

    #[test]
    fn forward_probe_wins_when_it_hits() {
        let config = LocomotionConfig::default();
        let pose = body();
        let leg = leg_at_rest(&pose, Vec3::new(0.5, -0.5, 0.0));
        let sampler = FootPlacementSampler::new(&config, &pose, Vec3::new(0.0, 0.0, -0.01));

        let terrain = PlaneTerrain::flat(0.0);
        let sample = sampler.resolve(&leg, &terrain);
        assert!(sample.has_contact());
        assert!(sample.point.y.abs() < 1e-4);

        // The forward-biased probe leans against the motion, so on flat
        // ground it lands behind the predicted target.
        let target = sampler.target_point(&leg);
        assert!(sample.point.z > target.z);
    }

    #[test]
    fn backward_probe_used_when_forward_misses() {
        let config = LocomotionConfig::default();
        let pose = body();
        let leg = leg_at_rest(&pose, Vec3::new(0.5, -0.5, 0.0));
        let sampler = FootPlacementSampler::new(&config, &pose, Vec3::new(0.0, 0.0, -0.01));

        // Only answer casts that lean along the motion (-Z).
        let terrain = PlaneTerrain::flat(0.0);
        let backward_only = |ray: ProbeRay| {
            if ray.direction.z > 0.0 {
                terrain.cast(ray)
            } else {
                None
            }
        };
        let sample = sampler.resolve(&leg, &backward_only);
        assert!(sample.has_contact());
        assert!(sample.point.z < sampler.target_point(&leg).z);
    }

    #[test]
    fn both_probes_missing_floats_at_target() {
        let config = LocomotionConfig::default();
        let pose = body();
        let leg = leg_at_rest(&pose, Vec3::new(0.5, -0.5, 0.0));
        let sampler = FootPlacementSampler::new(&config, &pose, Vec3::new(0.0, 0.0, -0.01));

        let terrain = PlaneTerrain::flat(0.0).with_gap(TerrainGap::new(
            Vec2::new(-10.0, -10.0),
            Vec2::new(10.0, 10.0),
        ));
        let sample = sampler.resolve(&leg, &terrain);
        assert_eq!(sample, TerrainSample::floating(sampler.target_point(&leg)));
    }

    #[test]
    fn match_to_surface_starts_above_point() {
        let captured = std::cell::Cell::new(None);
        let probe = |ray: ProbeRay| -> Option<crate::collision::ProbeHit> {
            captured.set(Some(ray));
            None
        };
        let sample = match_to_surface_from_above(Vec3::ZERO, 1.5, Vec3::Y, 0.125, &probe);
        assert_eq!(sample, TerrainSample::floating(Vec3::ZERO));

        let ray = captured.get().unwrap();
        assert_eq!(ray.origin, Vec3::new(0.0, 0.75, 0.0));
        assert_eq!(ray.direction, Vec3::NEG_Y);
        assert_eq!(ray.max_distance, 3.0);
        assert_eq!(ray.radius, 0.125);
    }
}
