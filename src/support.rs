//! Whole-body crawling.
//!
//! A crawler has no discrete legs. It casts a ring of short, eccentric
//! probes around its "down" direction at two radial bands, averages the hit
//! points and normals, and blends its pose toward that estimate while the
//! movement intent is active.

use std::f32::consts::TAU;

use bevy::prelude::*;

use crate::backend::{ProbeRay, TerrainProbe};
use crate::config::SupportConfig;
use crate::error::ConfigError;
use crate::intent::MovementIntent;
use crate::pose::{look_rotation, project_on_plane, BodyPose};
use crate::velocity::VelocityEstimator;

/// Averaged contact under a crawler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportEstimate {
    /// Average of the body position and every hit point.
    pub point: Vec3,
    /// Average of the body up and every hit normal (not renormalized).
    pub normal: Vec3,
    /// Number of probes that hit.
    pub hits: usize,
}

/// Probe ring around a body.
#[derive(Debug, Clone, Copy)]
pub struct SupportPolygonEstimator<'a> {
    config: &'a SupportConfig,
}

impl<'a> SupportPolygonEstimator<'a> {
    pub fn new(config: &'a SupportConfig) -> Self {
        Self { config }
    }

    /// Ring directions: "down" tilted sideways by `ray_eccentricity`, spread
    /// evenly with a half-step phase offset.
    pub fn ray_directions(&self, pose: &BodyPose) -> Vec<Vec3> {
        let (up, right, forward) = (pose.up(), pose.right(), pose.forward());
        let step = TAU / self.config.ray_amount as f32;
        (0..self.config.ray_amount)
            .map(|i| {
                let angle = step / 2.0 + i as f32 * step;
                -up + (right * angle.cos() + forward * angle.sin()) * self.config.ray_eccentricity
            })
            .collect()
    }

    /// Probe for `direction` at a band `offset` (hundredths of a unit).
    pub fn probe_ray(&self, pose: &BodyPose, direction: Vec3, offset: f32) -> ProbeRay {
        let half = self.config.half_range;
        let flat = project_on_plane(direction, pose.up());
        let origin = pose.translation - (direction + flat) * half
            + flat.normalize_or_zero() * offset / 100.0;
        ProbeRay::new(origin, direction, self.config.probe_radius, 2.0 * half)
    }

    /// Every probe of the ring, inner band first for each direction.
    pub fn probe_rays(&self, pose: &BodyPose) -> Vec<ProbeRay> {
        self.ray_directions(pose)
            .into_iter()
            .flat_map(|dir| {
                [
                    self.probe_ray(pose, dir, self.config.inner_offset),
                    self.probe_ray(pose, dir, self.config.outer_offset),
                ]
            })
            .collect()
    }

    /// Cast the ring and average the results.
    ///
    /// Both sums are seeded with the body itself (position, up) and a count
    /// of one, so a ring with no hits returns the current pose unchanged.
    pub fn estimate<P: TerrainProbe + ?Sized>(&self, pose: &BodyPose, probe: &P) -> SupportEstimate {
        let mut point = pose.translation;
        let mut normal = pose.up();
        let mut hits = 0;

        for hit in self.probe_rays(pose).into_iter().filter_map(|ray| probe.cast(ray)) {
            point += hit.point;
            normal += hit.normal;
            hits += 1;
        }

        let count = (hits + 1) as f32;
        SupportEstimate {
            point: point / count,
            normal: normal / count,
            hits,
        }
    }
}

/// Driver for a whole-body crawler.
///
/// Owns its [`SupportConfig`] and reads the [`MovementIntent`] beside it; the backend's
/// tick system calls [`Crawler::tick`] once per fixed step.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
#[require(MovementIntent)]
pub struct Crawler {
    config: SupportConfig,
    velocity: VelocityEstimator,
    last_rotation: Quat,
    anchored: bool,
    #[reflect(ignore)]
    last_estimate: Option<SupportEstimate>,
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new(SupportConfig::default())
    }
}

impl Crawler {
    /// Create a crawler without validating `config`.
    ///
    /// Use [`Crawler::try_new`] for configs from untrusted sources.
    pub fn new(config: SupportConfig) -> Self {
        let velocity = VelocityEstimator::new(config.smoothness, config.velocity_epsilon);
        Self {
            config,
            velocity,
            last_rotation: Quat::IDENTITY,
            anchored: false,
            last_estimate: None,
        }
    }

    /// Create a crawler from a validated `config`.
    pub fn try_new(config: SupportConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &SupportConfig {
        &self.config
    }

    /// Smoothed velocity (displacement per tick).
    pub fn velocity(&self) -> Vec3 {
        self.velocity.velocity()
    }

    /// Estimate from the last tick that had an active intent.
    pub fn last_estimate(&self) -> Option<SupportEstimate> {
        self.last_estimate
    }

    /// Advance one fixed step of `dt` seconds.
    ///
    /// Returns the support estimate when the intent was active.
    pub fn tick<P: TerrainProbe + ?Sized>(
        &mut self,
        dt: f32,
        intent: &MovementIntent,
        pose: &mut BodyPose,
        probe: &P,
    ) -> Option<SupportEstimate> {
        if !self.anchored {
            self.velocity.reset(pose.translation);
            self.last_rotation = pose.rotation;
            self.anchored = true;
        }

        let start = pose.translation;
        self.velocity.update(start);

        let mut speed = self.config.speed * dt;
        if intent.boost {
            speed *= self.config.boost_multiplier;
        }
        pose.translation += pose.forward() * intent.forward * speed;
        pose.translation += pose.right() * intent.strafe * speed * self.config.strafe_factor;

        let estimate = if intent.is_active() {
            let estimate = SupportPolygonEstimator::new(&self.config).estimate(pose, probe);
            let blend = self.config.blend_factor();

            pose.translation = start.lerp(estimate.point, blend);
            let heading = self.velocity.velocity().try_normalize().unwrap_or(pose.forward());
            let target = look_rotation(heading, estimate.normal);
            pose.rotation = self.last_rotation.slerp(target, blend).normalize();

            self.last_estimate = Some(estimate);
            Some(estimate)
        } else {
            None
        };

        self.last_rotation = pose.rotation;
        estimate
    }
}
