//! The legged creature and its per-tick pipeline.
//!
//! [`Creature::tick`] runs, in order:
//!
//! 1. velocity estimation from the body position,
//! 2. one resumption of every in-flight [`StepMotion`],
//! 3. gait scheduling and foot placement, starting new step motions,
//! 4. pinning of every planted leg,
//! 5. body orientation from the leg geometry.
//!
//! The `moving` flag on each leg is the only guard against double-stepping:
//! a leg with a live step motion is never offered to foot placement.

use bevy::prelude::*;

use crate::backend::TerrainProbe;
use crate::config::LocomotionConfig;
use crate::error::ConfigError;
use crate::gait::GaitScheduler;
use crate::leg::{Leg, LegGroup, StepMotion, StepProgress};
use crate::orientation::BodyOrientationStabilizer;
use crate::placement::FootPlacementSampler;
use crate::pose::BodyPose;
use crate::velocity::VelocityEstimator;

/// What happened during the last tick.
#[derive(Reflect, Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Group evaluated by the grouped gait this tick.
    pub activated: Option<LegGroup>,
    /// Legs that started a step this tick.
    pub started_legs: Vec<usize>,
    /// Legs that landed this tick.
    pub landed: Vec<usize>,
    /// Legs that started a step with no terrain under the target.
    pub floating: Vec<usize>,
}

/// A legged creature: legs, in-flight steps and every filter state.
///
/// Rest offsets are fixed at construction. The first tick anchors the legs
/// on their rest positions around the current body pose.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use arthropod_locomotion::prelude::*;
///
/// let rest = vec![
///     Vec3::new(-0.5, -0.5, -0.5),
///     Vec3::new(0.5, -0.5, 0.5),
///     Vec3::new(0.5, -0.5, -0.5),
///     Vec3::new(-0.5, -0.5, 0.5),
/// ];
/// let mut creature = Creature::new(LocomotionConfig::default(), rest).unwrap();
/// let mut pose = BodyPose::new(Vec3::new(0.0, 0.5, 0.0), Quat::IDENTITY);
/// let ground = PlaneTerrain::flat(0.0);
///
/// for _ in 0..20 {
///     pose.translation.z -= 0.01;
///     creature.tick(&mut pose, &ground);
/// }
/// assert!(creature.last_report().started_legs.len() <= 4);
/// ```
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct Creature {
    config: LocomotionConfig,
    pairs: Vec<[usize; 2]>,
    legs: Vec<Leg>,
    steps: Vec<StepMotion>,
    scheduler: GaitScheduler,
    velocity: VelocityEstimator,
    stabilizer: BodyOrientationStabilizer,
    anchored: bool,
    report: TickReport,
}

impl Creature {
    /// Create a creature from body-space rest offsets, one per leg.
    pub fn new(config: LocomotionConfig, rest_offsets: Vec<Vec3>) -> Result<Self, ConfigError> {
        let leg_count = rest_offsets.len();
        config.validate_for(leg_count)?;

        let legs = rest_offsets
            .into_iter()
            .enumerate()
            .map(|(i, rest)| Leg::new(i, leg_count, rest, rest))
            .collect();
        let pairs = config.pairs_for(leg_count);
        let velocity = VelocityEstimator::new(config.smoothness as f32, config.velocity_epsilon);

        Ok(Self {
            config,
            pairs,
            legs,
            steps: Vec::new(),
            scheduler: GaitScheduler::new(),
            velocity,
            stabilizer: BodyOrientationStabilizer::default(),
            anchored: false,
            report: TickReport::default(),
        })
    }

    /// Create a creature whose rest offsets are the given world foot
    /// positions seen from `pose`.
    pub fn from_leg_positions(
        config: LocomotionConfig,
        pose: &BodyPose,
        world_positions: &[Vec3],
    ) -> Result<Self, ConfigError> {
        let rest = world_positions
            .iter()
            .map(|&p| pose.inverse_transform_point(p))
            .collect();
        Self::new(config, rest)
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// In-flight step motions.
    pub fn steps(&self) -> &[StepMotion] {
        &self.steps
    }

    /// Orientation pairs in use.
    pub fn orientation_pairs(&self) -> &[[usize; 2]] {
        &self.pairs
    }

    /// Smoothed body velocity (displacement per tick).
    pub fn velocity(&self) -> Vec3 {
        self.velocity.velocity()
    }

    /// Up direction from the last orientation blend.
    pub fn body_up(&self) -> Vec3 {
        self.stabilizer.last_up()
    }

    /// Group the grouped gait evaluates next.
    pub fn next_group(&self) -> LegGroup {
        self.scheduler.active_group()
    }

    /// Number of legs in flight.
    pub fn moving_count(&self) -> usize {
        self.steps.len()
    }

    /// Whether every leg is planted.
    pub fn is_settled(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether the first tick has anchored the legs.
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// World rest anchor of `leg` for `pose`.
    pub fn rest_anchor(&self, leg: usize, pose: &BodyPose) -> Option<Vec3> {
        self.legs.get(leg).map(|l| pose.transform_point(l.rest_offset))
    }

    pub fn last_report(&self) -> &TickReport {
        &self.report
    }

    /// Drop every in-flight step and re-anchor on the next tick (teleports).
    pub fn reset(&mut self) {
        self.steps.clear();
        for leg in &mut self.legs {
            leg.moving = false;
        }
        self.anchored = false;
    }

    fn anchor(&mut self, pose: &BodyPose) {
        self.velocity.reset(pose.translation);
        for leg in &mut self.legs {
            let planted = pose.transform_point(leg.rest_offset);
            leg.position = planted;
            leg.committed = planted;
        }
        self.stabilizer.reset(pose.up());
        self.anchored = true;
    }

    /// Run one fixed tick against `probe`, possibly re-orienting `pose`.
    pub fn tick<P: TerrainProbe + ?Sized>(&mut self, pose: &mut BodyPose, probe: &P) -> &TickReport {
        if !self.anchored {
            self.anchor(pose);
        }

        let mut report = TickReport::default();
        let velocity = self.velocity.update(pose.translation);
        let up = pose.up();

        self.advance_steps(up, &mut report);

        let sampler = FootPlacementSampler::new(&self.config, pose, velocity);
        let decision = self.scheduler.schedule(&self.config, &self.legs, &sampler, probe);
        report.activated = decision.activated;

        for (index, target) in decision.steps {
            let Some(leg) = self.legs.get_mut(index) else {
                continue;
            };
            debug!("leg {} steps from {:?} to {:?}", index, leg.committed, target.point);
            if !target.has_contact() {
                report.floating.push(index);
            }
            report.started_legs.push(index);

            leg.moving = true;
            let mut step = StepMotion::new(index, leg.committed, target, self.config.smoothness);
            match step.advance(up, self.config.step_height) {
                StepProgress::InFlight(position) => {
                    leg.position = position;
                    self.steps.push(step);
                }
                StepProgress::Landed(point) => {
                    land(leg, point);
                    report.landed.push(index);
                }
            }
        }

        for leg in &mut self.legs {
            leg.pin(self.config.pin_offset);
        }

        if self.config.body_orientation {
            self.stabilizer
                .stabilize(&self.legs, &self.pairs, self.config.blend_factor(), pose);
        }

        self.report = report;
        &self.report
    }

    fn advance_steps(&mut self, up: Vec3, report: &mut TickReport) {
        let legs = &mut self.legs;
        let height = self.config.step_height;
        self.steps.retain_mut(|step| {
            let Some(leg) = legs.get_mut(step.leg()) else {
                return false;
            };
            match step.advance(up, height) {
                StepProgress::InFlight(position) => {
                    leg.position = position;
                    true
                }
                StepProgress::Landed(point) => {
                    land(leg, point);
                    report.landed.push(step.leg());
                    false
                }
            }
        });
    }
}

fn land(leg: &mut Leg, point: Vec3) {
    leg.position = point;
    leg.committed = point;
    leg.moving = false;
}
