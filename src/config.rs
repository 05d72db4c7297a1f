//! Locomotion configuration.
//!
//! This module defines the tuning constants for legged creatures
//! ([`LocomotionConfig`]) and for whole-body crawlers ([`SupportConfig`]).
//! All values are fixed at construction; nothing here is mutated by the tick
//! pipeline.
//!
//! Distances are in world units, "velocity" is displacement per tick.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::velocity::{BODY_VELOCITY_EPSILON, LEG_VELOCITY_EPSILON};

const fn default_step_size() -> f32 {
    0.15
}
/// Upper bound on `smoothness` accepted by validation.
pub const MAX_SMOOTHNESS: u32 = 1024;

const fn default_smoothness() -> u32 {
    8
}
const fn default_step_height() -> f32 {
    0.15
}
const fn default_probe_radius() -> f32 {
    0.125
}
const fn default_raycast_range() -> f32 {
    1.5
}
const fn default_velocity_multiplier() -> f32 {
    30.0
}
const fn default_max_overshoot() -> f32 {
    1.5
}
const fn default_forward_probe_bias() -> f32 {
    100.0
}
const fn default_backward_probe_bias() -> f32 {
    75.0
}
const fn default_leg_velocity_epsilon() -> f32 {
    LEG_VELOCITY_EPSILON
}
const fn default_true() -> bool {
    true
}

/// How legs are chosen for stepping.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaitPolicy {
    /// Legs are split into two halves that take turns. A half is evaluated
    /// only once every leg has landed.
    #[default]
    GroupedAlternating,
    /// Every tick, only the leg deviating most from its rest anchor may step.
    FarthestFirst,
}

/// Configuration for a legged creature.
#[derive(Reflect, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocomotionConfig {
    // === Stepping ===
    /// Planar deviation a leg tolerates before it must step.
    #[serde(default = "default_step_size")]
    pub step_size: f32,

    /// Ticks of interpolation per step; a step lasts `smoothness + 1` ticks.
    /// At most [`MAX_SMOOTHNESS`].
    /// Also sets the time constant of velocity and orientation smoothing.
    #[serde(default = "default_smoothness")]
    pub smoothness: u32,

    /// Apex height of the step arc.
    #[serde(default = "default_step_height")]
    pub step_height: f32,

    /// Offset added to a planted leg's committed position when pinning it.
    #[serde(default)]
    pub pin_offset: Vec3,

    // === Placement ===
    /// Lookahead multiplier applied to velocity when predicting where a leg
    /// should land.
    #[serde(default = "default_velocity_multiplier")]
    pub velocity_multiplier: f32,

    /// Cap on the excursion correction factor, so targets do not run away at
    /// high speed.
    #[serde(default = "default_max_overshoot")]
    pub max_overshoot: f32,

    // === Terrain probes ===
    /// Radius of the sphere swept by placement probes.
    #[serde(default = "default_probe_radius")]
    pub probe_radius: f32,

    /// Half range of placement probes.
    #[serde(default = "default_raycast_range")]
    pub raycast_range: f32,

    /// Velocity scale tilting the forward-biased probe against the motion.
    #[serde(default = "default_forward_probe_bias")]
    pub forward_probe_bias: f32,

    /// Velocity scale tilting the backward-biased probe along the motion.
    #[serde(default = "default_backward_probe_bias")]
    pub backward_probe_bias: f32,

    // === Velocity ===
    /// Velocity dead-zone.
    #[serde(default = "default_leg_velocity_epsilon")]
    pub velocity_epsilon: f32,

    // === Gait ===
    /// Leg selection policy.
    #[serde(default)]
    pub gait_policy: GaitPolicy,

    /// Global cap on legs in flight. `None` = unbounded.
    #[serde(default)]
    pub max_simultaneous_steps: Option<usize>,

    /// Damp a leg's velocity lookahead by the blend factor while any leg of
    /// the opposite group is mid-step.
    ///
    /// Only [`GaitPolicy::FarthestFirst`] measures legs while others are in
    /// flight; the grouped gait evaluates settled creatures only, so the flag
    /// has no effect there.
    #[serde(default)]
    pub cross_group_damping: bool,

    // === Body orientation ===
    /// Whether planted-leg geometry re-orients the body.
    #[serde(default = "default_true")]
    pub body_orientation: bool,

    /// Leg index pairs spanning the support plane, consumed two pairs at a
    /// time. `None` derives pairs from the leg count.
    #[serde(default)]
    pub orientation_pairs: Option<Vec<[usize; 2]>>,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            step_size: default_step_size(),
            smoothness: default_smoothness(),
            step_height: default_step_height(),
            pin_offset: Vec3::ZERO,
            velocity_multiplier: default_velocity_multiplier(),
            max_overshoot: default_max_overshoot(),
            probe_radius: default_probe_radius(),
            raycast_range: default_raycast_range(),
            forward_probe_bias: default_forward_probe_bias(),
            backward_probe_bias: default_backward_probe_bias(),
            velocity_epsilon: default_leg_velocity_epsilon(),
            gait_policy: GaitPolicy::GroupedAlternating,
            max_simultaneous_steps: None,
            cross_group_damping: false,
            body_orientation: true,
            orientation_pairs: None,
        }
    }
}

impl LocomotionConfig {
    /// Generic arthropod: pairs derived from the leg count.
    pub fn arthropod() -> Self {
        Self::default()
    }

    /// Eight-legged spider with its own diagonal pairing.
    pub fn spider() -> Self {
        Self {
            orientation_pairs: Some(vec![[0, 2], [4, 7]]),
            ..default()
        }
    }

    /// Blend factor shared by every smoothing filter: `1 / (smoothness + 1)`.
    #[inline]
    pub fn blend_factor(&self) -> f32 {
        1.0 / self.step_ticks() as f32
    }

    /// Ticks a step motion lasts: `smoothness + 1`.
    #[inline]
    pub fn step_ticks(&self) -> u32 {
        self.smoothness.saturating_add(1)
    }

    /// Orientation pairs for a creature with `leg_count` legs.
    pub fn pairs_for(&self, leg_count: usize) -> Vec<[usize; 2]> {
        match &self.orientation_pairs {
            Some(pairs) => pairs.clone(),
            None => crate::orientation::default_pairs(leg_count),
        }
    }

    /// Validate fields that do not depend on the leg count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("step_size", self.step_size)?;
        positive("raycast_range", self.raycast_range)?;
        non_negative("step_height", self.step_height)?;
        non_negative("probe_radius", self.probe_radius)?;
        non_negative("velocity_multiplier", self.velocity_multiplier)?;
        non_negative("max_overshoot", self.max_overshoot)?;
        non_negative("velocity_epsilon", self.velocity_epsilon)?;
        finite("forward_probe_bias", self.forward_probe_bias)?;
        finite("backward_probe_bias", self.backward_probe_bias)?;
        if self.smoothness > MAX_SMOOTHNESS {
            return Err(ConfigError::invalid(
                "smoothness",
                format!("must be at most {MAX_SMOOTHNESS}"),
            ));
        }
        if !self.pin_offset.is_finite() {
            return Err(ConfigError::invalid("pin_offset", "must be finite"));
        }
        if self.max_simultaneous_steps == Some(0) {
            return Err(ConfigError::invalid(
                "max_simultaneous_steps",
                "must be at least 1 (use None for unbounded)",
            ));
        }
        Ok(())
    }

    /// Validate against a concrete creature.
    pub fn validate_for(&self, leg_count: usize) -> Result<(), ConfigError> {
        self.validate()?;
        if leg_count == 0 {
            return Err(ConfigError::NoLegs);
        }
        if let Some(pairs) = &self.orientation_pairs {
            for &[a, b] in pairs {
                if a >= leg_count || b >= leg_count {
                    return Err(ConfigError::PairOutOfRange { a, b, leg_count });
                }
            }
        }
        Ok(())
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Builder: set step size.
    pub fn with_step_size(mut self, step_size: f32) -> Self {
        self.step_size = step_size;
        self
    }

    /// Builder: set smoothness.
    pub fn with_smoothness(mut self, smoothness: u32) -> Self {
        self.smoothness = smoothness;
        self
    }

    /// Builder: set step height.
    pub fn with_step_height(mut self, height: f32) -> Self {
        self.step_height = height;
        self
    }

    /// Builder: set pin offset.
    pub fn with_pin_offset(mut self, offset: Vec3) -> Self {
        self.pin_offset = offset;
        self
    }

    /// Builder: set velocity lookahead multiplier.
    pub fn with_velocity_multiplier(mut self, multiplier: f32) -> Self {
        self.velocity_multiplier = multiplier;
        self
    }

    /// Builder: set probe radius and half range.
    pub fn with_probe(mut self, radius: f32, range: f32) -> Self {
        self.probe_radius = radius;
        self.raycast_range = range;
        self
    }

    /// Builder: set gait policy.
    pub fn with_gait_policy(mut self, policy: GaitPolicy) -> Self {
        self.gait_policy = policy;
        self
    }

    /// Builder: cap simultaneous steps.
    pub fn with_max_simultaneous_steps(mut self, max: usize) -> Self {
        self.max_simultaneous_steps = Some(max);
        self
    }

    /// Builder: enable or disable cross-group damping.
    pub fn with_cross_group_damping(mut self, enabled: bool) -> Self {
        self.cross_group_damping = enabled;
        self
    }

    /// Builder: enable or disable body orientation.
    pub fn with_body_orientation(mut self, enabled: bool) -> Self {
        self.body_orientation = enabled;
        self
    }

    /// Builder: set orientation pairs.
    pub fn with_orientation_pairs(mut self, pairs: Vec<[usize; 2]>) -> Self {
        self.orientation_pairs = Some(pairs);
        self
    }
}

const fn default_speed() -> f32 {
    3.0
}
const fn default_boost_multiplier() -> f32 {
    2.0
}
const fn default_strafe_factor() -> f32 {
    0.5
}
const fn default_support_smoothness() -> f32 {
    5.0
}
const fn default_ray_eccentricity() -> f32 {
    0.2
}
const fn default_inner_offset() -> f32 {
    25.0
}
const fn default_outer_offset() -> f32 {
    2.0
}
const fn default_ray_amount() -> usize {
    8
}
const fn default_support_probe_radius() -> f32 {
    0.01
}
const fn default_half_range() -> f32 {
    0.5
}
const fn default_body_velocity_epsilon() -> f32 {
    BODY_VELOCITY_EPSILON
}

/// Configuration for a whole-body crawler.
#[derive(Reflect, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportConfig {
    // === Movement ===
    /// Travel speed in units per second.
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Speed multiplier while boosting.
    #[serde(default = "default_boost_multiplier")]
    pub boost_multiplier: f32,
    /// Speed multiplier for sideways movement.
    #[serde(default = "default_strafe_factor")]
    pub strafe_factor: f32,
    /// Smoothing constant; blends use `1 / (1 + smoothness)`.
    #[serde(default = "default_support_smoothness")]
    pub smoothness: f32,
    /// Velocity dead-zone.
    #[serde(default = "default_body_velocity_epsilon")]
    pub velocity_epsilon: f32,

    // === Probe ring ===
    /// Number of ring directions. Each direction is cast at two offsets.
    #[serde(default = "default_ray_amount")]
    pub ray_amount: usize,
    /// Sideways spread of ring directions around "down".
    #[serde(default = "default_ray_eccentricity")]
    pub ray_eccentricity: f32,
    /// Inner band offset, in hundredths of a unit.
    #[serde(default = "default_inner_offset")]
    pub inner_offset: f32,
    /// Outer band offset, in hundredths of a unit.
    #[serde(default = "default_outer_offset")]
    pub outer_offset: f32,
    /// Radius of ring probes.
    #[serde(default = "default_support_probe_radius")]
    pub probe_radius: f32,
    /// Half range of ring probes.
    #[serde(default = "default_half_range")]
    pub half_range: f32,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            boost_multiplier: default_boost_multiplier(),
            strafe_factor: default_strafe_factor(),
            smoothness: default_support_smoothness(),
            velocity_epsilon: default_body_velocity_epsilon(),
            ray_amount: default_ray_amount(),
            ray_eccentricity: default_ray_eccentricity(),
            inner_offset: default_inner_offset(),
            outer_offset: default_outer_offset(),
            probe_radius: default_support_probe_radius(),
            half_range: default_half_range(),
        }
    }
}

impl SupportConfig {
    /// Blend factor `1 / (1 + smoothness)`.
    #[inline]
    pub fn blend_factor(&self) -> f32 {
        1.0 / (1.0 + self.smoothness)
    }

    /// Validate all fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("speed", self.speed)?;
        non_negative("boost_multiplier", self.boost_multiplier)?;
        non_negative("strafe_factor", self.strafe_factor)?;
        non_negative("smoothness", self.smoothness)?;
        non_negative("velocity_epsilon", self.velocity_epsilon)?;
        non_negative("ray_eccentricity", self.ray_eccentricity)?;
        finite("inner_offset", self.inner_offset)?;
        finite("outer_offset", self.outer_offset)?;
        non_negative("probe_radius", self.probe_radius)?;
        positive("half_range", self.half_range)?;
        if self.ray_amount == 0 {
            return Err(ConfigError::invalid("ray_amount", "must be at least 1"));
        }
        Ok(())
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder: set speed.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Builder: set smoothness.
    pub fn with_smoothness(mut self, smoothness: f32) -> Self {
        self.smoothness = smoothness;
        self
    }

    /// Builder: set the probe ring layout.
    pub fn with_ring(mut self, ray_amount: usize, eccentricity: f32) -> Self {
        self.ray_amount = ray_amount;
        self.ray_eccentricity = eccentricity;
        self
    }

    /// Builder: set band offsets (hundredths of a unit).
    pub fn with_offsets(mut self, inner: f32, outer: f32) -> Self {
        self.inner_offset = inner;
        self.outer_offset = outer;
        self
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be finite, got {value}")))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be > 0, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be >= 0, got {value}")))
    }
}
