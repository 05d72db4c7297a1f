//! Gait scheduling.
//!
//! Two policies decide which legs are offered to foot placement each tick:
//!
//! - [`GaitPolicy::GroupedAlternating`]: legs are split into two groups. Only
//!   when both groups are settled is the active group evaluated, after which
//!   the other group becomes active. Planted legs of the evaluated group that
//!   deviate less than `step_size` simply hold.
//! - [`GaitPolicy::FarthestFirst`]: every leg, in flight or not, is measured
//!   and only the one deviating most (beyond `step_size`) may step. At most
//!   one step starts per tick; if the farthest leg is already in flight,
//!   none does.
//!
//! Both respect `max_simultaneous_steps` when it is set.

use bevy::prelude::*;

use crate::backend::TerrainProbe;
use crate::config::{GaitPolicy, LocomotionConfig};
use crate::detection::TerrainSample;
use crate::leg::{Leg, LegGroup};
use crate::placement::{FootPlacementSampler, Placement};

/// Steps chosen by one scheduling pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GaitDecision {
    /// Group evaluated this tick (grouped policy only).
    pub activated: Option<LegGroup>,
    /// Legs to start stepping, with their resolved footholds.
    pub steps: Vec<(usize, TerrainSample)>,
}

/// Alternating-group state machine.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct GaitScheduler {
    active: LegGroup,
}

impl Default for GaitScheduler {
    fn default() -> Self {
        Self {
            active: LegGroup::A,
        }
    }
}

impl GaitScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group evaluated next time both groups are settled.
    pub fn active_group(&self) -> LegGroup {
        self.active
    }

    /// Whether no leg of `group` is moving.
    pub fn is_settled(legs: &[Leg], group: LegGroup) -> bool {
        legs.iter().filter(|leg| leg.group == group).all(|leg| !leg.moving)
    }

    /// Run one scheduling pass.
    pub fn schedule<P: TerrainProbe + ?Sized>(
        &mut self,
        config: &LocomotionConfig,
        legs: &[Leg],
        sampler: &FootPlacementSampler<'_>,
        probe: &P,
    ) -> GaitDecision {
        let moving = legs.iter().filter(|leg| leg.moving).count();
        let capacity = config
            .max_simultaneous_steps
            .map_or(usize::MAX, |max| max.saturating_sub(moving));

        match config.gait_policy {
            GaitPolicy::GroupedAlternating => {
                self.grouped(config, legs, sampler, probe, capacity)
            }
            GaitPolicy::FarthestFirst => {
                farthest_first(config, legs, sampler, probe, capacity.min(1))
            }
        }
    }

    fn grouped<P: TerrainProbe + ?Sized>(
        &mut self,
        config: &LocomotionConfig,
        legs: &[Leg],
        sampler: &FootPlacementSampler<'_>,
        probe: &P,
        mut capacity: usize,
    ) -> GaitDecision {
        if !(Self::is_settled(legs, LegGroup::A) && Self::is_settled(legs, LegGroup::B)) {
            return GaitDecision::default();
        }

        let group = self.active;
        self.active = group.other();

        let mut steps = Vec::new();
        for leg in legs.iter().filter(|leg| leg.group == group) {
            if capacity == 0 {
                break;
            }
            let damping = damping(config, legs, leg.group);
            if let Placement::Step(target) = sampler.evaluate(leg, damping, probe) {
                steps.push((leg.index, target));
                capacity -= 1;
            }
        }

        GaitDecision {
            activated: Some(group),
            steps,
        }
    }
}

fn farthest_first<P: TerrainProbe + ?Sized>(
    config: &LocomotionConfig,
    legs: &[Leg],
    sampler: &FootPlacementSampler<'_>,
    probe: &P,
    capacity: usize,
) -> GaitDecision {
    let mut farthest: Option<(&Leg, f32)> = None;
    for leg in legs {
        let deviation = sampler.deviation(leg, damping(config, legs, leg.group));
        let threshold = farthest.map_or(config.step_size, |(_, d)| d);
        if deviation > threshold {
            farthest = Some((leg, deviation));
        }
    }

    let mut decision = GaitDecision::default();
    if let Some((leg, _)) = farthest {
        if !leg.moving && capacity > 0 {
            decision.steps.push((leg.index, sampler.resolve(leg, probe)));
        }
    }
    decision
}

/// Lookahead damping for a leg of `group`: the blend factor while any leg of
/// the opposite group is moving (when enabled), otherwise 1.
fn damping(config: &LocomotionConfig, legs: &[Leg], group: LegGroup) -> f32 {
    if config.cross_group_damping && !GaitScheduler::is_settled(legs, group.other()) {
        config.blend_factor()
    } else {
        1.0
    }
}
