//! Legs and step motions.
//!
//! A [`Leg`] is owned by its creature. While it is stepping, exactly one
//! [`StepMotion`] refers to it by index; the motion is advanced once per tick
//! until it lands, at which point it commits the leg's new position and
//! clears the `moving` flag.

use std::f32::consts::PI;

use bevy::prelude::*;

use crate::detection::TerrainSample;

/// One of the two alternating gait groups.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegGroup {
    A,
    B,
}

impl LegGroup {
    /// Group of leg `index` among `leg_count` legs: `A` for the first half.
    pub fn of(index: usize, leg_count: usize) -> Self {
        if index < leg_count / 2 {
            Self::A
        } else {
            Self::B
        }
    }

    /// The other group.
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// A single leg.
#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct Leg {
    /// Index of this leg in its creature.
    pub index: usize,
    /// Rest anchor in body space.
    pub rest_offset: Vec3,
    /// Current world position of the foot (what the IK target follows).
    pub position: Vec3,
    /// Last landed world position. Only a landing step changes it.
    pub committed: Vec3,
    /// Whether a step motion currently owns this leg.
    pub moving: bool,
    /// Gait group.
    pub group: LegGroup,
}

impl Leg {
    /// Create a planted leg at `world_position`.
    pub fn new(index: usize, leg_count: usize, rest_offset: Vec3, world_position: Vec3) -> Self {
        Self {
            index,
            rest_offset,
            position: world_position,
            committed: world_position,
            moving: false,
            group: LegGroup::of(index, leg_count),
        }
    }

    /// Hold a planted leg at its committed position.
    pub fn pin(&mut self, offset: Vec3) {
        if !self.moving {
            self.position = self.committed + offset;
        }
    }
}

/// Height of the step arc at normalized time `t`.
///
/// Half a sine period: zero at both ends, `height` at `t = 0.5`.
#[inline]
pub fn step_arc(t: f32, height: f32) -> f32 {
    (t * PI).sin() * height
}

/// Result of advancing a step motion by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepProgress {
    /// Still in the air; the foot is at this position.
    InFlight(Vec3),
    /// Landed exactly on the target.
    Landed(Vec3),
}

/// Per-leg resumable step task.
///
/// Lasts `total = smoothness + 1` ticks. On tick `k` the foot sits at
/// `lerp(start, target, k / total) + up * step_arc(k / total)`; on the last
/// tick it snaps to the target with no arc residue.
#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct StepMotion {
    leg: usize,
    start: Vec3,
    target: TerrainSample,
    elapsed: u32,
    total: u32,
}

impl StepMotion {
    /// Create a step for leg `leg` from `start` to `target`.
    pub fn new(leg: usize, start: Vec3, target: TerrainSample, smoothness: u32) -> Self {
        Self {
            leg,
            start,
            target,
            elapsed: 0,
            total: smoothness.saturating_add(1),
        }
    }

    /// Index of the stepping leg.
    #[inline]
    pub fn leg(&self) -> usize {
        self.leg
    }

    /// Where the step started.
    #[inline]
    pub fn start(&self) -> Vec3 {
        self.start
    }

    /// Where the step lands.
    #[inline]
    pub fn target(&self) -> TerrainSample {
        self.target
    }

    /// Ticks advanced so far.
    #[inline]
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Ticks the step lasts.
    #[inline]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Whether the step has landed.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.total
    }

    /// Normalized progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.elapsed as f32 / self.total as f32
    }

    /// Advance one tick. `up` is the body's current up direction.
    pub fn advance(&mut self, up: Vec3, step_height: f32) -> StepProgress {
        if self.is_finished() {
            return StepProgress::Landed(self.target.point);
        }

        self.elapsed += 1;
        if self.is_finished() {
            return StepProgress::Landed(self.target.point);
        }

        let t = self.progress();
        let position = self.start.lerp(self.target.point, t) + up * step_arc(t, step_height);
        StepProgress::InFlight(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== LegGroup Tests ====================

    #[test]
    fn groups_split_by_half() {
        let groups: Vec<_> = (0..8).map(|i| LegGroup::of(i, 8)).collect();
        assert_eq!(&groups[..4], &[LegGroup::A; 4]);
        assert_eq!(&groups[4..], &[LegGroup::B; 4]);
    }

    #[test]
    fn odd_leg_count_puts_extra_leg_in_b() {
        let a = (0..5).filter(|&i| LegGroup::of(i, 5) == LegGroup::A).count();
        assert_eq!(a, 2);
    }

    #[test]
    fn other_group() {
        assert_eq!(LegGroup::A.other(), LegGroup::B);
        assert_eq!(LegGroup::B.other(), LegGroup::A);
    }

    // ==================== Leg Tests ====================

    #[test]
    fn pin_ignores_moving_leg() {
        let mut leg = Leg::new(0, 2, Vec3::ZERO, Vec3::X);
        leg.position = Vec3::Y;
        leg.moving = true;
        leg.pin(Vec3::ZERO);
        assert_eq!(leg.position, Vec3::Y);

        leg.moving = false;
        leg.pin(Vec3::new(0.0, 0.1, 0.0));
        assert_eq!(leg.position, Vec3::new(1.0, 0.1, 0.0));
    }

    // ==================== StepMotion Tests ====================

    #[test]
    fn arc_is_zero_at_ends_and_peaks_midway() {
        assert!(step_arc(0.0, 0.15).abs() < 1e-7);
        assert!(step_arc(1.0, 0.15).abs() < 1e-7);
        assert!((step_arc(0.5, 0.15) - 0.15).abs() < 1e-7);
    }

    #[test]
    fn step_lasts_smoothness_plus_one_ticks() {
        let target = TerrainSample::contact(Vec3::new(1.0, 0.0, 0.0), Vec3::Y);
        let mut step = StepMotion::new(0, Vec3::ZERO, target, 8);
        let mut in_flight = 0;
        loop {
            match step.advance(Vec3::Y, 0.15) {
                StepProgress::InFlight(_) => in_flight += 1,
                StepProgress::Landed(_) => break,
            }
        }
        assert_eq!(in_flight, 8);
        assert_eq!(step.elapsed(), 9);
        assert!(step.is_finished());
    }

    #[test]
    fn landing_snaps_exactly_to_target() {
        let point = Vec3::new(0.37, -0.02, 1.13);
        let mut step = StepMotion::new(3, Vec3::ZERO, TerrainSample::contact(point, Vec3::Y), 4);
        let mut last = StepProgress::InFlight(Vec3::ZERO);
        for _ in 0..5 {
            last = step.advance(Vec3::Y, 0.5);
        }
        assert_eq!(last, StepProgress::Landed(point));
    }

    #[test]
    fn in_flight_positions_follow_lerp_plus_arc() {
        let target = TerrainSample::contact(Vec3::new(0.9, 0.0, 0.0), Vec3::Y);
        let mut step = StepMotion::new(0, Vec3::ZERO, target, 2);

        // total = 3; first tick at t = 1/3
        let StepProgress::InFlight(p) = step.advance(Vec3::Y, 0.3) else {
            panic!("step landed too early");
        };
        let t = 1.0 / 3.0;
        assert!((p.x - 0.3).abs() < 1e-5);
        assert!((p.y - step_arc(t, 0.3)).abs() < 1e-5);
    }

    #[test]
    fn zero_smoothness_lands_on_first_tick() {
        let target = TerrainSample::floating(Vec3::ONE);
        let mut step = StepMotion::new(0, Vec3::ZERO, target, 0);
        assert_eq!(step.advance(Vec3::Y, 1.0), StepProgress::Landed(Vec3::ONE));
    }

    #[test]
    fn huge_smoothness_saturates() {
        let target = TerrainSample::floating(Vec3::ONE);
        let mut step = StepMotion::new(0, Vec3::ZERO, target, u32::MAX);
        assert_eq!(step.total(), u32::MAX);
        assert!(matches!(step.advance(Vec3::Y, 1.0), StepProgress::InFlight(_)));
    }

    #[test]
    fn advancing_a_landed_step_is_idempotent() {
        let target = TerrainSample::floating(Vec3::ONE);
        let mut step = StepMotion::new(0, Vec3::ZERO, target, 0);
        step.advance(Vec3::Y, 1.0);
        assert_eq!(step.advance(Vec3::Y, 1.0), StepProgress::Landed(Vec3::ONE));
        assert_eq!(step.elapsed(), 1);
    }
}
