//! Core locomotion systems.
//!
//! The tick drivers here are shared by every backend: a backend system builds
//! a [`TerrainProbe`] for each entity and hands it to [`tick_creature`] or
//! [`tick_crawler`]. The apply systems copy the result into the scene.

use std::marker::PhantomData;

use bevy::prelude::*;

use crate::backend::{LocomotionBackend, TerrainProbe};
use crate::creature::Creature;
use crate::intent::MovementIntent;
use crate::pose::{BodyPose, ReferenceFrame};
use crate::state::{Settled, Stepping};
use crate::support::Crawler;
use crate::LocomotionSet;

/// Entities whose `Transform` follows each leg, by leg index.
///
/// Targets must be top-level entities: their translation is written in world
/// space. Typically each one is the IK target of a leg chain.
#[derive(Component, Reflect, Debug, Clone, Default, PartialEq)]
#[reflect(Component)]
pub struct LegTargets(pub Vec<Entity>);

/// Fixed timestep in seconds, with a fallback for hosts that never advance
/// `Time<Fixed>`.
pub fn fixed_delta(time: Option<&Time<Fixed>>) -> f32 {
    time.map(|t| t.delta_secs())
        .filter(|&d| d > 0.0)
        .unwrap_or(1.0 / 60.0)
}

/// Run one creature tick against `probe` and write the pose back.
pub fn tick_creature<P: TerrainProbe + ?Sized>(
    transform: &mut Transform,
    frame: Option<&ReferenceFrame>,
    creature: &mut Creature,
    probe: &P,
) {
    let mut pose = body_pose(transform, frame);
    creature.tick(&mut pose, probe);
    pose.apply_to(transform);
}

/// Run one crawler tick against `probe` and write the pose back.
pub fn tick_crawler<P: TerrainProbe + ?Sized>(
    dt: f32,
    transform: &mut Transform,
    frame: Option<&ReferenceFrame>,
    crawler: &mut Crawler,
    intent: &MovementIntent,
    probe: &P,
) {
    let mut pose = body_pose(transform, frame);
    crawler.tick(dt, intent, &mut pose, probe);
    pose.apply_to(transform);
}

fn body_pose(transform: &Transform, frame: Option<&ReferenceFrame>) -> BodyPose {
    let pose = BodyPose::from_transform(transform);
    match frame {
        Some(frame) => pose.with_frame(*frame),
        None => pose,
    }
}

/// Copy each leg's world position into its target entity.
pub fn sync_leg_targets(
    q_creatures: Query<(&Creature, &LegTargets)>,
    mut q_targets: Query<&mut Transform, Without<Creature>>,
) {
    for (creature, targets) in &q_creatures {
        for (leg, &target) in creature.legs().iter().zip(&targets.0) {
            if let Ok(mut transform) = q_targets.get_mut(target) {
                transform.translation = leg.position;
            }
        }
    }
}

/// Keep exactly one of [`Stepping`] / [`Settled`] on each creature.
pub fn sync_state_markers(
    mut commands: Commands,
    q_creatures: Query<(Entity, &Creature, Option<&Stepping>, Has<Settled>)>,
) {
    for (entity, creature, stepping, has_settled) in &q_creatures {
        let moving = creature.moving_count();
        if moving > 0 {
            if stepping.map(|s| s.legs) != Some(moving) {
                commands.entity(entity).insert(Stepping::new(moving));
            }
            if has_settled {
                commands.entity(entity).remove::<Settled>();
            }
        } else {
            if !has_settled {
                commands.entity(entity).insert(Settled);
            }
            if stepping.is_some() {
                commands.entity(entity).remove::<Stepping>();
            }
        }
    }
}

/// Backend that probes an analytic terrain resource.
///
/// For headless hosts and tests. Entities tick only while a `T` resource
/// exists.
///
/// ```rust
/// use bevy::prelude::*;
/// use arthropod_locomotion::prelude::*;
///
/// let mut app = App::new();
/// app.add_plugins(MinimalPlugins)
///     .insert_resource(PlaneTerrain::flat(0.0))
///     .add_plugins(LocomotionPlugin::<StaticTerrainBackend<PlaneTerrain>>::default());
/// ```
pub struct StaticTerrainBackend<T> {
    _marker: PhantomData<T>,
}

impl<T: TerrainProbe + Resource> LocomotionBackend for StaticTerrainBackend<T> {
    fn plugin() -> impl Plugin {
        StaticTerrainPlugin::<T> {
            _marker: PhantomData,
        }
    }
}

/// Plugin installing the [`StaticTerrainBackend`] tick systems.
pub struct StaticTerrainPlugin<T> {
    _marker: PhantomData<T>,
}

impl<T: TerrainProbe + Resource> Plugin for StaticTerrainPlugin<T> {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (terrain_tick_creatures::<T>, terrain_tick_crawlers::<T>)
                .in_set(LocomotionSet::Tick),
        );
    }
}

fn terrain_tick_creatures<T: TerrainProbe + Resource>(
    terrain: Option<Res<T>>,
    mut q_creatures: Query<(&mut Transform, Option<&ReferenceFrame>, &mut Creature)>,
) {
    let Some(terrain) = terrain else {
        return;
    };
    for (mut transform, frame, mut creature) in &mut q_creatures {
        tick_creature(&mut transform, frame, &mut creature, &*terrain);
    }
}

fn terrain_tick_crawlers<T: TerrainProbe + Resource>(
    terrain: Option<Res<T>>,
    time: Option<Res<Time<Fixed>>>,
    mut q_crawlers: Query<
        (&mut Transform, Option<&ReferenceFrame>, &mut Crawler, &MovementIntent),
        Without<Creature>,
    >,
) {
    let Some(terrain) = terrain else {
        return;
    };
    let dt = fixed_delta(time.as_deref());
    for (mut transform, frame, mut crawler, intent) in &mut q_crawlers {
        tick_crawler(dt, &mut transform, frame, &mut crawler, intent, &*terrain);
    }
}
