//! Rapier3D backend implementation.
//!
//! Terrain probes are sphere casts through the Rapier query pipeline.
//! Enable with the `rapier3d` feature.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::{LocomotionBackend, ProbeRay};
use crate::collision::ProbeHit;
use crate::creature::Creature;
use crate::intent::MovementIntent;
use crate::pose::ReferenceFrame;
use crate::support::Crawler;
use crate::systems::{fixed_delta, tick_crawler, tick_creature};
use crate::LocomotionSet;

/// Rapier3D physics backend.
///
/// Casts exclude the creature's own rigid body and every sensor, and honour
/// the creature's `CollisionGroups` when it has one.
pub struct Rapier3dBackend;

impl LocomotionBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }
}

/// Plugin that sets up the Rapier3D tick systems.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (rapier_tick_creatures, rapier_tick_crawlers).in_set(LocomotionSet::Tick),
        );
    }
}

/// Sphere-cast `ray` through `context`.
///
/// The reported point is where the sphere touches the surface, i.e. the
/// sphere center at impact moved back along the normal by the radius.
pub fn rapier_sphere_cast(
    context: &RapierContext,
    ray: ProbeRay,
    exclude_entity: Entity,
    collision_groups: Option<CollisionGroups>,
) -> Option<ProbeHit> {
    let mut filter = QueryFilter::default()
        .exclude_rigid_body(exclude_entity)
        .exclude_sensors();
    if let Some(groups) = collision_groups {
        filter = filter.groups(groups);
    }

    let shape = Collider::ball(ray.radius.max(f32::EPSILON));
    context
        .cast_shape(
            ray.origin,
            Quat::IDENTITY,
            ray.direction,
            &shape,
            ShapeCastOptions {
                max_time_of_impact: ray.max_distance,
                stop_at_penetration: false,
                ..default()
            },
            filter,
        )
        .map(|(_, hit)| {
            let normal = hit
                .details
                .map(|d| d.normal1)
                .and_then(|n| n.try_normalize())
                .unwrap_or(-ray.direction);
            // Face the normal back toward the caster.
            let normal = if normal.dot(ray.direction) > 0.0 {
                -normal
            } else {
                normal
            };
            let center = ray.at(hit.time_of_impact);
            ProbeHit::new(center - normal * ray.radius, normal, hit.time_of_impact)
        })
}

fn rapier_tick_creatures(
    rapier_context: ReadRapierContext,
    mut q_creatures: Query<(
        Entity,
        &mut Transform,
        Option<&ReferenceFrame>,
        &mut Creature,
        Option<&CollisionGroups>,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, mut transform, frame, mut creature, groups) in &mut q_creatures {
        let groups = groups.copied();
        let probe = |ray: ProbeRay| rapier_sphere_cast(&context, ray, entity, groups);
        tick_creature(&mut transform, frame, &mut creature, &probe);
    }
}

fn rapier_tick_crawlers(
    rapier_context: ReadRapierContext,
    time: Option<Res<Time<Fixed>>>,
    mut q_crawlers: Query<
        (
            Entity,
            &mut Transform,
            Option<&ReferenceFrame>,
            &mut Crawler,
            &MovementIntent,
            Option<&CollisionGroups>,
        ),
        Without<Creature>,
    >,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };
    let dt = fixed_delta(time.as_deref());

    for (entity, mut transform, frame, mut crawler, intent, groups) in &mut q_crawlers {
        let groups = groups.copied();
        let probe = |ray: ProbeRay| rapier_sphere_cast(&context, ray, entity, groups);
        tick_crawler(dt, &mut transform, frame, &mut crawler, intent, &probe);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(TransformPlugin);
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
        app.insert_resource(Time::<Fixed>::from_hz(60.0));
        app.finish();
        app.cleanup();
        app
    }

    fn spawn_floor(app: &mut App) {
        // Top face at y = 0.
        let transform = Transform::from_xyz(0.0, -0.5, 0.0);
        app.world_mut().spawn((
            transform,
            GlobalTransform::from(transform),
            RigidBody::Fixed,
            Collider::cuboid(10.0, 0.5, 10.0),
        ));
    }

    fn cast(app: &mut App, ray: ProbeRay, exclude: Entity) -> Option<ProbeHit> {
        let mut state = bevy::ecs::system::SystemState::<ReadRapierContext>::new(app.world_mut());
        let rapier_context = state.get(app.world());
        let context = rapier_context.single().ok()?;
        rapier_sphere_cast(&context, ray, exclude, None)
    }

    #[test]
    fn sphere_cast_hits_floor_top() {
        let mut app = create_test_app();
        spawn_floor(&mut app);
        app.update();
        app.update();

        let caster = app.world_mut().spawn_empty().id();
        let ray = ProbeRay::new(Vec3::new(1.0, 2.0, 1.0), Vec3::NEG_Y, 0.1, 5.0);
        let hit = cast(&mut app, ray, caster).expect("floor should be hit");

        assert!(hit.point.y.abs() < 0.01, "contact at {:?}", hit.point);
        assert!((hit.normal - Vec3::Y).length() < 0.01);
        assert!((hit.distance - 1.9).abs() < 0.01);
    }

    #[test]
    fn sphere_cast_respects_max_distance() {
        let mut app = create_test_app();
        spawn_floor(&mut app);
        app.update();
        app.update();

        let caster = app.world_mut().spawn_empty().id();
        let ray = ProbeRay::new(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Y, 0.1, 1.0);
        assert!(cast(&mut app, ray, caster).is_none());
    }
}
