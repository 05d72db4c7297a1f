//! Integration tests for the Rapier3D backend.
//!
//! A creature walks across a fixed cuboid collider; every foot it plants must
//! land on the collider's top face.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use arthropod_locomotion::prelude::*;

const FLOOR_TOP: f32 = -0.1;

#[derive(Component)]
struct Drive(Vec3);

fn drive_bodies(mut q: Query<(&mut Transform, &Drive)>) {
    for (mut transform, drive) in &mut q {
        transform.translation += drive.0;
    }
}

fn create_test_app() -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(TransformPlugin);
    app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
    app.add_plugins(LocomotionPlugin::<Rapier3dBackend>::default());
    app.insert_resource(Time::<Fixed>::from_hz(60.0));
    app.add_systems(FixedUpdate, drive_bodies.before(LocomotionSet::Tick));

    app.finish();
    app.cleanup();
    app
}

fn spawn_floor(app: &mut App) -> Entity {
    let transform = Transform::from_xyz(0.0, FLOOR_TOP - 0.5, 0.0);
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            RigidBody::Fixed,
            Collider::cuboid(20.0, 0.5, 20.0),
        ))
        .id()
}

fn spawn_creature(app: &mut App, drive: Vec3) -> Entity {
    let rest = vec![
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(0.5, -0.5, 0.0),
        Vec3::new(0.5, -0.5, 0.5),
        Vec3::new(0.5, -0.5, -0.5),
        Vec3::new(-0.5, -0.5, 0.0),
        Vec3::new(-0.5, -0.5, 0.5),
    ];
    let creature = Creature::new(LocomotionConfig::arthropod(), rest).unwrap();
    app.world_mut()
        .spawn((
            Transform::from_xyz(0.0, FLOOR_TOP + 0.5, 0.0),
            creature,
            Drive(drive),
        ))
        .id()
}

/// Advance time and run one physics frame.
fn tick(app: &mut App) {
    let timestep = std::time::Duration::from_secs_f64(1.0 / 60.0);
    app.world_mut()
        .resource_mut::<Time<Virtual>>()
        .advance_by(timestep);
    app.update();
    app.world_mut().run_schedule(FixedUpdate);
    app.update();
}

fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        tick(app);
    }
}

#[test]
fn walking_creature_plants_feet_on_collider() {
    let mut app = create_test_app();
    spawn_floor(&mut app);
    app.update();
    app.update();

    let body = spawn_creature(&mut app, Vec3::new(0.0, 0.0, -0.01));

    let mut stepped = false;
    for _ in 0..200 {
        tick(&mut app);
        let creature = app.world().get::<Creature>(body).unwrap();
        stepped |= creature.legs().iter().any(|leg| leg.moving);

        for leg in creature.legs().iter().filter(|leg| !leg.moving) {
            assert!(
                (leg.position.y - FLOOR_TOP).abs() < 0.02,
                "leg {} planted at {:?}",
                leg.index,
                leg.position
            );
        }
    }

    assert!(stepped, "creature never stepped");
    let z = app.world().get::<Transform>(body).unwrap().translation.z;
    assert!(z < -1.0, "body did not travel: z = {z}");
}

#[test]
fn standing_creature_stays_level_on_collider() {
    let mut app = create_test_app();
    spawn_floor(&mut app);
    app.update();
    app.update();

    let body = spawn_creature(&mut app, Vec3::ZERO);
    run_frames(&mut app, 30);

    let creature = app.world().get::<Creature>(body).unwrap();
    assert!(creature.is_settled());
    assert!(app.world().get::<Settled>(body).is_some());
    let up = app.world().get::<Transform>(body).unwrap().up();
    assert!(up.dot(Vec3::Y) > 0.999);
}

#[test]
fn creature_without_terrain_steps_to_unprojected_targets() {
    let mut app = create_test_app();
    app.update();

    let body = spawn_creature(&mut app, Vec3::new(0.0, 0.0, -0.01));
    let mut floating = 0;
    for _ in 0..120 {
        tick(&mut app);
        floating += app
            .world()
            .get::<Creature>(body)
            .unwrap()
            .last_report()
            .floating
            .len();
    }
    assert!(floating > 0);
}
