use std::sync::Arc;

use impulse_forge::{config::GRAVITY, *};

const DT: f32 = 1.0 / 60.0;

fn run(world: &mut World, steps: usize) {
    for _ in 0..steps {
        world.start_frame();
        world.run_physics(DT);
    }
}

#[test]
fn bodies_fall_under_gravity() {
    let mut engine = PhysicsEngine::new(SimulationConfig::default()).expect("default config is valid");
    let id = engine.add_body(RigidBody::solid_sphere(0.5, 1.0).with_position(Vec3::new(0.0, 10.0, 0.0)));
    engine
        .world_mut()
        .add_force(id, Arc::new(Gravity::default()))
        .expect("body exists");

    engine.step(DT);

    let body = engine.get_body(id).expect("body should exist");
    assert!(body.position().y < 10.0, "body should start falling, y = {}", body.position().y);
    assert!(body.velocity().y < 0.0);
}

#[test]
fn resting_box_settles_and_sleeps() {
    let mut world = World::new(SimulationConfig::default()).expect("default config is valid");
    let cuboid = world.add_body(
        RigidBody::solid_box(Vec3::splat(0.5), 2.0)
            .with_position(Vec3::new(0.0, 0.5, 0.0))
            .with_acceleration(GRAVITY),
    );
    world.add_collider(CollisionBox::new(Some(cuboid), Vec3::splat(0.5))).expect("body exists");
    world.add_collider(CollisionPlane::new(Vec3::Y, 0.0)).expect("planes are static");

    run(&mut world, 240);

    let body = world.body(cuboid).expect("body exists");
    assert!((body.position().y - 0.5).abs() < 0.05, "box drifted to {}", body.position().y);
    assert!(body.velocity().length() < 0.2);
    assert!(!body.is_awake(), "box should have fallen asleep, motion {}", body.motion());
}

#[test]
fn ball_bounces_off_ground_and_loses_energy() {
    let mut world = World::new(SimulationConfig::default().with_restitution(0.6)).expect("valid config");
    let ball = world.add_body(
        RigidBody::solid_sphere(0.5, 1.0)
            .with_position(Vec3::new(0.0, 3.0, 0.0))
            .with_acceleration(GRAVITY),
    );
    world.add_collider(CollisionSphere::new(Some(ball), 0.5)).expect("body exists");
    world.add_collider(CollisionPlane::new(Vec3::Y, 0.0)).expect("planes are static");

    let mut peak_after_bounce = f32::MIN;
    let mut bounced = false;
    for _ in 0..240 {
        world.start_frame();
        world.run_physics(DT);
        let body = world.body(ball).expect("body exists");
        if body.velocity().y > 0.0 {
            bounced = true;
        }
        if bounced {
            peak_after_bounce = peak_after_bounce.max(body.position().y);
        }
        assert!(body.position().y > 0.3, "ball tunnelled to {}", body.position().y);
    }

    assert!(bounced, "ball never bounced");
    assert!(peak_after_bounce < 3.0, "bounce gained energy: {peak_after_bounce}");
}

#[test]
fn joint_holds_bodies_together() {
    let mut world = World::new(SimulationConfig::default()).expect("valid config");
    let anchor = world.add_body(RigidBody::fixed());
    let bob = world.add_body(
        RigidBody::solid_sphere(0.25, 1.0)
            .with_position(Vec3::new(1.0, 0.0, 0.0))
            .with_velocity(Vec3::new(2.0, 0.0, 0.0)),
    );
    world.add_contact_generator(Joint::new(anchor, Vec3::new(0.5, 0.0, 0.0), bob, Vec3::new(-0.5, 0.0, 0.0), 0.1));

    run(&mut world, 60);

    let bob = world.body(bob).expect("body exists");
    assert!(bob.position().x < 1.25, "joint let go: x = {}", bob.position().x);
    assert!(bob.velocity().x < 0.1);
    assert_eq!(world.body(anchor).map(|b| b.position()), Some(Vec3::ZERO));
}

#[test]
fn stats_describe_the_last_step() {
    let mut world = World::new(SimulationConfig::default()).expect("valid config");
    let a = world.add_body(RigidBody::solid_sphere(1.0, 1.0));
    let b = world.add_body(RigidBody::solid_sphere(1.0, 1.0).with_position(Vec3::new(1.5, 0.0, 0.0)));
    world.add_collider(CollisionSphere::new(Some(a), 1.0)).expect("body exists");
    world.add_collider(CollisionSphere::new(Some(b), 1.0)).expect("body exists");

    world.start_frame();
    world.run_physics(DT);

    let stats = world.stats();
    assert_eq!(stats.bodies_integrated, 2);
    assert_eq!(stats.potential_contacts, 1);
    assert_eq!(stats.contacts_generated, 1);
    assert!(stats.position_iterations >= 1);
    assert!(!stats.saturated);

    let separation = world.body(b).map(|b| b.position().x).unwrap_or_default()
        - world.body(a).map(|a| a.position().x).unwrap_or_default();
    assert!(separation > 1.5, "spheres were not pushed apart: {separation}");
}

#[test]
fn removed_bodies_leave_no_trace() {
    let mut world = World::new(SimulationConfig::default()).expect("valid config");
    let ids: Vec<BodyId> = (0..6)
        .map(|i| {
            let id = world.add_body(RigidBody::solid_box(Vec3::splat(0.5), 1.0).with_position(Vec3::new(i as f32 * 0.8, 0.0, 0.0)));
            world.add_collider(CollisionBox::new(Some(id), Vec3::splat(0.5))).expect("body exists");
            id
        })
        .collect();

    for id in ids.iter().step_by(2) {
        world.remove_body(*id).expect("body exists");
    }
    world.start_frame();
    world.run_physics(DT);

    for contact in world.contacts() {
        for body in contact.bodies.iter().flatten() {
            assert!(world.body(*body).is_some(), "contact references removed body {body}");
        }
    }
    assert_eq!(world.bodies().len(), 3);
}

#[test]
fn host_sees_fresh_transforms() {
    let mut world = World::new(SimulationConfig::default()).expect("valid config");
    let id = world.add_body(RigidBody::new().with_velocity(Vec3::new(1.0, 0.0, 0.0)));

    run(&mut world, 30);

    let body = world.body(id).expect("body exists");
    let matrix = body.column_major_transform();
    assert!((matrix[12] - body.position().x).abs() < 1e-6);
    assert_eq!(matrix[15], 1.0);
    assert!((body.point_in_world_space(Vec3::ZERO) - body.position()).length() < 1e-6);
}
