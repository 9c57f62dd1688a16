use std::sync::Arc;

use approx::assert_abs_diff_eq;
use impulse_forge::{
    particles::{GroundContacts, ParticleCableConstraint, ParticleForceGenerator, ParticleRod},
    *,
};

const DT: f32 = 1.0 / 60.0;

fn run(world: &mut ParticleWorld, steps: usize) {
    for _ in 0..steps {
        world.start_frame();
        world.run_physics(DT);
    }
}

#[test]
fn elastic_head_on_collision_swaps_velocities() {
    let mut particles = Arena::new();
    let a = particles.insert(Particle::new(Vec3::new(-1.0, 0.0, 0.0), 2.0).with_velocity(Vec3::new(3.0, 0.0, 0.0)));
    let b = particles.insert(Particle::new(Vec3::new(1.0, 0.0, 0.0), 2.0).with_velocity(Vec3::new(-3.0, 0.0, 0.0)));

    let momentum_before: Vec3 = particles.iter().map(|p| p.velocity * p.mass()).sum();

    let mut contacts = vec![ParticleContact::new(a, Some(b), -Vec3::X, 0.0).with_restitution(1.0)];
    ParticleContactResolver::new(2).resolve_contacts(&mut contacts, &mut particles, DT);

    let momentum_after: Vec3 = particles.iter().map(|p| p.velocity * p.mass()).sum();
    assert_abs_diff_eq!(particles.get(a).map(|p| p.velocity.x).unwrap_or_default(), -3.0, epsilon = 1e-5);
    assert_abs_diff_eq!(particles.get(b).map(|p| p.velocity.x).unwrap_or_default(), 3.0, epsilon = 1e-5);
    assert_abs_diff_eq!(momentum_before, momentum_after, epsilon = 1e-4);
}

#[test]
fn rod_keeps_falling_pair_at_length() {
    let mut world = ParticleWorld::new(SimulationConfig::default()).expect("valid config");
    let a = world.add_particle(Particle::new(Vec3::new(0.0, 2.0, 0.0), 1.0));
    let b = world.add_particle(Particle::new(Vec3::new(1.0, 2.0, 0.0), 1.0));
    let gravity: Arc<dyn ParticleForceGenerator> = Arc::new(Gravity::default());
    world.add_force(a, gravity.clone()).expect("particle exists");
    world.add_force(b, gravity).expect("particle exists");
    world.add_contact_generator(ParticleRod { particles: [a, b], length: 1.0 });
    world.add_contact_generator(GroundContacts::default());

    run(&mut world, 180);

    let pa = world.particle(a).expect("particle exists").position;
    let pb = world.particle(b).expect("particle exists").position;
    assert_abs_diff_eq!(pa.distance(pb), 1.0, epsilon = 0.05);
    assert!(pa.y > -0.05 && pb.y > -0.05, "pair sank: {pa:?} {pb:?}");
}

#[test]
fn cable_catches_falling_particle() {
    let mut world = ParticleWorld::new(SimulationConfig::default()).expect("valid config");
    let anchor = Vec3::new(0.0, 5.0, 0.0);
    let p = world.add_particle(
        Particle::new(Vec3::new(0.5, 4.0, 0.0), 1.0).with_acceleration(config::GRAVITY),
    );
    world.add_contact_generator(ParticleCableConstraint {
        particle: p,
        anchor,
        max_length: 2.0,
        restitution: 0.3,
    });

    run(&mut world, 120);

    let position = world.particle(p).expect("particle exists").position;
    assert!(position.distance(anchor) < 2.05, "cable stretched to {}", position.distance(anchor));
    assert!(position.y < 4.0, "particle should hang below its start");
}

#[test]
fn automatic_iterations_scale_with_contacts() {
    let mut world = ParticleWorld::new(SimulationConfig::default()).expect("valid config");
    for i in 0..3 {
        world.add_particle(Particle::new(Vec3::new(i as f32, -0.1, 0.0), 1.0));
    }
    world.add_contact_generator(GroundContacts::default());

    world.start_frame();
    world.run_physics(DT);

    assert_eq!(world.contacts().len(), 3);
    assert_eq!(world.resolver().iterations, 6);
    assert!(world.resolver().iterations_used() <= 6);
}
