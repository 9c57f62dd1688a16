use std::sync::Arc;

use impulse_forge::{
    particles::{GroundContacts, ParticleCable, ParticleCableConstraint, ParticleRod},
    *,
};

const DT: f32 = 1.0 / 60.0;
const SEGMENTS: usize = 6;

fn main() -> Result<()> {
    let mut world = ParticleWorld::new(SimulationConfig::default())?;

    // Two rails of particles, rail 0 at z = -1 and rail 1 at z = 1.
    let mut rails: [Vec<ParticleId>; 2] = [Vec::new(), Vec::new()];
    for i in 0..SEGMENTS {
        for (side, rail) in rails.iter_mut().enumerate() {
            let position = Vec3::new(i as f32 * 2.0 - 5.0, 4.0, side as f32 * 2.0 - 1.0);
            rail.push(world.add_particle(Particle::new(position, 1.0).with_acceleration(config::GRAVITY)));
        }
    }

    for rail in &rails {
        for pair in rail.windows(2) {
            world.add_contact_generator(ParticleCable {
                particles: [pair[0], pair[1]],
                max_length: 1.9,
                restitution: 0.3,
            });
        }
    }
    for i in 0..SEGMENTS {
        world.add_contact_generator(ParticleRod {
            particles: [rails[0][i], rails[1][i]],
            length: 2.0,
        });
    }
    for (side, rail) in rails.iter().enumerate() {
        for (i, &particle) in rail.iter().enumerate() {
            world.add_contact_generator(ParticleCableConstraint {
                particle,
                anchor: Vec3::new(i as f32 * 2.2 - 5.5, 6.0, side as f32 * 1.6 - 0.8),
                max_length: if i < SEGMENTS / 2 { i as f32 * 0.5 + 3.0 } else { 5.5 - i as f32 * 0.5 },
                restitution: 0.5,
            });
        }
    }
    world.add_contact_generator(GroundContacts::default());

    // A heavy load dropped onto the middle of the deck.
    let load = world.add_particle(Particle::new(Vec3::new(0.0, 6.0, 0.0), 5.0));
    world.add_force(load, Arc::new(Gravity::default()))?;
    world.add_contact_generator(ParticleRod {
        particles: [load, rails[0][SEGMENTS / 2]],
        length: 2.2,
    });

    for frame in 1..=300 {
        world.start_frame();
        world.run_physics(DT);
        if frame % 60 == 0 {
            let lowest = world
                .particles()
                .iter()
                .map(|p| p.position.y)
                .fold(f32::INFINITY, f32::min);
            println!(
                "t={:>3.1}s contacts={:>2} lowest point y={lowest:.2}",
                frame as f32 * DT,
                world.contacts().len()
            );
        }
    }
    Ok(())
}
