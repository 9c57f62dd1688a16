use impulse_forge::*;

const DT: f32 = 1.0 / 100.0;

#[derive(Debug, Clone, Copy)]
enum Shot {
    Pistol,
    Artillery,
    Fireball,
    Laser,
}

impl Shot {
    fn particle(self) -> Particle {
        let origin = Vec3::new(0.0, 1.5, 0.0);
        let (mass, velocity, acceleration, damping) = match self {
            Shot::Pistol => (2.0, Vec3::new(0.0, 0.0, 35.0), Vec3::new(0.0, -1.0, 0.0), 0.99),
            Shot::Artillery => (200.0, Vec3::new(0.0, 30.0, 40.0), Vec3::new(0.0, -20.0, 0.0), 0.99),
            Shot::Fireball => (1.0, Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.6, 0.0), 0.9),
            Shot::Laser => (0.1, Vec3::new(0.0, 0.0, 100.0), Vec3::ZERO, 0.99),
        };
        Particle::new(origin, mass)
            .with_velocity(velocity)
            .with_acceleration(acceleration)
            .with_damping(damping)
    }
}

fn main() -> Result<()> {
    let mut world = ParticleWorld::new(SimulationConfig::default())?;
    let shots: Vec<(Shot, ParticleId)> = [Shot::Pistol, Shot::Artillery, Shot::Fireball, Shot::Laser]
        .into_iter()
        .map(|shot| (shot, world.add_particle(shot.particle())))
        .collect();

    let mut live = shots.clone();
    let mut elapsed = 0.0;
    while !live.is_empty() && elapsed < 5.0 {
        world.start_frame();
        world.run_physics(DT);
        elapsed += DT;

        live.retain(|&(shot, id)| {
            let Some(particle) = world.particle(id) else {
                return false;
            };
            let position = particle.position;
            if position.y < 0.0 || position.z > 200.0 {
                println!("{shot:?} landed after {elapsed:.2}s at z={:.1}", position.z);
                return false;
            }
            true
        });
    }

    for (shot, id) in live {
        if let Some(particle) = world.particle(id) {
            println!("{shot:?} still in flight at {:.1?}", particle.position);
        }
    }
    Ok(())
}
