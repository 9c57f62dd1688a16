use impulse_forge::{config::GRAVITY, *};

const DT: f32 = 1.0 / 60.0;

fn main() -> Result<()> {
    let mut world = World::new(SimulationConfig::default().with_restitution(0.2))?;
    world.add_collider(CollisionPlane::new(Vec3::Y, 0.0))?;

    let mut boxes = Vec::new();
    for i in 0..6 {
        let tilt = Quat::from_euler(glam::EulerRot::XYZ, 0.1 * i as f32, 0.3 * i as f32, 0.0);
        let id = world.add_body(
            RigidBody::solid_box(Vec3::splat(0.5), 2.0)
                .with_position(Vec3::new((i % 2) as f32 * 0.3, 1.0 + i as f32 * 1.2, 0.0))
                .with_orientation(tilt)
                .with_acceleration(GRAVITY),
        );
        world.add_collider(CollisionBox::new(Some(id), Vec3::splat(0.5)))?;
        boxes.push(id);
    }

    let ball = world.add_body(
        RigidBody::solid_sphere(0.4, 1.0)
            .with_position(Vec3::new(-3.0, 2.0, 0.0))
            .with_velocity(Vec3::new(4.0, 2.0, 0.0))
            .with_acceleration(GRAVITY),
    );
    world.add_collider(CollisionSphere::new(Some(ball), 0.4))?;

    for frame in 1..=600 {
        world.start_frame();
        world.run_physics(DT);

        if frame % 60 == 0 {
            let stats = world.stats();
            let sleeping = world.bodies().iter().filter(|b| !b.is_awake()).count();
            println!(
                "t={:>4.1}s contacts={:>3} iterations={}/{} asleep={}",
                frame as f32 * DT,
                stats.contacts_generated,
                stats.position_iterations,
                stats.velocity_iterations,
                sleeping
            );
        }
    }

    for id in boxes.into_iter().chain(std::iter::once(ball)) {
        if let Some(body) = world.body(id) {
            println!("{id}: position {:.2?}", body.position());
        }
    }
    Ok(())
}
