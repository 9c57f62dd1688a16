use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use impulse_forge::{config::GRAVITY, *};
use std::hint::black_box;

const DT: f32 = 1.0 / 60.0;

fn prepare_world(box_count: usize) -> World {
    let mut world = World::new(SimulationConfig::default()).expect("default config is valid");
    world.add_collider(CollisionPlane::new(Vec3::Y, 0.0)).expect("planes are static");
    let side = (box_count as f32).sqrt().ceil() as usize;
    for i in 0..box_count {
        let position = Vec3::new((i % side) as f32 * 1.1, 0.45, (i / side) as f32 * 1.1);
        let id = world.add_body(
            RigidBody::solid_box(Vec3::splat(0.5), 1.0)
                .with_position(position)
                .with_acceleration(GRAVITY),
        );
        world
            .add_collider(CollisionBox::new(Some(id), Vec3::splat(0.5)))
            .expect("body exists");
    }
    world
}

fn bench_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");
    for &count in &[16usize, 64, 256] {
        group.bench_with_input(BenchmarkId::new("sequential", count), &count, |b, &count| {
            b.iter(|| {
                let mut world = prepare_world(count);
                world.set_parallel_enabled(false);
                world.start_frame();
                world.run_physics(black_box(DT));
            })
        });
        group.bench_with_input(BenchmarkId::new("parallel", count), &count, |b, &count| {
            b.iter(|| {
                let mut world = prepare_world(count);
                world.set_parallel_enabled(true);
                world.start_frame();
                world.run_physics(black_box(DT));
            })
        });
    }
    group.finish();
}

fn bench_bvh(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh");
    for &count in &[128u32, 512, 2048] {
        let volumes: Vec<BoundingSphere> = (0..count)
            .map(|i| {
                let centre = Vec3::new((i % 32) as f32 * 1.5, (i / 1024) as f32 * 1.5, ((i / 32) % 32) as f32 * 1.5);
                BoundingSphere::new(centre, 1.0)
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("insert", count), &volumes, |b, volumes| {
            b.iter(|| {
                let mut bvh = Bvh::new();
                for (i, volume) in volumes.iter().enumerate() {
                    bvh.insert(BodyId::from_index(i as u32), *volume);
                }
                black_box(bvh.node_count())
            })
        });

        let mut bvh = Bvh::new();
        for (i, volume) in volumes.iter().enumerate() {
            bvh.insert(BodyId::from_index(i as u32), *volume);
        }
        group.bench_with_input(BenchmarkId::new("potential_contacts", count), &bvh, |b, bvh| {
            let mut pairs = Vec::with_capacity(config::DEFAULT_MAX_POTENTIAL_CONTACTS);
            b.iter(|| {
                pairs.clear();
                black_box(bvh.potential_contacts(&mut pairs, config::DEFAULT_MAX_POTENTIAL_CONTACTS))
            })
        });
    }
    group.finish();
}

fn bench_box_and_box(c: &mut Criterion) {
    let reference = CollisionBox::fixed(Affine3A::IDENTITY, Vec3::splat(0.5));
    let other = CollisionBox::fixed(
        Affine3A::from_rotation_translation(Quat::from_rotation_y(0.6), Vec3::new(0.3, 0.9, 0.1)),
        Vec3::splat(0.5),
    );
    let mut data = CollisionData::new(config::DEFAULT_MAX_CONTACTS);

    c.bench_function("box_and_box", |b| {
        b.iter(|| {
            data.reset();
            black_box(CollisionDetector::box_and_box(black_box(&reference), black_box(&other), &mut data))
        })
    });
}

criterion_group!(benches, bench_world_step, bench_bvh, bench_box_and_box);
criterion_main!(benches);
