use aimbridge::aim::{AimRequest, AimSourceResolver};
use aimbridge::config::{BridgeConfig, DirectionSource};
use aimbridge::replay::{FrameScript, HostScript, PoseScript, ScriptedHost, SphereCollider};
use aimbridge::spatial::GripSelection;
use aimbridge::Bridge;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// A scene with `count` random spheres scattered in front of the player.
fn create_scene(count: usize, seed: u64) -> FrameScript {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let colliders = (0..count)
        .map(|_| SphereCollider {
            center: Vec3::new(
                rng.gen_range(-15.0..15.0),
                rng.gen_range(-2.0..6.0),
                rng.gen_range(2.0..45.0),
            ),
            radius: rng.gen_range(0.2..2.5),
        })
        .collect();

    let pose = |position: Vec3, forward: Vec3| Some(PoseScript { position, forward });
    FrameScript {
        head: pose(Vec3::new(0.0, 1.7, 0.0), Vec3::new(0.05, -0.1, 1.0)),
        camera: pose(Vec3::new(0.0, 1.7, -3.0), Vec3::Z),
        left_ray: pose(Vec3::new(-0.3, 1.2, 0.2), Vec3::new(-0.1, 0.0, 1.0)),
        right_ray: pose(Vec3::new(0.3, 1.2, 0.2), Vec3::new(0.1, 0.0, 1.0)),
        actor: Some(Vec3::new(0.0, 0.0, 4.0)),
        colliders: Some(colliders),
        ..FrameScript::default()
    }
}

fn host_for(frame: &FrameScript) -> ScriptedHost {
    let mut host = ScriptedHost::new(&HostScript::default());
    host.begin_frame(frame);
    host
}

fn bench_resolution_by_collider_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("aim_resolution");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(3));

    let resolver = AimSourceResolver::default();
    let head = AimRequest::new(DirectionSource::HeadRaycast, GripSelection::Auto, 50.0);
    let controller = AimRequest::new(DirectionSource::ControllerRaycast, GripSelection::Auto, 50.0)
        .projected(true);

    for count in [0usize, 16, 128, 1024] {
        let host = host_for(&create_scene(count, 42));

        group.bench_with_input(BenchmarkId::new("head", count), &host, |b, host| {
            b.iter(|| resolver.resolve(black_box(host), black_box(&head)))
        });

        group.bench_with_input(BenchmarkId::new("controller", count), &host, |b, host| {
            b.iter(|| resolver.resolve(black_box(host), black_box(&controller)))
        });
    }

    group.finish();
}

fn bench_bridge_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("bridge_frame");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(2));

    let scene = create_scene(128, 7);
    let mut bridge = Bridge::new(BridgeConfig::default(), host_for(&scene));
    let mut frame = 0u64;

    group.bench_function("tick_and_resolve", |b| {
        b.iter(|| {
            frame += 1;
            bridge.tick(black_box(frame));
            let movement = bridge.resolve_movement_direction(black_box(Vec2::new(0.2, 0.9)));
            let aim = bridge.resolve_ability_aim_direction();
            bridge.host_mut().take_events();
            (movement, aim)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_resolution_by_collider_count, bench_bridge_frame);
criterion_main!(benches);
