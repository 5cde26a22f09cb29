//! Collision hot path: one check runs every 20ms of a live run.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hurdle_runner::core::geometry::{point_in_polygon, Point, Rect};
use hurdle_runner::game::collision::{check_collision, obstacle_hitbox};
use hurdle_runner::game::config::CollisionConfig;

fn bench_point_in_polygon(c: &mut Criterion) {
    let config = CollisionConfig::default();
    let hull = obstacle_hitbox(&Rect::new(400.0, 220.0, 50.0, 80.0), &config);
    let inside = Point::new(425.0, 290.0);
    let outside = Point::new(402.0, 222.0);

    c.bench_function("point_in_polygon/inside", |b| {
        b.iter(|| point_in_polygon(black_box(inside), black_box(&hull)))
    });
    c.bench_function("point_in_polygon/outside", |b| {
        b.iter(|| point_in_polygon(black_box(outside), black_box(&hull)))
    });
}

fn bench_check_collision(c: &mut Criterion) {
    let config = CollisionConfig::default();
    let player = Rect::new(80.0, 240.0, 60.0, 60.0);
    let near = Rect::new(120.0, 220.0, 50.0, 80.0);
    let far = Rect::new(600.0, 220.0, 50.0, 80.0);

    c.bench_function("check_collision/overlap", |b| {
        b.iter(|| check_collision(black_box(&player), black_box(&near), &config))
    });
    c.bench_function("check_collision/clear", |b| {
        b.iter(|| check_collision(black_box(&player), black_box(&far), &config))
    });
}

criterion_group!(benches, bench_point_in_polygon, bench_check_collision);
criterion_main!(benches);
