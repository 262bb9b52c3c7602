// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};

use copperline_geom::{BBox, LayerRange, Seg, VecI};
use copperline_index::ShapeIndex;
use copperline_world::{Item, ItemKind, World};

const PITCH: i32 = 500_000;

fn gen_grid_segments(n: i32) -> Vec<Item> {
    let mut out = Vec::with_capacity((n * n) as usize);
    for y in 0..n {
        for x in 0..n {
            let a = VecI::new(x * PITCH, y * PITCH);
            let b = VecI::new(x * PITCH + PITCH / 2, y * PITCH);
            out.push(Item::segment(
                Seg::new(a, b),
                20_000,
                LayerRange::single(0),
                y + 1,
            ));
        }
    }
    out
}

fn populated_world(n: i32) -> World {
    let mut world = World::new();
    for item in gen_grid_segments(n) {
        let _ = world.add_segment(item, true);
    }
    world
}

fn bench_index_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_query");
    for &n in &[32_i32, 64] {
        group.throughput(Throughput::Elements((n * n) as u64));

        group.bench_function(format!("shape_index_build_query_n{n}"), |b| {
            let items = gen_grid_segments(n);
            b.iter_batched(
                ShapeIndex::<u32>::new,
                |mut idx| {
                    for (i, item) in items.iter().enumerate() {
                        idx.add(i as u32, item.bbox(), item.net());
                    }
                    let q = BBox::new(0, 0, 8 * PITCH, 8 * PITCH);
                    let mut hits = 0_u32;
                    idx.query(q, |_| {
                        hits += 1;
                        true
                    });
                    black_box(hits)
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("query_colliding_n{n}"), |b| {
            let world = populated_world(n);
            let probe = Item::segment(
                Seg::new(VecI::new(0, 0), VecI::new(4 * PITCH, 0)),
                20_000,
                LayerRange::single(0),
                0,
            );
            b.iter(|| {
                let mut obs = Vec::new();
                world.query_colliding(&probe, &mut obs, ItemKind::ANY, None, true, None);
                black_box(obs.len())
            });
        });
    }
    group.finish();
}

fn bench_branch_revert(c: &mut Criterion) {
    let mut group = c.benchmark_group("branch_revert");
    for &n in &[32_i32] {
        group.throughput(Throughput::Elements(64));

        group.bench_function(format!("speculate_and_revert_n{n}"), |b| {
            b.iter_batched(
                || populated_world(n),
                |mut world| {
                    world.branch_move();
                    for item in gen_grid_segments(8) {
                        let moved = Item::segment(
                            Seg::new(
                                item.seg().a + VecI::new(0, PITCH / 4),
                                item.seg().b + VecI::new(0, PITCH / 4),
                            ),
                            20_000,
                            item.layers(),
                            item.net(),
                        );
                        let _ = world.add_segment(moved, true);
                    }
                    world.revert();
                    black_box(world.len())
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("speculate_and_squash_n{n}"), |b| {
            b.iter_batched(
                || populated_world(n),
                |mut world| {
                    world.branch_move();
                    for item in gen_grid_segments(8) {
                        let moved = Item::segment(
                            Seg::new(
                                item.seg().a + VecI::new(PITCH / 4, 0),
                                item.seg().b + VecI::new(PITCH / 4, 0),
                            ),
                            20_000,
                            item.layers(),
                            item.net(),
                        );
                        let _ = world.add_segment(moved, true);
                    }
                    world.squash();
                    black_box(world.len())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_index_query, bench_branch_revert);
criterion_main!(benches);
