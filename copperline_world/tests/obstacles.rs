// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Obstacle ranking along a line: hull intersections, path distances, the
//! swallowed-line fallback, and restricted candidate sets.

use copperline_geom::{LayerRange, LineChain, Seg, VecI};
use copperline_world::{DEFAULT_CLEARANCE, Item, ItemKind, Line, World};

fn pt(x: i32, y: i32) -> VecI {
    VecI::new(x, y)
}

fn long_line() -> Line {
    Line::from_chain(
        LineChain::from_points(vec![pt(-300_000, 0), pt(300_000, 0)]),
        10_000,
        LayerRange::single(0),
        1,
    )
}

#[test]
fn nearest_obstacle_ranks_by_path_distance() {
    let mut world = World::new();
    let via = world.add_via(Item::via(pt(50_000, 0), 20_000, 10_000, LayerRange::new(0, 3), 2));

    let line = long_line();
    let hit = world.nearest_obstacle(&line, ItemKind::ANY, None).unwrap();
    assert_eq!(hit.item, via);

    // Hull radius: via pad 10_000 + clearance 100_000 + half-width 5_000.
    let r = 10_000 + DEFAULT_CLEARANCE + 5_000;
    assert_eq!(hit.ip_first, Some(pt(50_000 - r, 0)));
    assert_eq!(hit.dist_first, (50_000 - r + 300_000) as i64);
    assert_eq!(hit.ip_last, Some(pt(50_000 + r, 0)));
    assert_eq!(hit.dist_last, (50_000 + r + 300_000) as i64);
    assert!(hit.hull.is_some());
}

#[test]
fn nearest_obstacle_prefers_the_closer_hit() {
    let mut world = World::new();
    let near = world.add_via(Item::via(
        pt(-100_000, 0),
        20_000,
        10_000,
        LayerRange::new(0, 3),
        2,
    ));
    let _far = world.add_via(Item::via(
        pt(150_000, 0),
        20_000,
        10_000,
        LayerRange::new(0, 3),
        3,
    ));

    let hit = world
        .nearest_obstacle(&long_line(), ItemKind::ANY, None)
        .unwrap();
    assert_eq!(hit.item, near);
}

#[test]
fn swallowed_line_returns_first_candidate_without_geometry() {
    let mut world = World::new();
    let via = world.add_via(Item::via(pt(0, 0), 20_000, 10_000, LayerRange::new(0, 3), 2));

    // A stub entirely inside the via's clearance hull: candidates exist but
    // the hull never crosses the centreline.
    let line = Line::from_chain(
        LineChain::from_points(vec![pt(-10_000, 0), pt(10_000, 0)]),
        10_000,
        LayerRange::single(0),
        1,
    );
    let hit = world.nearest_obstacle(&line, ItemKind::ANY, None).unwrap();
    assert_eq!(hit.item, via);
    assert_eq!(hit.ip_first, None);
    assert!(hit.hull.is_none());
}

#[test]
fn restricted_set_limits_the_geometry_scan() {
    let mut world = World::new();
    let skipped = world.add_via(Item::via(
        pt(-100_000, 0),
        20_000,
        10_000,
        LayerRange::new(0, 3),
        2,
    ));
    let allowed = world.add_via(Item::via(
        pt(150_000, 0),
        20_000,
        10_000,
        LayerRange::new(0, 3),
        3,
    ));

    let only_far = hashbrown_set([allowed]);
    let hit = world
        .nearest_obstacle(&long_line(), ItemKind::ANY, Some(&only_far))
        .unwrap();
    assert_eq!(hit.item, allowed);
    let _ = skipped;
}

#[test]
fn kind_mask_filters_candidates() {
    let mut world = World::new();
    world.add_via(Item::via(pt(50_000, 0), 20_000, 10_000, LayerRange::new(0, 3), 2));
    assert!(
        world
            .nearest_obstacle(&long_line(), ItemKind::SEGMENT, None)
            .is_none()
    );
}

#[test]
fn line_ending_in_a_via_checks_the_via_too() {
    let mut world = World::new();
    // Gap to the line's end: 127_000. Against the 5_000 half-width of the
    // wire that clears the 125_000 threshold; against the end via's
    // 10_000 radius it does not clear 130_000.
    let blocker = world.add_via(Item::via(
        pt(427_000, 0),
        40_000,
        20_000,
        LayerRange::new(0, 3),
        2,
    ));

    let mut line = long_line();
    line.set_via(Item::via(
        pt(300_000, 0),
        20_000,
        10_000,
        LayerRange::new(0, 3),
        1,
    ));
    assert!(line.ends_with_via());
    let hit = world.check_colliding(&line, ItemKind::ANY);
    assert_eq!(hit.map(|o| o.item), Some(blocker));
}

#[test]
fn pairwise_check_widens_for_lines() {
    let mut world = World::new();
    world
        .add_segment(
            Item::segment(
                Seg::new(pt(0, 0), pt(100_000, 0)),
                10_000,
                LayerRange::single(0),
                1,
            ),
            false,
        )
        .unwrap();

    let line = Line::from_chain(
        LineChain::from_points(vec![pt(0, 112_000), pt(100_000, 112_000)]),
        10_000,
        LayerRange::single(0),
        2,
    );
    let obstacle = Item::segment(
        Seg::new(pt(0, 0), pt(100_000, 0)),
        10_000,
        LayerRange::single(0),
        1,
    );
    // Centre gap 112_000 against clearance + both half-widths: collides at
    // the widened default (115_000), clears a forced 90_000 (105_000).
    assert!(world.check_colliding_pair(&line, &obstacle, ItemKind::ANY, None));
    assert!(!world.check_colliding_pair(&line, &obstacle, ItemKind::ANY, Some(90_000)));
}

fn hashbrown_set<const N: usize>(
    ids: [copperline_world::ItemId; N],
) -> hashbrown::HashSet<copperline_world::ItemId> {
    ids.into_iter().collect()
}
