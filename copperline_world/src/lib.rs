// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copperline World: the versioned spatial world model at the heart of a
//! push-and-shove PCB router.
//!
//! A router repeatedly hypothesises changes (move a segment, drop a via,
//! shove obstacles aside), measures the result, and either keeps it or rolls
//! it back. This crate provides the machinery that makes that cheap and
//! safe:
//!
//! - a **revision tree** ([`RevisionTree`]) of add/remove deltas over a
//!   stable item arena, supporting branch, squash, revert, and checkout;
//! - a **spatial index** (re-exported from `copperline_index`) that always
//!   mirrors the checked-out revision;
//! - a **joint graph** ([`JointMap`]) binding items that meet at the same
//!   position, net, and overlapping layers, with the split/merge rules
//!   multi-layer vias require;
//! - the [`World`] façade that keeps all three consistent and exposes
//!   collision queries and wire assembly on top.
//!
//! Routing algorithms, board persistence, clearance-rule sources, and UI
//! are external collaborators; the world only consumes a [`RuleResolver`]
//! and geometry from `copperline_geom`.
//!
//! # Example
//!
//! ```rust
//! use copperline_geom::{LayerRange, Seg, VecI};
//! use copperline_world::{Item, World};
//!
//! let mut world = World::new();
//! let seg = Item::segment(
//!     Seg::new(VecI::new(0, 0), VecI::new(100_000, 0)),
//!     20_000,
//!     LayerRange::single(0),
//!     1,
//! );
//! let id = world.add_segment(seg, false).unwrap();
//!
//! // Speculate on a branch, then roll it back.
//! let baseline = world.branch_move();
//! world.remove(id);
//! world.revert();
//! assert_eq!(world.revision(), baseline);
//! assert_eq!(world.len(), 1);
//! ```

#![no_std]

extern crate alloc;

pub mod arena;
pub mod item;
pub mod joint;
pub mod revision;
pub mod rules;
pub mod world;

pub use arena::{ItemArena, ItemId};
pub use copperline_index::ShapeIndex;
pub use item::{Body, BoardRef, Item, ItemKind, Line, Marker};
pub use joint::{Joint, JointLink, JointMap, JointTag};
pub use revision::{ChangeSet, RevisionId, RevisionPath, RevisionTree, path};
pub use rules::{DEFAULT_CLEARANCE, DefaultRules, RuleResolver};
pub use world::{DEFAULT_MAX_CLEARANCE, Obstacle, Probe, World};
