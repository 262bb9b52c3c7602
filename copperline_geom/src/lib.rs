// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copperline Geom: integer 2D geometry for the router core.
//!
//! All coordinates are integer nanometres (`i32`, the board's native unit);
//! products and squared distances widen to `i128` so that no realistic board
//! extent can overflow. Endpoint equality is exact, which higher layers rely
//! on for hashing positions.
//!
//! The crate provides:
//!
//! - [`VecI`]: 2D integer vectors with widened dot/cross products.
//! - [`BBox`]: inclusive axis-aligned bounding boxes.
//! - [`LayerRange`]: inclusive copper-layer intervals.
//! - [`Seg`] and [`LineChain`]: segments and polylines with integer
//!   distance, intersection, and path-length queries.
//! - [`Shape`]: the collision outlines (circle, rectangle, thick segment)
//!   with pairwise gap tests and octagonal clearance hulls.

#![no_std]

extern crate alloc;

pub mod bbox;
pub mod chain;
pub mod layers;
pub mod seg;
pub mod shape;
pub mod vector;

pub use bbox::BBox;
pub use chain::LineChain;
pub use layers::LayerRange;
pub use seg::Seg;
pub use shape::{Circle, Shape};
pub use vector::VecI;
