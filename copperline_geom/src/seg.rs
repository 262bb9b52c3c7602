// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line segments with integer distance and intersection queries.

use crate::bbox::BBox;
use crate::vector::{VecI, div_round};

/// A directed line segment between two lattice points.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Seg {
    /// Start point.
    pub a: VecI,
    /// End point.
    pub b: VecI,
}

impl Seg {
    /// Create a segment from endpoints.
    pub const fn new(a: VecI, b: VecI) -> Self {
        Self { a, b }
    }

    /// Euclidean length, rounded down.
    pub fn length(&self) -> i64 {
        self.a.dist(self.b)
    }

    /// Bounding box of the two endpoints.
    pub fn bbox(&self) -> BBox {
        BBox::from_points(self.a, self.b)
    }

    /// The point on the segment nearest to `p`, rounded to the lattice.
    pub fn nearest_point(&self, p: VecI) -> VecI {
        let d = self.b - self.a;
        let l_sq = d.length_sq();
        if l_sq == 0 {
            return self.a;
        }
        let t = (p - self.a).dot(d).clamp(0, l_sq);
        VecI::new(
            self.a.x + div_round(d.x as i128 * t, l_sq) as i32,
            self.a.y + div_round(d.y as i128 * t, l_sq) as i32,
        )
    }

    /// Squared distance from `p` to the segment.
    pub fn dist_sq_to_point(&self, p: VecI) -> i128 {
        self.nearest_point(p).dist_sq(p)
    }

    /// Squared distance between two segments (zero if they cross).
    pub fn dist_sq_to_seg(&self, other: &Self) -> i128 {
        if self.intersect(other).is_some() {
            return 0;
        }
        self.dist_sq_to_point(other.a)
            .min(self.dist_sq_to_point(other.b))
            .min(other.dist_sq_to_point(self.a))
            .min(other.dist_sq_to_point(self.b))
    }

    /// Whether `p` lies exactly on the segment.
    pub fn contains_point(&self, p: VecI) -> bool {
        (self.b - self.a).cross(p - self.a) == 0 && self.bbox().contains_point(p)
    }

    /// Intersection point of two segments, rounded to the lattice.
    ///
    /// Endpoint touching counts as an intersection; collinear overlap does
    /// not (there is no single crossing point to report).
    pub fn intersect(&self, other: &Self) -> Option<VecI> {
        let d1 = self.b - self.a;
        let d2 = other.b - other.a;
        let mut denom = d1.cross(d2);
        if denom == 0 {
            return None;
        }
        let w = other.a - self.a;
        let mut t_num = w.cross(d2);
        let mut u_num = w.cross(d1);
        if denom < 0 {
            denom = -denom;
            t_num = -t_num;
            u_num = -u_num;
        }
        if t_num < 0 || t_num > denom || u_num < 0 || u_num > denom {
            return None;
        }
        Some(VecI::new(
            self.a.x + div_round(d1.x as i128 * t_num, denom) as i32,
            self.a.y + div_round(d1.y as i128 * t_num, denom) as i32,
        ))
    }
}
