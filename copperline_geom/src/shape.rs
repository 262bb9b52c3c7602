// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collision outlines: circles, rectangles, thick segments, and their
//! octagonal clearance hulls.

use alloc::vec::Vec;

use crate::bbox::BBox;
use crate::chain::LineChain;
use crate::seg::Seg;
use crate::vector::VecI;

/// A filled circle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Circle {
    /// Centre.
    pub pos: VecI,
    /// Radius.
    pub radius: i32,
}

impl Circle {
    /// Create a circle from centre and radius.
    pub const fn new(pos: VecI, radius: i32) -> Self {
        Self { pos, radius }
    }
}

/// The geometric outline of a routing item.
///
/// Collision tests reduce every variant to a skeleton (a point, a segment,
/// or a rectangle) plus an outline radius; the gap between two outlines is
/// the skeleton distance minus the radii.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    /// A circular pad or via barrel.
    Circle(Circle),
    /// An axis-aligned rectangular pad.
    Rect(BBox),
    /// A wire segment with a width.
    Segment {
        /// Centreline.
        seg: Seg,
        /// Full copper width.
        width: i32,
    },
}

impl Shape {
    /// Bounding box of the outline.
    pub fn bbox(&self) -> BBox {
        match self {
            Self::Circle(c) => BBox::from_point(c.pos).inflated(c.radius),
            Self::Rect(r) => *r,
            Self::Segment { seg, width } => seg.bbox().inflated(width / 2),
        }
    }

    /// Outline radius around the skeleton.
    fn radius(&self) -> i128 {
        match self {
            Self::Circle(c) => c.radius as i128,
            Self::Rect(_) => 0,
            Self::Segment { width, .. } => (*width / 2) as i128,
        }
    }

    fn skeleton_dist_sq(&self, other: &Self) -> i128 {
        use Shape::*;
        match (self, other) {
            (Circle(a), Circle(b)) => a.pos.dist_sq(b.pos),
            (Circle(a), Segment { seg, .. }) | (Segment { seg, .. }, Circle(a)) => {
                seg.dist_sq_to_point(a.pos)
            }
            (Circle(a), Rect(r)) | (Rect(r), Circle(a)) => r.dist_sq_to_point(a.pos),
            (Segment { seg: a, .. }, Segment { seg: b, .. }) => a.dist_sq_to_seg(b),
            (Segment { seg, .. }, Rect(r)) | (Rect(r), Segment { seg, .. }) => {
                rect_seg_dist_sq(r, seg)
            }
            (Rect(a), Rect(b)) => rect_rect_dist_sq(a, b),
        }
    }

    /// Whether the gap between the two outlines is below `clearance`.
    ///
    /// Overlapping outlines always collide, clearance zero included.
    pub fn collide(&self, other: &Self, clearance: i32) -> bool {
        let thr = clearance.max(0) as i128 + self.radius() + other.radius();
        let d = self.skeleton_dist_sq(other);
        d < thr * thr || d == 0
    }

    /// Whether the outline covers `p` (border included).
    pub fn contains_point(&self, p: VecI) -> bool {
        match self {
            Self::Circle(c) => c.pos.dist_sq(p) <= (c.radius as i128) * (c.radius as i128),
            Self::Rect(r) => r.contains_point(p),
            Self::Segment { seg, width } => {
                let r = (*width / 2) as i128;
                seg.dist_sq_to_point(p) <= r * r
            }
        }
    }

    /// Closed octagonal outline inflated by
    /// `clearance + walkaround_width / 2`.
    pub fn hull(&self, clearance: i32, walkaround_width: i32) -> LineChain {
        let cl = clearance + walkaround_width / 2;
        match self {
            Self::Circle(c) => {
                let d = c.radius + cl;
                octagonal_hull(
                    c.pos - VecI::new(d, d),
                    VecI::new(2 * d, 2 * d),
                    0,
                    chamfer(d),
                )
            }
            Self::Rect(r) => octagonal_hull(
                r.min() - VecI::new(cl, cl),
                r.size() + VecI::new(2 * cl, 2 * cl),
                0,
                chamfer(cl),
            ),
            Self::Segment { seg, width } => segment_hull(seg, *width, cl),
        }
    }
}

fn chamfer(d: i32) -> i32 {
    (d as i64 * 52 / 100) as i32
}

fn rect_seg_dist_sq(r: &BBox, s: &Seg) -> i128 {
    if r.contains_point(s.a) || r.contains_point(s.b) {
        return 0;
    }
    let c = [
        VecI::new(r.min_x, r.min_y),
        VecI::new(r.max_x, r.min_y),
        VecI::new(r.max_x, r.max_y),
        VecI::new(r.min_x, r.max_y),
    ];
    (0..4)
        .map(|i| s.dist_sq_to_seg(&Seg::new(c[i], c[(i + 1) % 4])))
        .min()
        .unwrap_or(0)
}

fn rect_rect_dist_sq(a: &BBox, b: &BBox) -> i128 {
    let dx = (a.min_x - b.max_x).max(b.min_x - a.max_x).max(0) as i128;
    let dy = (a.min_y - b.max_y).max(b.min_y - a.max_y).max(0) as i128;
    dx * dx + dy * dy
}

/// Closed octagon around the box at `p0` with extent `size`, grown by
/// `clearance`, corners cut back by `chamfer`.
pub fn octagonal_hull(p0: VecI, size: VecI, clearance: i32, chamfer: i32) -> LineChain {
    let cl = clearance;
    let ch = chamfer;
    LineChain::closed(Vec::from([
        VecI::new(p0.x - cl, p0.y - cl + ch),
        VecI::new(p0.x - cl, p0.y + size.y + cl - ch),
        VecI::new(p0.x - cl + ch, p0.y + size.y + cl),
        VecI::new(p0.x + size.x + cl - ch, p0.y + size.y + cl),
        VecI::new(p0.x + size.x + cl, p0.y + size.y + cl - ch),
        VecI::new(p0.x + size.x + cl, p0.y - cl + ch),
        VecI::new(p0.x + size.x + cl - ch, p0.y - cl),
        VecI::new(p0.x - cl + ch, p0.y - cl),
    ]))
}

/// Closed octagon around a thick segment grown by `clearance`.
pub fn segment_hull(seg: &Seg, width: i32, clearance: i32) -> LineChain {
    let d = width / 2 + clearance;
    if seg.a == seg.b {
        return octagonal_hull(
            seg.a - VecI::new(d, d),
            VecI::new(2 * d, 2 * d),
            0,
            chamfer(d),
        );
    }
    // 2 / (1 + sqrt(2)) of the inflation, the regular-octagon corner cut.
    let x = (d as i64 * 8284 / 10000).max(1);
    let dir = seg.b - seg.a;
    let p0 = dir.perpendicular().resized(d as i64);
    let ds = dir.perpendicular().resized(x / 2);
    let pd = dir.resized(x / 2);
    let dp = dir.resized(d as i64);
    LineChain::closed(Vec::from([
        seg.b + p0 + pd,
        seg.b + dp + ds,
        seg.b + dp - ds,
        seg.b - p0 + pd,
        seg.a - p0 - pd,
        seg.a - dp - ds,
        seg.a - dp + ds,
        seg.a + p0 - pd,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(x: i32, y: i32, r: i32) -> Shape {
        Shape::Circle(Circle::new(VecI::new(x, y), r))
    }

    fn track(ax: i32, ay: i32, bx: i32, by: i32, w: i32) -> Shape {
        Shape::Segment {
            seg: Seg::new(VecI::new(ax, ay), VecI::new(bx, by)),
            width: w,
        }
    }

    #[test]
    fn circles_collide_within_clearance() {
        let a = circle(0, 0, 10);
        let b = circle(40, 0, 10);
        // Gap is 20.
        assert!(!a.collide(&b, 20));
        assert!(a.collide(&b, 21));
    }

    #[test]
    fn overlap_collides_at_zero_clearance() {
        let a = circle(0, 0, 10);
        let b = circle(5, 0, 10);
        assert!(a.collide(&b, 0));
        let r1 = Shape::Rect(BBox::new(0, 0, 10, 10));
        let r2 = Shape::Rect(BBox::new(5, 5, 20, 20));
        assert!(r1.collide(&r2, 0));
    }

    #[test]
    fn track_to_rect_gap() {
        let t = track(0, 20, 100, 20, 10);
        let r = Shape::Rect(BBox::new(40, 0, 60, 10));
        // Centreline at y=20, half-width 5, rect ends at y=10: gap is 5.
        assert!(!t.collide(&r, 5));
        assert!(t.collide(&r, 6));
    }

    #[test]
    fn contains_point_per_outline() {
        assert!(circle(0, 0, 10).contains_point(VecI::new(6, 8)));
        assert!(!circle(0, 0, 10).contains_point(VecI::new(7, 8)));
        assert!(track(0, 0, 100, 0, 10).contains_point(VecI::new(50, 5)));
        assert!(!track(0, 0, 100, 0, 10).contains_point(VecI::new(50, 6)));
    }

    #[test]
    fn hulls_are_octagons_enclosing_the_shape() {
        let s = track(0, 0, 100, 0, 10);
        let hull = s.hull(20, 0);
        assert!(hull.is_closed());
        assert_eq!(hull.point_count(), 8);
        let hb = hull.bbox();
        let sb = s.bbox();
        assert!(hb.min_x <= sb.min_x - 20 && hb.max_x >= sb.max_x + 20);

        let v = circle(50, 50, 10).hull(15, 0);
        assert_eq!(v.point_count(), 8);
        assert!(v.bbox().contains_point(VecI::new(75, 50)));
    }

    #[test]
    fn hull_intersects_crossing_line() {
        let obstacle = circle(50, 0, 10);
        let hull = obstacle.hull(10, 0);
        let line = LineChain::from_points(Vec::from([VecI::new(0, 0), VecI::new(100, 0)]));
        let isects = line.intersect(&hull);
        assert_eq!(isects.len(), 2, "a through line enters and leaves");
    }
}
