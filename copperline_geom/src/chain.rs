// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Polylines over lattice points.

use alloc::vec::Vec;

use crate::bbox::BBox;
use crate::seg::Seg;
use crate::vector::VecI;

/// A polyline; optionally closed (the last vertex connects back to the
/// first), which is how clearance hulls are represented.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineChain {
    points: Vec<VecI>,
    closed: bool,
}

impl LineChain {
    /// An empty open chain.
    pub const fn new() -> Self {
        Self {
            points: Vec::new(),
            closed: false,
        }
    }

    /// Build an open chain from vertices.
    pub fn from_points(points: Vec<VecI>) -> Self {
        Self {
            points,
            closed: false,
        }
    }

    /// Build a closed outline from vertices.
    pub fn closed(points: Vec<VecI>) -> Self {
        Self {
            points,
            closed: true,
        }
    }

    /// Append a vertex, skipping an exact duplicate of the last one.
    pub fn append(&mut self, p: VecI) {
        if self.points.last() != Some(&p) {
            self.points.push(p);
        }
    }

    /// Whether the chain closes back on its first vertex.
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of vertices.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Vertex at `i`.
    pub fn point(&self, i: usize) -> VecI {
        self.points[i]
    }

    /// Last vertex; panics on an empty chain.
    pub fn last_point(&self) -> VecI {
        *self.points.last().expect("empty chain")
    }

    /// All vertices in order.
    pub fn points(&self) -> &[VecI] {
        &self.points
    }

    /// Number of segments (including the closing edge of a closed chain).
    pub fn segment_count(&self) -> usize {
        let n = self.points.len();
        if n < 2 {
            0
        } else if self.closed {
            n
        } else {
            n - 1
        }
    }

    /// Segment at `i`; the closing edge comes last for closed chains.
    pub fn segment(&self, i: usize) -> Seg {
        let n = self.points.len();
        debug_assert!(i < self.segment_count());
        Seg::new(self.points[i], self.points[(i + 1) % n])
    }

    /// Total length along the chain.
    pub fn length(&self) -> i64 {
        (0..self.segment_count()).map(|i| self.segment(i).length()).sum()
    }

    /// Bounding box of all vertices; a degenerate point box when empty.
    pub fn bbox(&self) -> BBox {
        let mut it = self.points.iter();
        let Some(first) = it.next() else {
            return BBox::from_point(VecI::ZERO);
        };
        it.fold(BBox::from_point(*first), |acc, p| {
            acc.union(&BBox::from_point(*p))
        })
    }

    /// Index of the vertex exactly equal to `p`, if any.
    pub fn find(&self, p: VecI) -> Option<usize> {
        self.points.iter().position(|q| *q == p)
    }

    /// Distance along the chain to the projection of `p` onto its nearest
    /// segment. Returns −1 for a chain with no segments.
    pub fn path_length(&self, p: VecI) -> i64 {
        let mut best: Option<(i128, i64)> = None;
        let mut acc = 0_i64;
        for i in 0..self.segment_count() {
            let s = self.segment(i);
            let near = s.nearest_point(p);
            let d = near.dist_sq(p);
            if best.map(|(bd, _)| d < bd).unwrap_or(true) {
                best = Some((d, acc + s.a.dist(near)));
            }
            acc += s.length();
        }
        best.map(|(_, len)| len).unwrap_or(-1)
    }

    /// All intersection points with `other`, ordered by this chain's walk.
    pub fn intersect(&self, other: &Self) -> Vec<VecI> {
        let mut out = Vec::new();
        for i in 0..self.segment_count() {
            let s = self.segment(i);
            for j in 0..other.segment_count() {
                if let Some(p) = s.intersect(&other.segment(j)) {
                    out.push(p);
                }
            }
        }
        out
    }

    /// Keep only the vertices in `start..=end`.
    pub fn clip_vertex_range(&mut self, start: usize, end: usize) {
        debug_assert!(start <= end && end < self.points.len());
        self.points.truncate(end + 1);
        self.points.drain(..start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn chain(pts: &[(i32, i32)]) -> LineChain {
        LineChain::from_points(pts.iter().map(|&(x, y)| VecI::new(x, y)).collect())
    }

    #[test]
    fn append_skips_duplicates() {
        let mut c = LineChain::new();
        c.append(VecI::new(0, 0));
        c.append(VecI::new(0, 0));
        c.append(VecI::new(5, 0));
        assert_eq!(c.point_count(), 2);
        assert_eq!(c.segment_count(), 1);
    }

    #[test]
    fn closed_chain_has_closing_edge() {
        let c = LineChain::closed(vec![
            VecI::new(0, 0),
            VecI::new(10, 0),
            VecI::new(10, 10),
        ]);
        assert_eq!(c.segment_count(), 3);
        assert_eq!(c.segment(2), Seg::new(VecI::new(10, 10), VecI::new(0, 0)));
    }

    #[test]
    fn path_length_walks_segments() {
        let c = chain(&[(0, 0), (100, 0), (100, 50)]);
        assert_eq!(c.path_length(VecI::new(40, 0)), 40);
        assert_eq!(c.path_length(VecI::new(100, 20)), 120);
        assert_eq!(c.length(), 150);
    }

    #[test]
    fn intersect_collects_crossings() {
        let c = chain(&[(0, 5), (20, 5)]);
        let box_chain = LineChain::closed(vec![
            VecI::new(5, 0),
            VecI::new(15, 0),
            VecI::new(15, 10),
            VecI::new(5, 10),
        ]);
        let isects = c.intersect(&box_chain);
        assert_eq!(isects.len(), 2);
        assert!(isects.contains(&VecI::new(5, 5)));
        assert!(isects.contains(&VecI::new(15, 5)));
    }

    #[test]
    fn clip_keeps_subrange() {
        let mut c = chain(&[(0, 0), (1, 0), (2, 0), (3, 0)]);
        c.clip_vertex_range(1, 2);
        assert_eq!(c.points(), &[VecI::new(1, 0), VecI::new(2, 0)]);
    }
}
