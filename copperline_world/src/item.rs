// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routing items: solids, wire segments, vias, and transient lines.

use alloc::vec::Vec;

use copperline_geom::{BBox, Circle, LayerRange, LineChain, Seg, Shape, VecI};
use smallvec::{SmallVec, smallvec};

use crate::arena::ItemId;
use crate::revision::RevisionId;

bitflags::bitflags! {
    /// Item kind, usable as a mask in queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ItemKind: u8 {
        /// An immovable obstacle (pad, keepout, board edge).
        const SOLID = 0b0001;
        /// A wire segment.
        const SEGMENT = 0b0010;
        /// A via spanning several layers.
        const VIA = 0b0100;
        /// A transient assembled wire; never stored in the world.
        const LINE = 0b1000;
        /// Every kind.
        const ANY = 0b1111;
    }
}

bitflags::bitflags! {
    /// Scratch marker bits for external algorithms.
    ///
    /// The world only sets, clears, and scans these; their meaning belongs
    /// to the router.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Marker: u8 {
        /// Part of the head (the wire currently being routed).
        const HEAD = 0b0001;
        /// Currently violating a clearance rule.
        const VIOLATION = 0b0010;
        /// Must not be moved by shoving.
        const LOCKED = 0b0100;
        /// Coupled to a differential-pair partner.
        const COUPLED = 0b1000;
    }
}

/// Opaque handle to the host-board item an entry was created from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BoardRef {
    /// Host-side identity token.
    pub token: u64,
    /// Net code of the board item.
    pub net: i32,
}

/// Kind-specific geometry of a persistent item.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Body {
    /// An obstacle with an arbitrary outline.
    Solid {
        /// Anchor position (the joint tag position).
        pos: VecI,
        /// Collision outline.
        shape: Shape,
    },
    /// A wire segment.
    Segment {
        /// Centreline.
        seg: Seg,
        /// Copper width.
        width: i32,
    },
    /// A via barrel.
    Via {
        /// Centre.
        pos: VecI,
        /// Pad diameter.
        diameter: i32,
        /// Drill diameter.
        drill: i32,
    },
}

/// A persistent routing item.
///
/// Items are owned by the revision that added them (through the item arena)
/// and referenced everywhere else by [`ItemId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    body: Body,
    net: i32,
    layers: LayerRange,
    marker: Marker,
    rank: i32,
    parent: Option<BoardRef>,
}

impl Item {
    /// Create a solid obstacle.
    pub fn solid(pos: VecI, shape: Shape, layers: LayerRange, net: i32) -> Self {
        Self {
            body: Body::Solid { pos, shape },
            net,
            layers,
            marker: Marker::empty(),
            rank: -1,
            parent: None,
        }
    }

    /// Create a wire segment on a single-layer range.
    pub fn segment(seg: Seg, width: i32, layers: LayerRange, net: i32) -> Self {
        Self {
            body: Body::Segment { seg, width },
            net,
            layers,
            marker: Marker::empty(),
            rank: -1,
            parent: None,
        }
    }

    /// Create a via.
    pub fn via(pos: VecI, diameter: i32, drill: i32, layers: LayerRange, net: i32) -> Self {
        Self {
            body: Body::Via {
                pos,
                diameter,
                drill,
            },
            net,
            layers,
            marker: Marker::empty(),
            rank: -1,
            parent: None,
        }
    }

    /// Attach the host-board reference.
    pub fn with_parent(mut self, parent: BoardRef) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Kind of this item.
    pub fn kind(&self) -> ItemKind {
        match self.body {
            Body::Solid { .. } => ItemKind::SOLID,
            Body::Segment { .. } => ItemKind::SEGMENT,
            Body::Via { .. } => ItemKind::VIA,
        }
    }

    /// Whether the kind is in `mask`.
    pub fn of_kind(&self, mask: ItemKind) -> bool {
        mask.contains(self.kind())
    }

    /// Kind-specific geometry.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Net code.
    pub fn net(&self) -> i32 {
        self.net
    }

    /// Layer range the item exists on.
    pub fn layers(&self) -> LayerRange {
        self.layers
    }

    /// Anchor position: segment start, solid anchor, or via centre.
    pub fn pos(&self) -> VecI {
        match self.body {
            Body::Solid { pos, .. } | Body::Via { pos, .. } => pos,
            Body::Segment { seg, .. } => seg.a,
        }
    }

    /// Joint anchor points: both endpoints for a segment, the anchor
    /// position for solids and vias.
    pub fn anchors(&self) -> SmallVec<[VecI; 2]> {
        match self.body {
            Body::Solid { pos, .. } | Body::Via { pos, .. } => smallvec![pos],
            Body::Segment { seg, .. } => smallvec![seg.a, seg.b],
        }
    }

    /// Centreline of a segment; panics for other kinds.
    pub fn seg(&self) -> Seg {
        match self.body {
            Body::Segment { seg, .. } => seg,
            _ => panic!("not a segment"),
        }
    }

    /// Copper width of a segment, via pad diameter, or 0 for solids.
    pub fn width(&self) -> i32 {
        match self.body {
            Body::Segment { width, .. } => width,
            Body::Via { diameter, .. } => diameter,
            Body::Solid { .. } => 0,
        }
    }

    /// Collision outline.
    pub fn shape(&self) -> Shape {
        match self.body {
            Body::Solid { shape, .. } => shape,
            Body::Segment { seg, width } => Shape::Segment { seg, width },
            Body::Via { pos, diameter, .. } => Shape::Circle(Circle::new(pos, diameter / 2)),
        }
    }

    /// Bounding box of the outline.
    pub fn bbox(&self) -> BBox {
        self.shape().bbox()
    }

    /// Clearance hull: the outline inflated by
    /// `clearance + walkaround_width / 2`, as a closed octagon.
    pub fn hull(&self, clearance: i32, walkaround_width: i32) -> LineChain {
        self.shape().hull(clearance, walkaround_width)
    }

    /// Whether this item collides with `other` at the given clearance.
    ///
    /// Items on disjoint layers never collide; with `different_nets_only`,
    /// neither do items of the same net.
    pub fn collide(&self, other: &Item, clearance: i32, different_nets_only: bool) -> bool {
        if !self.layers.overlaps(&other.layers) {
            return false;
        }
        if different_nets_only && self.net == other.net {
            return false;
        }
        self.shape().collide(&other.shape(), clearance)
    }

    /// Whether this item collides with any sub-segment of `line`.
    pub fn collide_with_line(&self, line: &Line, clearance: i32, different_nets_only: bool) -> bool {
        (0..line.segment_count())
            .any(|i| self.collide(&line.probe_segment(i), clearance, different_nets_only))
    }

    /// Current marker bits.
    pub fn marker(&self) -> Marker {
        self.marker
    }

    /// Replace the marker bits.
    pub fn set_marker(&mut self, marker: Marker) {
        self.marker = marker;
    }

    /// Current rank (−1 when unranked).
    pub fn rank(&self) -> i32 {
        self.rank
    }

    /// Set the rank.
    pub fn set_rank(&mut self, rank: i32) {
        self.rank = rank;
    }

    /// Host-board reference, if any.
    pub fn parent(&self) -> Option<BoardRef> {
        self.parent
    }
}

/// A transient assembled wire: a connected run of segments viewed as one
/// polyline.
///
/// A line links the segments it was assembled from but never owns them, and
/// is itself never stored in the index, the revisions, or the joint map.
/// It may carry a via at its head end.
#[derive(Clone, Debug)]
pub struct Line {
    chain: LineChain,
    width: i32,
    layers: LayerRange,
    net: i32,
    links: Vec<ItemId>,
    owner: Option<RevisionId>,
    via: Option<Item>,
}

impl Line {
    /// Create an empty line with the given wire properties.
    pub fn new(width: i32, layers: LayerRange, net: i32) -> Self {
        Self {
            chain: LineChain::new(),
            width,
            layers,
            net,
            links: Vec::new(),
            owner: None,
            via: None,
        }
    }

    /// Build a line directly from a polyline.
    pub fn from_chain(chain: LineChain, width: i32, layers: LayerRange, net: i32) -> Self {
        Self {
            chain,
            width,
            layers,
            net,
            links: Vec::new(),
            owner: None,
            via: None,
        }
    }

    /// The underlying polyline.
    pub fn chain(&self) -> &LineChain {
        &self.chain
    }

    /// Append a corner.
    pub fn append_point(&mut self, p: VecI) {
        self.chain.append(p);
    }

    /// Corner at `i`.
    pub fn point(&self, i: usize) -> VecI {
        self.chain.point(i)
    }

    /// Number of sub-segments.
    pub fn segment_count(&self) -> usize {
        self.chain.segment_count()
    }

    /// Sub-segment at `i`.
    pub fn seg(&self, i: usize) -> Seg {
        self.chain.segment(i)
    }

    /// Wire width.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Layer range.
    pub fn layers(&self) -> LayerRange {
        self.layers
    }

    /// Net code.
    pub fn net(&self) -> i32 {
        self.net
    }

    /// Bounding box of the polyline inflated by the half-width.
    pub fn bbox(&self) -> BBox {
        self.chain.bbox().inflated(self.width / 2)
    }

    /// A transient segment item standing in for sub-segment `i`.
    pub fn probe_segment(&self, i: usize) -> Item {
        Item::segment(self.seg(i), self.width, self.layers, self.net)
    }

    /// Whether any sub-segment of this line collides with `item`.
    pub fn collide_with_item(
        &self,
        item: &Item,
        clearance: i32,
        different_nets_only: bool,
    ) -> bool {
        item.collide_with_line(self, clearance, different_nets_only)
    }

    /// Whether the line ends in a via.
    pub fn ends_with_via(&self) -> bool {
        self.via.is_some()
    }

    /// The end via, if any.
    pub fn via(&self) -> Option<&Item> {
        self.via.as_ref()
    }

    /// Attach a via to the head end; panics unless `via` is a via item.
    pub fn set_via(&mut self, via: Item) {
        assert!(via.kind() == ItemKind::VIA);
        self.via = Some(via);
    }

    /// Record a segment this line was assembled from (no ownership).
    pub fn link_segment(&mut self, id: ItemId) {
        self.links.push(id);
    }

    /// The linked segments, in walk order.
    pub fn linked_segments(&self) -> &[ItemId] {
        &self.links
    }

    /// Whether any segments are linked.
    pub fn is_linked(&self) -> bool {
        !self.links.is_empty()
    }

    /// Drop all segment links.
    pub fn clear_links(&mut self) {
        self.links.clear();
    }

    /// Revision this line was assembled against.
    pub fn owner(&self) -> Option<RevisionId> {
        self.owner
    }

    /// Set the owning revision.
    pub fn set_owner(&mut self, owner: Option<RevisionId>) {
        self.owner = owner;
    }

    /// Keep only the corners in `start..=end`, clipping the link list
    /// alongside when it runs parallel to the segments.
    pub fn clip_vertex_range(&mut self, start: usize, end: usize) {
        let full = self.links.len() == self.chain.segment_count();
        self.chain.clip_vertex_range(start, end);
        if full {
            self.links.truncate(end);
            self.links.drain(..start);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn seg_item(ax: i32, ay: i32, bx: i32, by: i32) -> Item {
        Item::segment(
            Seg::new(VecI::new(ax, ay), VecI::new(bx, by)),
            10,
            LayerRange::single(0),
            1,
        )
    }

    #[test]
    fn kinds_and_masks() {
        let s = seg_item(0, 0, 10, 0);
        assert_eq!(s.kind(), ItemKind::SEGMENT);
        assert!(s.of_kind(ItemKind::ANY));
        assert!(s.of_kind(ItemKind::SEGMENT | ItemKind::VIA));
        assert!(!s.of_kind(ItemKind::SOLID));
    }

    #[test]
    fn collide_respects_layers_and_nets() {
        let a = seg_item(0, 0, 100, 0);
        let mut b = seg_item(0, 5, 100, 5);
        assert!(a.collide(&b, 50, false));
        // Same net, different-nets-only: no collision.
        assert!(!a.collide(&b, 50, true));
        // Disjoint layers never collide.
        b = Item::segment(b.seg(), 10, LayerRange::single(3), 2);
        assert!(!a.collide(&b, 50, false));
    }

    #[test]
    fn via_shape_is_its_pad() {
        let v = Item::via(VecI::new(0, 0), 50, 20, LayerRange::new(0, 3), 1);
        assert_eq!(v.shape(), Shape::Circle(Circle::new(VecI::new(0, 0), 25)));
        assert_eq!(v.width(), 50);
    }

    #[test]
    fn anchors_per_kind() {
        let s = seg_item(0, 0, 10, 0);
        assert_eq!(s.anchors().as_slice(), &[VecI::new(0, 0), VecI::new(10, 0)]);
        let v = Item::via(VecI::new(5, 5), 50, 20, LayerRange::new(0, 3), 1);
        assert_eq!(v.anchors().as_slice(), &[VecI::new(5, 5)]);
    }

    #[test]
    fn line_clip_keeps_parallel_links() {
        let mut l = Line::from_chain(
            LineChain::from_points(vec![
                VecI::new(0, 0),
                VecI::new(10, 0),
                VecI::new(20, 0),
                VecI::new(30, 0),
            ]),
            10,
            LayerRange::single(0),
            1,
        );
        let ids: Vec<ItemId> = (0..3).map(|i| ItemId::new(i, 1)).collect();
        for id in &ids {
            l.link_segment(*id);
        }
        l.clip_vertex_range(1, 2);
        assert_eq!(l.chain().point_count(), 2);
        assert_eq!(l.linked_segments(), &ids[1..2]);
    }
}
