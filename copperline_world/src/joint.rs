// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Joints: aggregation points for items meeting at the same position and
//! net on overlapping layers.

use alloc::vec::Vec;

use copperline_geom::{LayerRange, VecI};
use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::arena::ItemId;
use crate::item::ItemKind;

/// Hash key of a joint: exact position plus net code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct JointTag {
    /// Exact lattice position.
    pub pos: VecI,
    /// Net code.
    pub net: i32,
}

/// One membership entry of a joint.
///
/// The kind is immutable per item and cached here so corner tests need no
/// arena access.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct JointLink {
    /// The linked item.
    pub id: ItemId,
    /// Its kind.
    pub kind: ItemKind,
}

/// All items meeting at one (position, net) tag on overlapping layers.
#[derive(Clone, Debug)]
pub struct Joint {
    tag: JointTag,
    layers: LayerRange,
    links: SmallVec<[JointLink; 4]>,
    locked: bool,
}

impl Joint {
    /// Create an empty joint.
    pub fn new(tag: JointTag, layers: LayerRange) -> Self {
        Self {
            tag,
            layers,
            links: SmallVec::new(),
            locked: false,
        }
    }

    /// The joint's tag.
    pub fn tag(&self) -> JointTag {
        self.tag
    }

    /// Position of the joint.
    pub fn pos(&self) -> VecI {
        self.tag.pos
    }

    /// Net code of the joint.
    pub fn net(&self) -> i32 {
        self.tag.net
    }

    /// Merged layer range of everything linked here.
    pub fn layers(&self) -> LayerRange {
        self.layers
    }

    /// Number of linked items.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// The linked items.
    pub fn links(&self) -> &[JointLink] {
        &self.links
    }

    /// A line passes straight through here: exactly two links, both
    /// segments.
    pub fn is_line_corner(&self) -> bool {
        self.links.len() == 2 && self.links.iter().all(|l| l.kind == ItemKind::SEGMENT)
    }

    /// Given one segment of a line corner, the other one.
    pub fn next_segment(&self, seg: ItemId) -> Option<ItemId> {
        if !self.is_line_corner() {
            return None;
        }
        self.links.iter().map(|l| l.id).find(|id| *id != seg)
    }

    /// Whether the two joints share a layer.
    pub fn overlaps(&self, other: &Joint) -> bool {
        self.layers.overlaps(&other.layers)
    }

    /// Set the locked flag.
    pub fn lock(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Whether the joint is locked against shoving.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Add a link unless it is already present.
    pub fn link(&mut self, link: JointLink) {
        if !self.links.iter().any(|l| l.id == link.id) {
            self.links.push(link);
        }
    }

    /// Remove a link. Empty joints are kept; callers tolerate them.
    pub fn unlink(&mut self, id: ItemId) {
        self.links.retain(|l| l.id != id);
    }

    /// Absorb another joint: union of layer extents and links.
    pub fn merge(&mut self, other: Joint) {
        self.layers = self.layers.merged(&other.layers);
        self.locked |= other.locked;
        for link in other.links {
            self.link(link);
        }
    }
}

/// Multimap of joints keyed by tag; joints under one tag always have
/// pairwise-disjoint layer ranges.
#[derive(Debug, Default)]
pub struct JointMap {
    map: HashMap<JointTag, SmallVec<[Joint; 2]>>,
}

impl JointMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Find or create the joint covering `layers` at the tag, merging every
    /// overlapping joint into it.
    ///
    /// The repeated merge keeps the per-tag disjointness invariant: after
    /// this call, exactly one joint at the tag overlaps `layers`.
    pub fn touch(&mut self, pos: VecI, layers: LayerRange, net: i32) -> &mut Joint {
        let tag = JointTag { pos, net };
        let mut joint = Joint::new(tag, layers);
        let bucket = self.map.entry(tag).or_default();
        loop {
            let overlap = bucket.iter().position(|j| j.overlaps(&joint));
            match overlap {
                Some(i) => {
                    let other = bucket.remove(i);
                    joint.merge(other);
                }
                None => break,
            }
        }
        bucket.push(joint);
        bucket.last_mut().expect("joint was just pushed")
    }

    /// Link an item at a position.
    pub fn link(&mut self, pos: VecI, layers: LayerRange, net: i32, link: JointLink) {
        self.touch(pos, layers, net).link(link);
    }

    /// Unlink an item at a position. Orphan joints are not collected.
    pub fn unlink(&mut self, pos: VecI, layers: LayerRange, net: i32, id: ItemId) {
        self.touch(pos, layers, net).unlink(id);
    }

    /// Touch-or-create the joint covering `layers` and set its locked
    /// flag.
    pub fn lock(&mut self, pos: VecI, layers: LayerRange, net: i32, locked: bool) {
        self.touch(pos, layers, net).lock(locked);
    }

    /// First joint at (pos, net) whose layer range contains `layer`.
    pub fn find(&self, pos: VecI, layer: i32, net: i32) -> Option<&Joint> {
        self.map
            .get(&JointTag { pos, net })?
            .iter()
            .find(|j| j.layers().contains(layer))
    }

    /// Erase every joint at `tag` overlapping `layers`, returning the union
    /// of their link lists. This is the splitting half of via removal; the
    /// caller re-links the survivors under their own layer ranges.
    pub fn remove_overlapping(&mut self, tag: JointTag, layers: LayerRange) -> Vec<JointLink> {
        let mut links: Vec<JointLink> = Vec::new();
        if let Some(bucket) = self.map.get_mut(&tag) {
            let mut i = 0;
            while i < bucket.len() {
                if bucket[i].layers().overlaps(&layers) {
                    for link in bucket.remove(i).links {
                        if !links.iter().any(|l| l.id == link.id) {
                            links.push(link);
                        }
                    }
                } else {
                    i += 1;
                }
            }
            if bucket.is_empty() {
                self.map.remove(&tag);
            }
        }
        links
    }

    /// Iterate all joints.
    pub fn iter(&self) -> impl Iterator<Item = &Joint> {
        self.map.values().flat_map(|b| b.iter())
    }

    /// Number of joints in the map.
    pub fn len(&self) -> usize {
        self.map.values().map(|b| b.len()).sum()
    }

    /// Whether the map holds no joints.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lk(slot: u32, kind: ItemKind) -> JointLink {
        JointLink {
            id: ItemId::new(slot, 1),
            kind,
        }
    }

    #[test]
    fn touch_merges_overlapping_joints() {
        let mut map = JointMap::new();
        let p = VecI::new(50, 50);
        map.link(p, LayerRange::single(0), 1, lk(1, ItemKind::SEGMENT));
        map.link(p, LayerRange::single(3), 1, lk(2, ItemKind::SEGMENT));
        assert_eq!(map.len(), 2, "disjoint layers stay separate");

        // A via range spanning both merges them into one joint.
        map.link(p, LayerRange::new(0, 3), 1, lk(3, ItemKind::VIA));
        assert_eq!(map.len(), 1);
        let j = map.find(p, 0, 1).unwrap();
        assert_eq!(j.link_count(), 3);
        assert!(core::ptr::eq(j, map.find(p, 3, 1).unwrap()));
    }

    #[test]
    fn disjointness_by_net_and_position() {
        let mut map = JointMap::new();
        let p = VecI::new(0, 0);
        map.link(p, LayerRange::single(0), 1, lk(1, ItemKind::SEGMENT));
        map.link(p, LayerRange::single(0), 2, lk(2, ItemKind::SEGMENT));
        map.link(VecI::new(1, 0), LayerRange::single(0), 1, lk(3, ItemKind::SEGMENT));
        assert_eq!(map.len(), 3);
        assert_eq!(map.find(p, 0, 1).unwrap().link_count(), 1);
    }

    #[test]
    fn line_corner_needs_two_segments() {
        let mut j = Joint::new(
            JointTag {
                pos: VecI::ZERO,
                net: 1,
            },
            LayerRange::single(0),
        );
        j.link(lk(1, ItemKind::SEGMENT));
        assert!(!j.is_line_corner());
        j.link(lk(2, ItemKind::SEGMENT));
        assert!(j.is_line_corner());
        assert_eq!(j.next_segment(ItemId::new(1, 1)), Some(ItemId::new(2, 1)));
        j.link(lk(3, ItemKind::VIA));
        assert!(!j.is_line_corner());
        assert_eq!(j.next_segment(ItemId::new(1, 1)), None);
    }

    #[test]
    fn unlink_keeps_orphan_joint() {
        let mut map = JointMap::new();
        let p = VecI::new(7, 7);
        map.link(p, LayerRange::single(0), 1, lk(1, ItemKind::SEGMENT));
        map.unlink(p, LayerRange::single(0), 1, ItemId::new(1, 1));
        let j = map.find(p, 0, 1).expect("orphan joints are kept");
        assert_eq!(j.link_count(), 0);
    }

    #[test]
    fn remove_overlapping_splits() {
        let mut map = JointMap::new();
        let p = VecI::new(5, 5);
        map.link(p, LayerRange::single(0), 1, lk(1, ItemKind::SEGMENT));
        map.link(p, LayerRange::new(0, 3), 1, lk(2, ItemKind::VIA));
        map.link(p, LayerRange::single(3), 1, lk(3, ItemKind::SEGMENT));

        let tag = JointTag { pos: p, net: 1 };
        let links = map.remove_overlapping(tag, LayerRange::new(0, 3));
        assert_eq!(links.len(), 3);
        assert!(map.find(p, 0, 1).is_none());
    }

    #[test]
    fn lock_survives_merge() {
        let mut map = JointMap::new();
        let p = VecI::new(9, 9);
        map.lock(p, LayerRange::single(0), 1, true);
        map.link(p, LayerRange::new(0, 3), 1, lk(1, ItemKind::VIA));
        assert!(map.find(p, 2, 1).unwrap().is_locked());
    }
}
