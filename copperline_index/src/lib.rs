// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copperline Index: a payload-generic 2D AABB index over an R-tree.
//!
//! The index stores opaque payloads (the world layer uses stable item ids)
//! under integer bounding boxes and answers rectangle queries through a
//! visitor that may halt the traversal early. An auxiliary map keyed by net
//! code supports per-net enumeration without touching the tree.
//!
//! Entries are removed by identity: the payload is unique per entry and the
//! caller passes the same bounding box it inserted with (boxes derive
//! deterministically from immutable item geometry). Queries may deliver
//! false positives; geometric refinement is the caller's job.
//!
//! # Example
//!
//! ```rust
//! use copperline_geom::BBox;
//! use copperline_index::ShapeIndex;
//!
//! let mut idx: ShapeIndex<u32> = ShapeIndex::new();
//! idx.add(1, BBox::new(0, 0, 10, 10), 7);
//! idx.add(2, BBox::new(100, 0, 110, 10), 7);
//!
//! let mut hits = Vec::new();
//! idx.query(BBox::new(-5, -5, 20, 20), |p| {
//!     hits.push(p);
//!     true
//! });
//! assert_eq!(hits, vec![1]);
//! assert_eq!(idx.items_for_net(7).len(), 2);
//! ```

#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use copperline_geom::BBox;
use hashbrown::HashMap;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};

type Entry<P> = GeomWithData<Rectangle<[i32; 2]>, P>;

fn rect(bbox: BBox) -> Rectangle<[i32; 2]> {
    Rectangle::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y])
}

/// An R-tree of bounding boxes with unique payloads and a net-keyed
/// side map.
pub struct ShapeIndex<P: Copy + Eq + Hash> {
    tree: RTree<Entry<P>>,
    nets: HashMap<i32, Vec<P>>,
}

impl<P: Copy + Eq + Hash> Default for ShapeIndex<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Copy + Eq + Hash> ShapeIndex<P> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            nets: HashMap::new(),
        }
    }

    /// Insert a payload under its bounding box and net code.
    ///
    /// Inserting the same payload twice is the caller's bug; the index does
    /// not check.
    pub fn add(&mut self, payload: P, bbox: BBox, net: i32) {
        self.tree.insert(Entry::new(rect(bbox), payload));
        self.nets.entry(net).or_default().push(payload);
    }

    /// Remove a payload previously inserted with the same box and net.
    /// Returns whether an entry was removed.
    pub fn remove(&mut self, payload: P, bbox: BBox, net: i32) -> bool {
        let removed = self.tree.remove(&Entry::new(rect(bbox), payload)).is_some();
        if removed && let Some(list) = self.nets.get_mut(&net) {
            list.retain(|p| *p != payload);
            if list.is_empty() {
                self.nets.remove(&net);
            }
        }
        removed
    }

    /// Visit every payload whose stored box intersects `bbox`.
    ///
    /// The visitor returns `false` to halt the traversal; the call then
    /// returns `false` as well.
    pub fn query(&self, bbox: BBox, mut visitor: impl FnMut(P) -> bool) -> bool {
        let envelope = AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]);
        for entry in self.tree.locate_in_envelope_intersecting(&envelope) {
            if !visitor(entry.data) {
                return false;
            }
        }
        true
    }

    /// All payloads registered under `net`, in insertion order.
    pub fn items_for_net(&self, net: i32) -> &[P] {
        self.nets.get(&net).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate every payload in the index.
    pub fn iter(&self) -> impl Iterator<Item = P> + '_ {
        self.tree.iter().map(|e| e.data)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.nets.clear();
    }
}

impl<P: Copy + Eq + Hash + Debug> Debug for ShapeIndex<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShapeIndex")
            .field("entries", &self.tree.size())
            .field("nets", &self.nets.len())
            .finish_non_exhaustive()
    }
}
