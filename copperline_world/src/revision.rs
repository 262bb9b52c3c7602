// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The revision tree: add/remove deltas over the item arena, with branch,
//! squash, revert, and path computation.
//!
//! Revisions track the world's history the way a source-control tree does:
//! every revision holds the items it added (owning them through the arena)
//! and references to ancestor-owned items it removed. Branching is cheap,
//! reverting destroys a leaf and its items, and squashing commits a child's
//! delta into its parent with cancellation.

use alloc::vec::Vec;

use crate::arena::{ItemArena, ItemId};

/// Identifier for a revision in the tree.
///
/// Same generational-slot discipline as [`ItemId`]: stale handles never
/// alias a later occupant of the slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RevisionId(pub(crate) u32, pub(crate) u32);

impl RevisionId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default)]
struct Revision {
    parent: Option<RevisionId>,
    branches: Vec<RevisionId>,
    added: Vec<ItemId>,
    removed: Vec<ItemId>,
}

/// Tree of revisions; always has a root.
#[derive(Debug)]
pub struct RevisionTree {
    slots: Vec<Option<Revision>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: RevisionId,
}

impl Default for RevisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RevisionTree {
    /// Create a tree holding a single empty root.
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: RevisionId::new(0, 0),
        };
        tree.root = tree.alloc(Revision::default());
        tree
    }

    /// The root revision.
    pub fn root(&self) -> RevisionId {
        self.root
    }

    /// Whether `id` refers to a live revision.
    pub fn contains(&self, id: RevisionId) -> bool {
        self.slots.get(id.idx()).is_some_and(|s| s.is_some())
            && self.generations[id.idx()] == id.1
    }

    /// Record an addition; takes logical ownership of the item.
    ///
    /// Panics unless `rev` is a leaf.
    pub fn add_item(&mut self, rev: RevisionId, item: ItemId) {
        assert!(self.is_leaf(rev), "mutating a non-leaf revision");
        self.rev_mut(rev).added.push(item);
    }

    /// Record a removal: cancel the addition if `rev` owns the item
    /// (releasing it from the arena), otherwise shadow it.
    ///
    /// Panics unless `rev` is a leaf.
    pub fn remove_item(&mut self, rev: RevisionId, item: ItemId, arena: &mut ItemArena) {
        assert!(self.is_leaf(rev), "mutating a non-leaf revision");
        let r = self.rev_mut(rev);
        if let Some(i) = r.added.iter().position(|a| *a == item) {
            r.added.swap_remove(i);
            arena.free(item);
        } else {
            r.removed.push(item);
        }
    }

    /// Create a new branch of `rev` and return it.
    pub fn branch(&mut self, rev: RevisionId) -> RevisionId {
        debug_assert!(self.contains(rev));
        let child = self.alloc(Revision {
            parent: Some(rev),
            ..Revision::default()
        });
        self.rev_mut(rev).branches.push(child);
        child
    }

    /// Detach `branch` from `rev` and destroy it together with its subtree
    /// and every item owned below it.
    pub fn remove_branch(&mut self, rev: RevisionId, branch: RevisionId, arena: &mut ItemArena) {
        debug_assert_eq!(self.rev(branch).parent, Some(rev));
        self.rev_mut(rev).branches.retain(|b| *b != branch);
        self.destroy_subtree(branch, arena);
    }

    /// Detach `branch` from `rev` without destroying it, returning it as a
    /// free-standing subtree. Paths cannot cross the detachment; dispose of
    /// the subtree with [`RevisionTree::destroy`].
    pub fn release_branch(&mut self, rev: RevisionId, branch: RevisionId) -> RevisionId {
        debug_assert_eq!(self.rev(branch).parent, Some(rev));
        self.rev_mut(rev).branches.retain(|b| *b != branch);
        self.rev_mut(branch).parent = None;
        branch
    }

    /// Destroy a revision and its subtree, detaching it from its parent
    /// first if it still has one. Frees every item owned below.
    pub fn destroy(&mut self, rev: RevisionId, arena: &mut ItemArena) {
        if let Some(parent) = self.rev(rev).parent {
            self.rev_mut(parent).branches.retain(|b| *b != rev);
        }
        self.destroy_subtree(rev, arena);
    }

    /// Destroy all branches of `rev`.
    pub fn clear_branches(&mut self, rev: RevisionId, arena: &mut ItemArena) {
        let branches = core::mem::take(&mut self.rev_mut(rev).branches);
        for b in branches {
            self.destroy_subtree(b, arena);
        }
    }

    /// Destroy the non-root revision `rev` (and its subtree), returning the
    /// parent.
    pub fn revert(&mut self, rev: RevisionId, arena: &mut ItemArena) -> RevisionId {
        let parent = self.rev(rev).parent.expect("reverting the root revision");
        self.remove_branch(parent, rev, arena);
        parent
    }

    /// Squash the non-root revision `rev` into its parent.
    ///
    /// The parent absorbs the delta with cancellation, `rev`'s siblings are
    /// destroyed (their deltas referenced a state that no longer exists),
    /// `rev`'s branches are adopted by the parent, and `rev` is deleted.
    /// Returns the parent.
    pub fn squash(&mut self, rev: RevisionId, arena: &mut ItemArena) -> RevisionId {
        let parent = self.rev(rev).parent.expect("squashing the root revision");

        // Absorb: removals first (cancelling against the parent's added
        // list frees the item), then the additions transfer ownership.
        let removed = core::mem::take(&mut self.rev_mut(rev).removed);
        for item in removed {
            let p = self.rev_mut(parent);
            if let Some(i) = p.added.iter().position(|a| *a == item) {
                p.added.swap_remove(i);
                arena.free(item);
            } else {
                p.removed.push(item);
            }
        }
        let added = core::mem::take(&mut self.rev_mut(rev).added);
        self.rev_mut(parent).added.extend(added);

        // Detach self, then drop the stale siblings and their subtrees.
        self.rev_mut(parent).branches.retain(|b| *b != rev);
        self.clear_branches(parent, arena);

        // The parent adopts the squashed revision's branches.
        let adopted = core::mem::take(&mut self.rev_mut(rev).branches);
        for b in &adopted {
            self.rev_mut(*b).parent = Some(parent);
        }
        self.rev_mut(parent).branches = adopted;

        self.free_slot(rev);
        parent
    }

    /// Drop `rev`'s deltas and branches, releasing every item it owns.
    pub fn clear_revision(&mut self, rev: RevisionId, arena: &mut ItemArena) {
        self.clear_branches(rev, arena);
        let added = core::mem::take(&mut self.rev_mut(rev).added);
        for item in added {
            arena.free(item);
        }
        self.rev_mut(rev).removed.clear();
    }

    /// Whether `item` is removed in `rev` or any ancestor.
    pub fn is_shadowed(&self, rev: RevisionId, item: ItemId) -> bool {
        let mut cur = Some(rev);
        while let Some(r) = cur {
            if self.rev(r).removed.contains(&item) {
                return true;
            }
            cur = self.rev(r).parent;
        }
        false
    }

    /// Whether `rev`'s added-items list holds `item`.
    pub fn owns(&self, rev: RevisionId, item: ItemId) -> bool {
        self.rev(rev).added.contains(&item)
    }

    /// The revision whose added-items list holds `item`, if any.
    pub fn find_owner(&self, item: ItemId) -> Option<RevisionId> {
        self.slots.iter().enumerate().find_map(|(i, slot)| {
            let rev = slot.as_ref()?;
            rev.added.contains(&item).then(|| {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "RevisionId uses 32-bit indices by design."
                )]
                RevisionId::new(i as u32, self.generations[i])
            })
        })
    }

    /// Parent of `rev`, or `None` at the root.
    pub fn parent(&self, rev: RevisionId) -> Option<RevisionId> {
        self.rev(rev).parent
    }

    /// Whether `rev` has no branches.
    pub fn is_leaf(&self, rev: RevisionId) -> bool {
        self.rev(rev).branches.is_empty()
    }

    /// Whether `rev` is the root.
    pub fn is_root(&self, rev: RevisionId) -> bool {
        self.rev(rev).parent.is_none()
    }

    /// Distance to the root; the root has depth 0.
    pub fn depth(&self, rev: RevisionId) -> usize {
        let mut depth = 0;
        let mut cur = self.rev(rev).parent;
        while let Some(r) = cur {
            depth += 1;
            cur = self.rev(r).parent;
        }
        depth
    }

    /// Number of non-cancelling changes recorded in `rev`.
    pub fn num_changes(&self, rev: RevisionId) -> usize {
        self.rev(rev).added.len() + self.rev(rev).removed.len()
    }

    /// Items added (owned) by `rev`.
    pub fn added(&self, rev: RevisionId) -> &[ItemId] {
        &self.rev(rev).added
    }

    /// Items removed (shadowed) by `rev`.
    pub fn removed(&self, rev: RevisionId) -> &[ItemId] {
        &self.rev(rev).removed
    }

    /// Branches of `rev`.
    pub fn branches(&self, rev: RevisionId) -> &[RevisionId] {
        &self.rev(rev).branches
    }

    /// Path from `rev` up to (excluding) `ancestor`, child-first.
    ///
    /// Panics if `ancestor` is not an ancestor of `rev`.
    pub fn path_to_ancestor(&self, rev: RevisionId, ancestor: RevisionId) -> RevisionPath {
        let mut revert = Vec::new();
        let mut cur = rev;
        while cur != ancestor {
            revert.push(cur);
            cur = self
                .rev(cur)
                .parent
                .expect("path target is not an ancestor");
        }
        RevisionPath {
            revert,
            apply: Vec::new(),
        }
    }

    fn alloc(&mut self, rev: Revision) -> RevisionId {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(rev);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "RevisionId uses 32-bit indices by design."
            )]
            RevisionId::new(idx as u32, generation)
        } else {
            self.slots.push(Some(rev));
            self.generations.push(1);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "RevisionId uses 32-bit indices by design."
            )]
            RevisionId::new((self.slots.len() - 1) as u32, 1)
        }
    }

    fn free_slot(&mut self, rev: RevisionId) {
        debug_assert!(self.contains(rev));
        self.slots[rev.idx()] = None;
        self.free_list.push(rev.idx());
    }

    fn destroy_subtree(&mut self, rev: RevisionId, arena: &mut ItemArena) {
        let branches = core::mem::take(&mut self.rev_mut(rev).branches);
        for b in branches {
            self.destroy_subtree(b, arena);
        }
        let added = core::mem::take(&mut self.rev_mut(rev).added);
        for item in added {
            arena.free(item);
        }
        self.free_slot(rev);
    }

    fn rev(&self, id: RevisionId) -> &Revision {
        assert!(self.contains(id), "dangling RevisionId");
        self.slots[id.idx()].as_ref().expect("dangling RevisionId")
    }

    fn rev_mut(&mut self, id: RevisionId) -> &mut Revision {
        assert!(self.contains(id), "dangling RevisionId");
        self.slots[id.idx()].as_mut().expect("dangling RevisionId")
    }
}

/// Travel plan between two revisions: revert these (child-first), then
/// apply those (parent-first).
#[derive(Clone, Debug, Default)]
pub struct RevisionPath {
    revert: Vec<RevisionId>,
    apply: Vec<RevisionId>,
}

impl RevisionPath {
    /// Revisions to revert, in child-to-ancestor order.
    pub fn revert(&self) -> &[RevisionId] {
        &self.revert
    }

    /// Revisions to apply, in ancestor-to-descendant order.
    pub fn apply(&self) -> &[RevisionId] {
        &self.apply
    }

    /// Total number of revisions on the path.
    pub fn len(&self) -> usize {
        self.revert.len() + self.apply.len()
    }

    /// Whether the path is empty.
    pub fn is_empty(&self) -> bool {
        self.revert.is_empty() && self.apply.is_empty()
    }
}

/// Path between two arbitrary revisions of the same tree.
///
/// Equalises depths, then walks both sides up in lockstep to the lowest
/// common ancestor. Panics if the two revisions do not share a root.
pub fn path(tree: &RevisionTree, from: RevisionId, to: RevisionId) -> RevisionPath {
    let mut from_depth = tree.depth(from);
    let mut to_depth = tree.depth(to);
    let mut from = from;
    let mut to = to;
    let mut revert = Vec::new();
    let mut apply = Vec::new();

    while from_depth > to_depth {
        revert.push(from);
        from = tree.parent(from).expect("depth accounted for a parent");
        from_depth -= 1;
    }
    while to_depth > from_depth {
        apply.push(to);
        to = tree.parent(to).expect("depth accounted for a parent");
        to_depth -= 1;
    }
    while from != to {
        revert.push(from);
        apply.push(to);
        match (tree.parent(from), tree.parent(to)) {
            (Some(f), Some(t)) => {
                from = f;
                to = t;
            }
            _ => panic!("revisions do not share a root"),
        }
    }

    apply.reverse();
    RevisionPath { revert, apply }
}

/// Cancellation-normalised summary of one or several revisions' deltas.
///
/// Non-owning: it refers to items by id without affecting their lifetime.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    added: Vec<ItemId>,
    removed: Vec<ItemId>,
}

impl ChangeSet {
    /// An empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an addition, cancelling a prior removal of the same item.
    pub fn add(&mut self, item: ItemId) {
        if let Some(i) = self.removed.iter().position(|r| *r == item) {
            self.removed.swap_remove(i);
        } else {
            self.added.push(item);
        }
    }

    /// Record a removal, cancelling a prior addition of the same item.
    pub fn remove(&mut self, item: ItemId) {
        if let Some(i) = self.added.iter().position(|a| *a == item) {
            self.added.swap_remove(i);
        } else {
            self.removed.push(item);
        }
    }

    /// Fold a revision's delta into the set.
    pub fn apply(&mut self, tree: &RevisionTree, rev: RevisionId) {
        for item in tree.added(rev) {
            self.add(*item);
        }
        for item in tree.removed(rev) {
            self.remove(*item);
        }
    }

    /// Fold the inverse of a revision's delta into the set.
    pub fn revert(&mut self, tree: &RevisionTree, rev: RevisionId) {
        for item in tree.added(rev) {
            self.remove(*item);
        }
        for item in tree.removed(rev) {
            self.add(*item);
        }
    }

    /// Summarise a whole path: revert the revert list, apply the apply
    /// list.
    pub fn from_path(tree: &RevisionTree, path: &RevisionPath) -> Self {
        let mut set = Self::new();
        for rev in path.revert() {
            set.revert(tree, *rev);
        }
        for rev in path.apply() {
            set.apply(tree, *rev);
        }
        set
    }

    /// Net additions.
    pub fn added(&self) -> &[ItemId] {
        &self.added
    }

    /// Net removals.
    pub fn removed(&self) -> &[ItemId] {
        &self.removed
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.added.clear();
        self.removed.clear();
    }

    /// Whether the set records no changes.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
