// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational storage for persistent items.

use alloc::vec::Vec;

use crate::item::Item;

/// Identifier for an item in the arena.
///
/// A small, copyable handle that stays stable while the item lives and
/// becomes invalid when the owning revision releases it. It consists of a
/// slot index and a generation counter; a freed slot's stale ids never
/// alias a later occupant because the generation must match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ItemId(pub(crate) u32, pub(crate) u32);

impl ItemId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Slot arena holding every live item in a world.
///
/// Revisions own items logically by listing their ids; the arena holds the
/// storage. Exactly one revision lists any live id in its added-items, and
/// the entry is freed exactly when that revision is destroyed or the add is
/// cancelled within it.
#[derive(Debug, Default)]
pub struct ItemArena {
    slots: Vec<Option<Item>>,
    generations: Vec<u32>, // last generation per slot, persists across frees
    free_list: Vec<usize>,
}

impl ItemArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an item and return its handle.
    pub fn alloc(&mut self, item: Item) -> ItemId {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(item);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ItemId uses 32-bit indices by design."
            )]
            ItemId::new(idx as u32, generation)
        } else {
            self.slots.push(Some(item));
            self.generations.push(1);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ItemId uses 32-bit indices by design."
            )]
            ItemId::new((self.slots.len() - 1) as u32, 1)
        }
    }

    /// Release an item; panics if `id` is stale.
    pub fn free(&mut self, id: ItemId) -> Item {
        assert!(self.contains(id), "freeing a dangling ItemId");
        let item = self.slots[id.idx()].take().expect("dangling ItemId");
        self.free_list.push(id.idx());
        item
    }

    /// Whether `id` refers to a live item.
    pub fn contains(&self, id: ItemId) -> bool {
        self.slots.get(id.idx()).is_some_and(|s| s.is_some())
            && self.generations[id.idx()] == id.1
    }

    /// Borrow an item; panics if `id` is stale.
    pub fn item(&self, id: ItemId) -> &Item {
        assert!(self.contains(id), "dangling ItemId");
        self.slots[id.idx()].as_ref().expect("dangling ItemId")
    }

    /// Borrow an item mutably; panics if `id` is stale.
    pub fn item_mut(&mut self, id: ItemId) -> &mut Item {
        assert!(self.contains(id), "dangling ItemId");
        self.slots[id.idx()].as_mut().expect("dangling ItemId")
    }

    /// Borrow an item if `id` is live.
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.contains(id).then(|| self.item(id))
    }

    /// Borrow an item mutably if `id` is live.
    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.contains(id).then(|| self.item_mut(id))
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Whether the arena holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
