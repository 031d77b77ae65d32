// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot storage for contents with generational handles and a z-order cache.

use super::Content;
use super::id::ContentId;

/// Every live content, addressed by [`ContentId`].
///
/// Destroyed contents are recycled via a free list, and generation counters
/// prevent stale handle access. Besides the slots, the store keeps the
/// insertion order (iterated newest-first) and a cached bottom-to-top z-order
/// that is rebuilt lazily after any z-index change.
#[derive(Debug, Default)]
pub struct ContentStore {
    slots: Vec<Option<Content>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,

    // Oldest first.
    insertion: Vec<u32>,

    // -- Z-order cache --
    z_order: Vec<u32>,
    z_dirty: bool,
}

impl ContentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a content and returns its handle.
    pub fn insert(&mut self, content: Content) -> ContentId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.generation[idx as usize] += 1;
            self.slots[idx as usize] = Some(content);
            idx
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Some(content));
            self.generation.push(0);
            idx
        };
        self.insertion.push(idx);
        self.z_dirty = true;
        ContentId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Removes a content, freeing its slot for reuse.
    ///
    /// Returns `None` if the handle is stale.
    pub fn remove(&mut self, id: ContentId) -> Option<Content> {
        if !self.is_alive(id) {
            return None;
        }
        let content = self.slots[id.idx as usize].take();
        self.insertion.retain(|&i| i != id.idx);
        self.z_order.retain(|&i| i != id.idx);
        self.free_list.push(id.idx);
        content
    }

    /// Returns whether the handle refers to a live content.
    #[must_use]
    pub fn is_alive(&self, id: ContentId) -> bool {
        (id.idx as usize) < self.slots.len()
            && self.generation[id.idx as usize] == id.generation
            && self.slots[id.idx as usize].is_some()
    }

    /// Turns a packed handle from [`ContentId::to_handle`] back into a
    /// live id, or `None` once that content is gone.
    #[must_use]
    pub fn resolve(&self, handle: u64) -> Option<ContentId> {
        let id = ContentId::from_handle(handle);
        self.is_alive(id).then_some(id)
    }

    /// Looks up a live content.
    #[must_use]
    pub fn get(&self, id: ContentId) -> Option<&Content> {
        if self.generation.get(id.idx as usize) != Some(&id.generation) {
            return None;
        }
        self.slots.get(id.idx as usize)?.as_ref()
    }

    /// Looks up a live content mutably.
    ///
    /// Z-index changes made through this reference are not seen by the
    /// z-order cache; use [`mark_z_dirty`](Self::mark_z_dirty).
    pub fn get_mut(&mut self, id: ContentId) -> Option<&mut Content> {
        if self.generation.get(id.idx as usize) != Some(&id.generation) {
            return None;
        }
        self.slots.get_mut(id.idx as usize)?.as_mut()
    }

    /// Number of live contents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.insertion.len()
    }

    /// Returns `true` if no content is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.insertion.is_empty()
    }

    fn id_at(&self, idx: u32) -> ContentId {
        ContentId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Live contents, newest first.
    pub fn iter(&self) -> impl Iterator<Item = (ContentId, &Content)> + '_ {
        self.insertion.iter().rev().filter_map(|&idx| {
            self.slots[idx as usize]
                .as_ref()
                .map(|c| (self.id_at(idx), c))
        })
    }

    /// Handles of all live contents, newest first.
    ///
    /// Useful for loops that mutate the compositor while walking contents.
    #[must_use]
    pub fn ids(&self) -> Vec<ContentId> {
        self.iter().map(|(id, _)| id).collect()
    }

    // -- Z-order --

    /// Invalidates the cached z-order.
    pub fn mark_z_dirty(&mut self) {
        self.z_dirty = true;
    }

    /// Returns `true` if the z-order must be rebuilt before use.
    #[must_use]
    pub fn z_order_dirty(&self) -> bool {
        self.z_dirty
    }

    /// Rebuilds the z-order cache if any z-index changed.
    ///
    /// The order is bottom to top: ascending z-index, and among equal
    /// z-indices the older content first, so the newer one is drawn on top.
    pub fn update_z_order(&mut self) {
        if !self.z_dirty {
            return;
        }
        let mut order = self.insertion.clone();
        // Stable, so ties keep insertion order.
        order.sort_by(|&a, &b| {
            let za = self.slots[a as usize].as_ref().map_or(0.0, |c| c.z_index);
            let zb = self.slots[b as usize].as_ref().map_or(0.0, |c| c.z_index);
            za.total_cmp(&zb)
        });
        self.z_order = order;
        self.z_dirty = false;
    }

    /// Contents bottom to top, as of the last [`update_z_order`](Self::update_z_order).
    pub fn z_ordered(&self) -> impl DoubleEndedIterator<Item = (ContentId, &Content)> + '_ {
        self.z_order.iter().filter_map(|&idx| {
            self.slots[idx as usize]
                .as_ref()
                .map(|c| (self.id_at(idx), c))
        })
    }
}
