//! Expiry List Module
//!
//! A circular doubly-linked list of cache entries kept sorted by expiration,
//! stored in a slot arena and linked by [`SlotId`] instead of pointers.
//!
//! ```text
//!   slot 0 (root) ─► [earliest] ◄──► ... ◄──► [latest] ─► slot 0 (root)
//! ```
//!
//! The root never holds an entry. Its `next` is the head (earliest deadline),
//! its `prev` the tail (latest deadline), and the list is empty when both
//! point back at the root.

use std::time::Instant;

use crate::cache::CacheEntry;

/// Handle to a slot in the list's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

const ROOT: SlotId = SlotId(0);

#[derive(Debug)]
struct Slot<K, V> {
    entry: Option<CacheEntry<K, V>>,
    prev: SlotId,
    next: SlotId,
}

// == Expiry List ==
/// Entries ordered head to tail by non-decreasing expiration.
#[derive(Debug)]
pub struct ExpiryList<K, V> {
    slots: Vec<Slot<K, V>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<K, V> ExpiryList<K, V> {
    // == Constructor ==
    /// Creates an empty list holding only the root.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                entry: None,
                prev: ROOT,
                next: ROOT,
            }],
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Number of entries stored, linked or not.
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no entry is linked.
    pub fn is_empty(&self) -> bool {
        self.slots[ROOT.0].next == ROOT
    }

    /// The entry with the earliest expiration.
    pub fn head(&self) -> Option<SlotId> {
        Some(self.slots[ROOT.0].next).filter(|id| *id != ROOT)
    }

    /// The entry with the latest expiration.
    #[allow(dead_code)]
    pub fn tail(&self) -> Option<SlotId> {
        Some(self.slots[ROOT.0].prev).filter(|id| *id != ROOT)
    }

    pub fn get(&self, id: SlotId) -> Option<&CacheEntry<K, V>> {
        self.slots.get(id.0).and_then(|slot| slot.entry.as_ref())
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut CacheEntry<K, V>> {
        self.slots.get_mut(id.0).and_then(|slot| slot.entry.as_mut())
    }

    // == Allocate ==
    /// Stores `entry` in a free slot without linking it.
    pub fn allocate(&mut self, entry: CacheEntry<K, V>) -> SlotId {
        let id = match self.free_list.pop() {
            Some(idx) => {
                let id = SlotId(idx);
                self.slots[idx] = Slot {
                    entry: Some(entry),
                    prev: id,
                    next: id,
                };
                id
            }
            None => {
                let id = SlotId(self.slots.len());
                self.slots.push(Slot {
                    entry: Some(entry),
                    prev: id,
                    next: id,
                });
                id
            }
        };
        self.len += 1;
        id
    }

    // == Release ==
    /// Frees an unlinked slot and hands back its entry.
    pub fn release(&mut self, id: SlotId) -> Option<CacheEntry<K, V>> {
        if id == ROOT {
            return None;
        }
        let entry = self.slots.get_mut(id.0)?.entry.take()?;
        self.free_list.push(id.0);
        self.len -= 1;
        Some(entry)
    }

    // == Unlink ==
    /// Detaches `id` from its neighbours, leaving it self-linked.
    pub fn unlink(&mut self, id: SlotId) {
        if id == ROOT || self.get(id).is_none() {
            return;
        }
        let (prev, next) = (self.slots[id.0].prev, self.slots[id.0].next);
        self.slots[prev.0].next = next;
        self.slots[next.0].prev = prev;
        self.slots[id.0].prev = id;
        self.slots[id.0].next = id;
    }

    // == Insert Sorted ==
    /// Links an unlinked `id` at its place in expiration order.
    ///
    /// Scans from the tail toward the head and splices after the first entry
    /// whose expiration is `<=` the new one, so equal deadlines keep insertion
    /// order. Reaching the root makes the entry the new head, which also
    /// covers the empty list.
    pub fn insert_sorted(&mut self, id: SlotId) {
        let Some(expiration) = self.get(id).map(|entry| entry.expiration) else {
            return;
        };

        let mut after = self.slots[ROOT.0].prev;
        while after != ROOT {
            match self.expiration_of(after) {
                Some(existing) if existing > expiration => after = self.slots[after.0].prev,
                _ => break,
            }
        }

        self.link_after(after, id);
    }

    fn link_after(&mut self, after: SlotId, id: SlotId) {
        let next = self.slots[after.0].next;
        self.slots[id.0].prev = after;
        self.slots[id.0].next = next;
        self.slots[after.0].next = id;
        self.slots[next.0].prev = id;
    }

    fn expiration_of(&self, id: SlotId) -> Option<Instant> {
        self.get(id).map(|entry| entry.expiration)
    }

    // == Iteration ==
    /// Iterates linked entries from head (earliest) to tail (latest).
    #[allow(dead_code)]
    pub fn iter(&self) -> ExpiryListIter<'_, K, V> {
        ExpiryListIter {
            list: self,
            current: self.slots[ROOT.0].next,
        }
    }
}

impl<K, V> Default for ExpiryList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Head-to-tail iterator over an [`ExpiryList`].
pub struct ExpiryListIter<'a, K, V> {
    list: &'a ExpiryList<K, V>,
    current: SlotId,
}

impl<'a, K, V> Iterator for ExpiryListIter<'a, K, V> {
    type Item = &'a CacheEntry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == ROOT {
            return None;
        }
        let slot = self.list.slots.get(self.current.0)?;
        self.current = slot.next;
        slot.entry.as_ref()
    }
}
