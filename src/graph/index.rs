/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::collections::HashMap;

/// A map from sparse 64-bit identifiers to dense slots.
///
/// The first time an identifier is [resolved](IdIndex::resolve) it is
/// assigned the next free slot, starting from zero; subsequent resolutions
/// return the same slot. Slots are never freed, so they always form the range
/// `0..len()`, and per-node data can be stored in plain arrays indexed by
/// slot.
///
/// The index keeps also the reverse map from slots to identifiers, which is
/// used only to report results.
///
/// # Examples
///
/// ```
/// use weighted_pagerank::graph::index::IdIndex;
///
/// let mut index = IdIndex::new();
/// assert_eq!(index.resolve(1 << 40), 0);
/// assert_eq!(index.resolve(7), 1);
/// assert_eq!(index.resolve(1 << 40), 0);
/// assert_eq!(index.id(1), 7);
/// assert_eq!(index.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdIndex {
    /// Identifier to slot.
    slots: HashMap<u64, usize>,
    /// Slot to identifier.
    ids: Vec<u64>,
}

impl IdIndex {
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty index that can hold `capacity` identifiers
    /// without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: HashMap::with_capacity(capacity),
            ids: Vec::with_capacity(capacity),
        }
    }

    /// Returns the slot of the given identifier, allocating a new one if
    /// the identifier has never been seen.
    #[inline]
    pub fn resolve(&mut self, id: u64) -> usize {
        let next = self.ids.len();
        let slot = *self.slots.entry(id).or_insert(next);
        if slot == next {
            self.ids.push(id);
        }
        slot
    }

    /// Returns the slot of the given identifier, if any.
    #[inline]
    pub fn get(&self, id: u64) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    /// Returns the identifier associated with a slot.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not smaller than [`len`](Self::len).
    #[inline]
    pub fn id(&self, slot: usize) -> u64 {
        self.ids[slot]
    }

    /// Returns the identifiers in slot order.
    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    /// Returns the number of identifiers.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns an iterator on pairs (identifier, slot) in slot order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (u64, usize)> + '_ {
        self.ids.iter().enumerate().map(|(slot, &id)| (id, slot))
    }

    /// Removes all identifiers.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.ids.clear();
    }
}
