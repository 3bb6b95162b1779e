//! SlotTable: the bucket-head array, sized from an ascending prime table.

use crate::error::{MapError, Result};

slotmap::new_key_type! {
    /// Generational key of a chain node inside the map's node arena.
    pub(crate) struct NodeKey;
}

/// Slot counts a table can be sized to, smallest first.
pub const PRIMES: [usize; 22] = [
    769, 1543, 3079, 6151, 12289, 24593, 49157, 98317, 196613, 393241, 786433, 1572869, 3145739,
    6291469, 12582917, 25165843, 50331653, 100663319, 201326611, 402653189, 805306457, 1610612741,
];

/// Index into [`PRIMES`] of the smallest prime `>= min_slots`.
pub fn prime_index_for(min_slots: usize) -> Option<usize> {
    PRIMES.iter().position(|&p| p >= min_slots)
}

#[derive(Debug)]
pub(crate) struct SlotTable {
    heads: Vec<Option<NodeKey>>,
    prime_idx: usize,
}

impl SlotTable {
    /// Allocate `PRIMES[prime_idx]` empty heads. Allocation failure is
    /// reported instead of aborting.
    pub(crate) fn allocate(prime_idx: usize) -> Result<Self> {
        let count = *PRIMES
            .get(prime_idx)
            .ok_or(MapError::InvalidArgument("prime index out of range"))?;
        let mut heads = Vec::new();
        heads
            .try_reserve_exact(count)
            .map_err(|_| MapError::OutOfMemory)?;
        heads.resize(count, None);
        tracing::debug!(slots = count, "allocated slot table");
        Ok(Self { heads, prime_idx })
    }

    /// A table with no storage; the state of a released map.
    pub(crate) const fn released() -> Self {
        Self {
            heads: Vec::new(),
            prime_idx: 0,
        }
    }

    #[inline]
    pub(crate) fn is_allocated(&self) -> bool {
        !self.heads.is_empty()
    }

    #[inline]
    pub(crate) fn slot_count(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    pub(crate) fn prime_index(&self) -> usize {
        self.prime_idx
    }

    /// Bucket a digest lands in. Caller guarantees the table is allocated.
    #[inline]
    pub(crate) fn slot_of(&self, hash: u32) -> usize {
        hash as usize % self.heads.len()
    }

    #[inline]
    pub(crate) fn head(&self, slot: usize) -> Option<NodeKey> {
        self.heads.get(slot).copied().flatten()
    }

    #[inline]
    pub(crate) fn set_head(&mut self, slot: usize, node: Option<NodeKey>) {
        self.heads[slot] = node;
    }

    /// Drop the storage, leaving a released table behind.
    pub(crate) fn take(&mut self) -> Self {
        core::mem::replace(self, Self::released())
    }

    /// Heads in slot order.
    pub(crate) fn heads(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.heads.iter().filter_map(|h| *h)
    }
}
