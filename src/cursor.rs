//! The map's single shared iteration cursor.
//!
//! The cursor walks slot 0 through the last slot, and each chain from head
//! to tail. It is seeded by a reset and stays valid until the next
//! structural mutation; the map's epoch counter detects such mutations so a
//! stale cursor is reported rather than followed.

use crate::chain_hash_map::Node;
use crate::error::{MapError, Result};
use crate::pair::Pair;
use crate::slot_table::{NodeKey, SlotTable};
use slotmap::SlotMap;

/// Observable phase of the cursor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CursorState {
    /// No enumeration in flight.
    Ready,
    /// Seeded by a reset; more pairs may follow.
    Iterating,
    /// Walked past the last slot. Terminal until the next reset.
    Exhausted,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Cursor {
    Ready,
    Iterating {
        slot: usize,
        node: Option<NodeKey>,
        epoch: u64,
    },
    Exhausted,
}

impl Cursor {
    pub(crate) fn state(&self) -> CursorState {
        match self {
            Cursor::Ready => CursorState::Ready,
            Cursor::Iterating { .. } => CursorState::Iterating,
            Cursor::Exhausted => CursorState::Exhausted,
        }
    }

    /// Seed at slot 0's chain head.
    pub(crate) fn reset(&mut self, table: &SlotTable, epoch: u64) {
        *self = Cursor::Iterating {
            slot: 0,
            node: table.head(0),
            epoch,
        };
    }

    /// Yield the next pair, or report the end of the walk.
    pub(crate) fn advance<'a, K, V>(
        &mut self,
        table: &SlotTable,
        nodes: &'a SlotMap<NodeKey, Node<K, V>>,
        epoch: u64,
    ) -> Result<&'a Pair<K, V>> {
        let (mut slot, mut node) = match *self {
            Cursor::Ready | Cursor::Exhausted => return Err(MapError::EndOfIteration),
            Cursor::Iterating {
                slot,
                node,
                epoch: seeded,
            } => {
                if seeded != epoch {
                    *self = Cursor::Ready;
                    return Err(MapError::CursorInvalidated);
                }
                (slot, node)
            }
        };

        loop {
            if let Some(k) = node {
                let Some(n) = nodes.get(k) else {
                    *self = Cursor::Ready;
                    return Err(MapError::CursorInvalidated);
                };
                *self = Cursor::Iterating {
                    slot,
                    node: n.next,
                    epoch,
                };
                return Ok(&n.pair);
            }
            slot += 1;
            if slot >= table.slot_count() {
                tracing::trace!("cursor exhausted");
                *self = Cursor::Exhausted;
                return Err(MapError::EndOfIteration);
            }
            node = table.head(slot);
        }
    }
}
