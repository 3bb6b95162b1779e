//! ChainHashMap: separate-chaining map over byte keys.
//!
//! Chain nodes live in a generational arena; each bucket head and each
//! node's `next` link is an arena key. Removing a node frees exactly that
//! node, and a cursor holding a key to a removed node can tell.

use crate::config::{GrowthPolicy, MapConfig};
use crate::cursor::{Cursor, CursorState};
use crate::error::{MapError, Result};
use crate::hash::HashFn;
use crate::ops::{DestroyFn, PairMap};
use crate::pair::Pair;
use crate::reentrancy::DebugReentrancy;
use crate::slot_table::{NodeKey, SlotTable, PRIMES};
use slotmap::SlotMap;

// The arena refuses inserts past 2^32 - 2 live elements.
const MAX_NODES: usize = u32::MAX as usize - 1;

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) pair: Pair<K, V>,
    /// Digest the node was placed with; rehashing reuses it.
    pub(crate) hash: u32,
    pub(crate) next: Option<NodeKey>,
}

pub struct ChainHashMap<K, V> {
    table: SlotTable,
    nodes: SlotMap<NodeKey, Node<K, V>>,
    hash: HashFn,
    destroy: Option<DestroyFn<K, V>>,
    cursor: Cursor,
    growth: GrowthPolicy,
    // Bumped on every structural mutation; a cursor seeded under an older
    // epoch is stale.
    epoch: u64,
    overload_warned: bool,
    reentrancy: DebugReentrancy,
}

/// Borrowing iterator in cursor order. Does not touch the shared cursor.
pub struct Iter<'a, K, V> {
    table: &'a SlotTable,
    nodes: &'a SlotMap<NodeKey, Node<K, V>>,
    slot: usize,
    node: Option<NodeKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.node {
                let n = self.nodes.get(k)?;
                self.node = n.next;
                self.remaining -= 1;
                return Some((&n.pair.key, &n.pair.value));
            }
            self.slot += 1;
            if self.slot >= self.table.slot_count() {
                return None;
            }
            self.node = self.table.head(self.slot);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> ChainHashMap<K, V> {
    /// A 769-slot map with the default hash strategy and no destroy strategy.
    pub fn new() -> Result<Self> {
        Self::with_config(MapConfig::default())
    }

    pub fn with_config(config: MapConfig) -> Result<Self> {
        let prime_idx = config.resolve()?;
        let table = SlotTable::allocate(prime_idx)?;
        Ok(Self {
            table,
            nodes: SlotMap::with_key(),
            hash: config.hash,
            destroy: None,
            cursor: Cursor::Ready,
            growth: config.growth,
            epoch: 0,
            overload_warned: false,
            reentrancy: DebugReentrancy::new(),
        })
    }

    #[inline]
    fn ensure_init(&self) -> Result<()> {
        if self.table.is_allocated() {
            Ok(())
        } else {
            Err(MapError::NotInitialized)
        }
    }

    /// Hand a displaced pair to the destroy strategy, or back to the caller.
    fn dispose(destroy: &mut Option<DestroyFn<K, V>>, pair: Pair<K, V>) -> Option<Pair<K, V>> {
        match destroy.as_mut() {
            Some(d) => {
                d(pair);
                None
            }
            None => Some(pair),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Item count; `NotInitialized` once released.
    pub fn size(&self) -> Result<usize> {
        self.ensure_init()?;
        Ok(self.nodes.len())
    }

    /// Current number of buckets; 0 once released.
    pub fn slot_count(&self) -> usize {
        self.table.slot_count()
    }

    pub fn load_factor(&self) -> f64 {
        match self.table.slot_count() {
            0 => 0.0,
            slots => self.nodes.len() as f64 / slots as f64,
        }
    }

    pub fn growth_policy(&self) -> GrowthPolicy {
        self.growth
    }

    pub fn is_released(&self) -> bool {
        !self.table.is_allocated()
    }

    /// Replace the hash strategy. Keys placed under the previous strategy
    /// are only found again if the new one sends them to the same slot.
    pub fn set_hash(&mut self, hash: HashFn) -> Result<()> {
        self.ensure_init()?;
        self.hash = hash;
        Ok(())
    }

    /// Install (or clear, with `None`) the destroy strategy.
    pub fn set_destroy(&mut self, destroy: Option<DestroyFn<K, V>>) -> Result<()> {
        self.ensure_init()?;
        self.destroy = destroy;
        Ok(())
    }

    pub fn cursor_state(&self) -> CursorState {
        self.cursor.state()
    }

    /// Re-seed the shared cursor at slot 0.
    pub fn reset_cursor(&mut self) -> Result<()> {
        self.ensure_init()?;
        self.cursor.reset(&self.table, self.epoch);
        Ok(())
    }

    /// Advance the shared cursor. `EndOfIteration` once every pair has been
    /// yielded (and on every later call until a reset); `CursorInvalidated`
    /// if the map changed shape since the reset.
    pub fn next_pair(&mut self) -> Result<&Pair<K, V>> {
        self.ensure_init()?;
        self.cursor.advance(&self.table, &self.nodes, self.epoch)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            table: &self.table,
            nodes: &self.nodes,
            slot: 0,
            node: self.table.head(0),
            remaining: self.nodes.len(),
        }
    }

    /// Grow the slot table to the next prime and relink every node.
    pub fn try_grow(&mut self) -> Result<()> {
        self.ensure_init()?;
        let next = self.table.prime_index() + 1;
        if next >= PRIMES.len() {
            return Err(MapError::CapacityExhausted);
        }
        self.rehash(next)
    }

    fn rehash(&mut self, prime_idx: usize) -> Result<()> {
        let _g = self.reentrancy.enter("rehash");
        let mut fresh = SlotTable::allocate(prime_idx)?;
        for head in self.table.heads() {
            let mut cur = Some(head);
            while let Some(k) = cur {
                let node = &mut self.nodes[k];
                cur = node.next;
                let slot = fresh.slot_of(node.hash);
                node.next = fresh.head(slot);
                fresh.set_head(slot, Some(k));
            }
        }
        tracing::debug!(
            from = self.table.slot_count(),
            to = fresh.slot_count(),
            len = self.nodes.len(),
            "rehashed slot table"
        );
        self.table = fresh;
        self.epoch = self.epoch.wrapping_add(1);
        Ok(())
    }

    /// Apply the growth policy after a new key was linked in.
    fn after_insert(&mut self) {
        let len = self.nodes.len();
        let slots = self.table.slot_count();
        match self.growth {
            GrowthPolicy::Fixed => {
                if !self.overload_warned && len > slots {
                    self.overload_warned = true;
                    tracing::warn!(len, slots, "fixed-capacity map is past load factor 1.0");
                }
            }
            GrowthPolicy::NextPrime { max_load_factor } => {
                if len as f64 <= slots as f64 * f64::from(max_load_factor) {
                    return;
                }
                match self.try_grow() {
                    Ok(()) | Err(MapError::CapacityExhausted) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, len, slots, "slot table growth failed; keeping current table")
                    }
                }
            }
        }
    }

    /// Tear the map down in place: every remaining pair goes to the destroy
    /// strategy (or is dropped) and the slot table is freed. Afterwards every
    /// operation reports `NotInitialized`. Calling it again does nothing.
    pub fn release(&mut self) {
        if !self.table.is_allocated() {
            return;
        }
        let _g = self.reentrancy.enter("release");
        let table = self.table.take();
        let count = self.nodes.len();
        for head in table.heads() {
            let mut cur = Some(head);
            while let Some(k) = cur {
                let Some(node) = self.nodes.remove(k) else {
                    break;
                };
                cur = node.next;
                drop(Self::dispose(&mut self.destroy, node.pair));
            }
        }
        debug_assert!(self.nodes.is_empty(), "node unreachable from any slot");
        self.nodes = SlotMap::with_key();
        self.cursor = Cursor::Ready;
        self.epoch = self.epoch.wrapping_add(1);
        tracing::debug!(pairs = count, "released map");
    }

    /// Consuming teardown.
    pub fn deinit(mut self) {
        self.release();
    }
}

impl<K, V> ChainHashMap<K, V>
where
    K: AsRef<[u8]>,
{
    #[inline]
    fn check_key(&self, key: &[u8]) -> Result<()> {
        self.ensure_init()?;
        if key.is_empty() {
            return Err(MapError::InvalidKeySize);
        }
        Ok(())
    }

    /// Walk one bucket's chain for `key`. Matching is on key bytes alone;
    /// the stored digest only decides placement on rehash.
    fn scan(&self, slot: usize, key: &[u8]) -> Option<NodeKey> {
        let mut cur = self.table.head(slot);
        while let Some(k) = cur {
            let n = &self.nodes[k];
            if n.pair.key.as_ref() == key {
                return Some(k);
            }
            cur = n.next;
        }
        None
    }

    fn lookup(&self, key: &[u8]) -> Option<NodeKey> {
        let hash = (self.hash)(key);
        self.scan(self.table.slot_of(hash), key)
    }

    /// Store `pair`, replacing any pair with byte-equal key.
    ///
    /// Returns the displaced pair unless a destroy strategy consumed it.
    pub fn put(&mut self, pair: Pair<K, V>) -> Result<Option<Pair<K, V>>> {
        self.check_key(pair.key.as_ref())?;
        {
            let _g = self.reentrancy.enter("put");
            let hash = (self.hash)(pair.key.as_ref());
            let slot = self.table.slot_of(hash);
            if let Some(k) = self.scan(slot, pair.key.as_ref()) {
                let old = core::mem::replace(&mut self.nodes[k].pair, pair);
                return Ok(Self::dispose(&mut self.destroy, old));
            }

            if self.nodes.len() >= MAX_NODES {
                return Err(MapError::OutOfMemory);
            }
            let next = self.table.head(slot);
            let k = self.nodes.insert(Node { pair, hash, next });
            self.table.set_head(slot, Some(k));
            self.epoch = self.epoch.wrapping_add(1);
        }
        self.after_insert();
        Ok(None)
    }

    /// Shorthand for `put(Pair::new(key, value))`.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<Pair<K, V>>> {
        self.put(Pair::new(key, value))
    }

    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let key: &[u8] = key.as_ref();
        self.check_key(key)?;
        let _g = self.reentrancy.enter("get");
        match self.lookup(key) {
            Some(k) => Ok(&self.nodes[k].pair.value),
            None => Err(MapError::KeyNotFound),
        }
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let key: &[u8] = key.as_ref();
        self.check_key(key)?;
        let _g = self.reentrancy.enter("get_mut");
        match self.lookup(key) {
            Some(k) => Ok(&mut self.nodes[k].pair.value),
            None => Err(MapError::KeyNotFound),
        }
    }

    /// Presence check without touching the value.
    pub fn find<Q>(&self, key: &Q) -> Result<()>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let key: &[u8] = key.as_ref();
        self.check_key(key)?;
        let _g = self.reentrancy.enter("find");
        self.lookup(key).map(|_| ()).ok_or(MapError::KeyNotFound)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        self.find(key).is_ok()
    }

    /// Unlink and free the node holding `key`.
    ///
    /// Returns the removed pair unless a destroy strategy consumed it.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<Option<Pair<K, V>>>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let key: &[u8] = key.as_ref();
        self.check_key(key)?;
        let _g = self.reentrancy.enter("remove");
        let hash = (self.hash)(key);
        let slot = self.table.slot_of(hash);

        let mut pred: Option<NodeKey> = None;
        let mut cur = self.table.head(slot);
        while let Some(k) = cur {
            let node = &self.nodes[k];
            let next = node.next;
            if node.pair.key.as_ref() == key {
                match pred {
                    None => self.table.set_head(slot, next),
                    Some(p) => self.nodes[p].next = next,
                }
                let Some(node) = self.nodes.remove(k) else {
                    break;
                };
                self.epoch = self.epoch.wrapping_add(1);
                return Ok(Self::dispose(&mut self.destroy, node.pair));
            }
            pred = cur;
            cur = next;
        }
        Err(MapError::KeyNotFound)
    }

    /// One step of the cursor protocol; see [`PairMap::iterate`].
    pub fn iterate(&mut self, reset: bool) -> Result<Option<&Pair<K, V>>> {
        if reset {
            self.reset_cursor()?;
            return Ok(None);
        }
        self.next_pair().map(Some)
    }
}

impl<K, V> Drop for ChainHashMap<K, V> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<K, V> core::fmt::Debug for ChainHashMap<K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChainHashMap")
            .field("len", &self.nodes.len())
            .field("slots", &self.table.slot_count())
            .field("growth", &self.growth)
            .field("cursor", &self.cursor.state())
            .field("destroy", &self.destroy.is_some())
            .finish()
    }
}

impl<'a, K, V> IntoIterator for &'a ChainHashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> PairMap<K, V> for ChainHashMap<K, V>
where
    K: AsRef<[u8]>,
{
    fn put(&mut self, pair: Pair<K, V>) -> Result<Option<Pair<K, V>>> {
        ChainHashMap::put(self, pair)
    }

    fn get(&self, key: &[u8]) -> Result<&V> {
        ChainHashMap::get(self, key)
    }

    fn find(&self, key: &[u8]) -> Result<()> {
        ChainHashMap::find(self, key)
    }

    fn remove(&mut self, key: &[u8]) -> Result<Option<Pair<K, V>>> {
        ChainHashMap::remove(self, key)
    }

    fn size(&self) -> Result<usize> {
        ChainHashMap::size(self)
    }

    fn iterate(&mut self, reset: bool) -> Result<Option<&Pair<K, V>>> {
        ChainHashMap::iterate(self, reset)
    }

    fn set_hash(&mut self, hash: HashFn) -> Result<()> {
        ChainHashMap::set_hash(self, hash)
    }

    fn set_destroy(&mut self, destroy: Option<DestroyFn<K, V>>) -> Result<()> {
        ChainHashMap::set_destroy(self, destroy)
    }

    fn deinit(self) {
        ChainHashMap::deinit(self)
    }
}
