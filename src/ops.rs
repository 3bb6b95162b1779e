//! The operation table every pair container exposes.

use crate::error::Result;
use crate::hash::HashFn;
use crate::pair::Pair;

/// Caller-supplied release routine for pairs the map gives up.
pub type DestroyFn<K, V> = Box<dyn FnMut(Pair<K, V>)>;

/// Operations of a keyed pair container, in the order a caller typically
/// uses them. Keys are byte sequences; an empty key is rejected with
/// `InvalidKeySize`, and every operation on a released container returns
/// `NotInitialized`.
pub trait PairMap<K, V> {
    /// Store `pair`. When its key is already present the old pair is
    /// displaced: handed to the destroy strategy if one is set (`Ok(None)`),
    /// otherwise returned.
    fn put(&mut self, pair: Pair<K, V>) -> Result<Option<Pair<K, V>>>;

    /// Value stored under `key`, or `KeyNotFound`.
    fn get(&self, key: &[u8]) -> Result<&V>;

    /// `Ok(())` if `key` is present, else `KeyNotFound`.
    fn find(&self, key: &[u8]) -> Result<()>;

    /// Unlink the pair stored under `key`. Destroyed or returned like `put`'s
    /// displaced pair.
    fn remove(&mut self, key: &[u8]) -> Result<Option<Pair<K, V>>>;

    /// Number of stored pairs.
    fn size(&self) -> Result<usize>;

    /// Cursor protocol. `reset = true` re-seeds and yields nothing;
    /// `reset = false` yields the next pair or `EndOfIteration`.
    fn iterate(&mut self, reset: bool) -> Result<Option<&Pair<K, V>>>;

    fn set_hash(&mut self, hash: HashFn) -> Result<()>;

    fn set_destroy(&mut self, destroy: Option<DestroyFn<K, V>>) -> Result<()>;

    /// Tear down, releasing every remaining pair.
    fn deinit(self)
    where
        Self: Sized;
}
