//! chain-hashmap: a single-threaded, separate-chaining map over byte keys
//! with pluggable hash/destroy strategies and a resettable shared cursor.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a hash map whose addressing, collision handling and
//!   enumeration are explicit and reproducible, so callers can reason
//!   about exactly which bucket a key lands in and in which order a walk
//!   visits pairs.
//! - Layers:
//!   - `SlotTable`: bucket-head array sized from an ascending table of
//!     primes (769 .. 1 610 612 741); allocated fallibly.
//!   - `ChainHashMap<K, V>`: chains of nodes held in a generational arena;
//!     put/get/find/remove/size, the strategies, teardown.
//!   - `Cursor`: the one enumeration in flight per map.
//!   - `PairMap`: the operation table, implemented by `ChainHashMap`.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (the reentrancy tracker carries a
//!   raw-pointer marker).
//! - Keys are byte sequences (`K: AsRef<[u8]>`), compared byte-wise over
//!   their full length. The empty key is rejected.
//! - A key appears in at most one chain. Re-putting it replaces the pair
//!   in place and leaves the size unchanged.
//! - New nodes are prepended to their bucket: O(1) insert, no order within
//!   a bucket beyond "most recent first".
//!
//! Ownership of displaced pairs
//! - A pair leaves the map on overwrite, on removal, and at teardown. If
//!   a destroy strategy is set it receives the pair; otherwise overwrite
//!   and removal hand the pair back to the caller and teardown drops it.
//!
//! Hash strategy and stored digests
//! - The default strategy is MurmurHash3 (x86, 32-bit) with a fixed seed.
//! - Every node stores the digest it was placed with. Rehashing relinks by
//!   stored digest and never calls the strategy again. Lookups compare key
//!   bytes only; the digest picks the slot and nothing else. Swapping the
//!   strategy after inserts makes older keys unreachable by lookup unless
//!   the new strategy sends them to the same slot.
//!
//! Growth
//! - By default the table keeps its 769 slots for the map's lifetime and a
//!   warning is logged once the load factor passes 1.0.
//! - `GrowthPolicy::NextPrime` opts into rehashing into the next prime when
//!   the configured load factor is exceeded; `try_grow` grows on demand.
//!
//! Iteration
//! - `iterate(true)` seeds the cursor at slot 0; `iterate(false)` yields
//!   pairs in slot order, head to tail within a bucket, then
//!   `EndOfIteration` on every call until the next reset.
//! - Structural mutation (new key, removal, rehash, release) bumps an epoch;
//!   a cursor seeded under an older epoch reports `CursorInvalidated`
//!   instead of following stale links.
//! - `iter()` offers the same order as a borrowing `Iterator`.
//!
//! Reentrancy policy
//! - Strategies are user code running mid-operation. A debug-only guard
//!   panics if one re-enters the same map, naming the running operation
//!   and the one that tried to start; release builds pay nothing.
//!
//! Teardown
//! - `release` (and `Drop`) walks every chain, so no node or pair outlives
//!   the map. A released map answers `NotInitialized` to everything.

pub mod chain_hash_map;
pub mod config;
mod cursor;
pub mod error;
pub mod hash;
pub mod ops;
pub mod pair;
mod reentrancy;
mod slot_table;

#[cfg(test)]
mod chain_hash_map_proptest;

// Public surface
pub use chain_hash_map::{ChainHashMap, Iter};
pub use config::{GrowthPolicy, MapConfig};
pub use cursor::CursorState;
pub use error::{MapError, Result};
pub use hash::{default_hash, murmur3_32, HashFn, DEFAULT_SEED};
pub use ops::{DestroyFn, PairMap};
pub use pair::Pair;
pub use slot_table::{prime_index_for, PRIMES};
