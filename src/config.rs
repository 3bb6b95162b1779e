//! Construction-time configuration for [`ChainHashMap`](crate::ChainHashMap).

use crate::error::{MapError, Result};
use crate::hash::{default_hash, HashFn};
use crate::slot_table::{prime_index_for, PRIMES};

/// What happens to the slot table as the map fills up.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub enum GrowthPolicy {
    /// The slot count chosen at construction is kept for the map's lifetime.
    /// Chains lengthen as the load factor rises.
    #[default]
    Fixed,
    /// When `len > slot_count * max_load_factor`, rehash into the next prime.
    NextPrime { max_load_factor: f32 },
}

impl GrowthPolicy {
    /// `NextPrime` with a load factor of 0.75.
    pub const fn next_prime() -> Self {
        GrowthPolicy::NextPrime {
            max_load_factor: 0.75,
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            GrowthPolicy::Fixed => Ok(()),
            GrowthPolicy::NextPrime { max_load_factor } => {
                if max_load_factor.is_finite() && max_load_factor > 0.0 {
                    Ok(())
                } else {
                    Err(MapError::InvalidArgument("max_load_factor"))
                }
            }
        }
    }
}

/// Builder for map construction.
///
/// The default yields a 769-slot table that never grows, hashed with
/// [`default_hash`].
#[derive(Copy, Clone)]
pub struct MapConfig {
    pub(crate) initial_capacity: usize,
    pub(crate) growth: GrowthPolicy,
    pub(crate) hash: HashFn,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: PRIMES[0],
            growth: GrowthPolicy::Fixed,
            hash: default_hash,
        }
    }
}

impl core::fmt::Debug for MapConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MapConfig")
            .field("initial_capacity", &self.initial_capacity)
            .field("growth", &self.growth)
            .finish_non_exhaustive()
    }
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum slot count; rounded up to a table prime.
    pub fn with_initial_capacity(mut self, slots: usize) -> Self {
        self.initial_capacity = slots;
        self
    }

    pub fn with_growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    pub fn with_hash(mut self, hash: HashFn) -> Self {
        self.hash = hash;
        self
    }

    /// Check the settings and resolve the starting prime index.
    pub(crate) fn resolve(&self) -> Result<usize> {
        self.growth.validate()?;
        prime_index_for(self.initial_capacity)
            .ok_or(MapError::InvalidArgument("initial_capacity exceeds largest prime"))
    }
}
