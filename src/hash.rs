//! Hash strategies: functions reducing raw key bytes to a 32-bit digest.

/// A pluggable hash strategy. Must be deterministic for the lifetime of the
/// keys it has placed.
pub type HashFn = fn(&[u8]) -> u32;

/// Seed used by [`default_hash`].
pub const DEFAULT_SEED: u32 = 0x9747_b28c;

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

#[inline]
fn mix_k(k: u32) -> u32 {
    k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

/// MurmurHash3, x86 32-bit variant.
pub fn murmur3_32(key: &[u8], seed: u32) -> u32 {
    let mut h = seed;
    let mut blocks = key.chunks_exact(4);
    for b in &mut blocks {
        h ^= mix_k(u32::from_le_bytes([b[0], b[1], b[2], b[3]]));
        h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let k = tail
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, &b)| acc | (u32::from(b) << (8 * i)));
        h ^= mix_k(k);
    }

    // Length is folded in modulo 2^32, as in the reference implementation.
    h ^= key.len() as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// The strategy installed on every new map.
pub fn default_hash(key: &[u8]) -> u32 {
    murmur3_32(key, DEFAULT_SEED)
}
