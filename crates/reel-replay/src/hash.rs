//! Snapshot fingerprints.
//!
//! FNV-1a over raw arena bytes. Not cryptographic; used to correlate a
//! recorded snapshot with each restore of it in the logs and in tests.

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Feed a single byte into an FNV-1a hash state.
#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

/// Hash a byte slice. An empty slice hashes to the offset basis.
pub fn snapshot_hash(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| fnv1a_byte(hash, b))
}
