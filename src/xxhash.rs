//! XXH32 wrapper providing the two digest surfaces the frame format needs:
//! a one-shot hash (header check byte, per-block checksums) and an
//! incremental state (rolling stream checksum over the uncompressed payload
//! sequence). Backed by the `xxhash-rust` crate.

pub use xxhash_rust::xxh32::Xxh32;

/// One-shot XXH32 digest of `data` with `seed`.
///
/// # Parity vectors
/// * `xxh32(b"", 0)` == `0x02CC5D05`
#[inline]
pub fn xxh32(data: &[u8], seed: u32) -> u32 {
    xxhash_rust::xxh32::xxh32(data, seed)
}
