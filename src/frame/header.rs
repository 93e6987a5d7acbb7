//! Byte codec helpers: little-endian scalar load/store, FLG/BD byte packing,
//! the one-byte header checksum, and block-size derivation.
//!
//! Flag byte layout (bit 0 = LSB):
//!
//! ```text
//! FLG: [ version:2 | blockIndep:1 | blockChecksum:1 | streamSize:1 | streamChecksum:1 | reserved1:1 | presetDict:1 ]
//!        bits 7..6     bit 5            bit 4            bit 3           bit 2             bit 1         bit 0
//! BD:  [ reserved2:1 | blockMaxSize:3 | reserved3:4 ]
//!        bit 7          bits 6..4       bits 3..0
//! ```

use crate::frame::types::{Bd, Flg, CHECKSUM_SEED};
use crate::xxhash::xxh32;

// ─────────────────────────────────────────────────────────────────────────────
// Little-endian scalar I/O
// ─────────────────────────────────────────────────────────────────────────────

/// Reads a little-endian `u32` from the first four bytes of `src`.
#[inline]
pub fn load_u32(src: &[u8]) -> u32 {
    u32::from_le_bytes([src[0], src[1], src[2], src[3]])
}

/// Writes `value` little-endian into the first four bytes of `dst`.
#[inline]
pub fn store_u32(dst: &mut [u8], value: u32) {
    dst[..4].copy_from_slice(&value.to_le_bytes());
}

/// Reads a little-endian `u64` from the first eight bytes of `src`.
#[inline]
pub fn load_u64(src: &[u8]) -> u64 {
    u64::from_le_bytes([
        src[0], src[1], src[2], src[3], src[4], src[5], src[6], src[7],
    ])
}

/// Writes `value` little-endian into the first eight bytes of `dst`.
#[inline]
pub fn store_u64(dst: &mut [u8], value: u64) {
    dst[..8].copy_from_slice(&value.to_le_bytes());
}

// ─────────────────────────────────────────────────────────────────────────────
// FLG / BD byte packing
// ─────────────────────────────────────────────────────────────────────────────

/// Packs a [`Flg`] into its wire byte.
pub fn flg_to_byte(flg: &Flg) -> u8 {
    (u8::from(flg.preset_dictionary))
        | ((flg.reserved1 & 1) << 1)
        | (u8::from(flg.stream_checksum) << 2)
        | (u8::from(flg.stream_size) << 3)
        | (u8::from(flg.block_checksum) << 4)
        | (u8::from(flg.block_independence) << 5)
        | ((flg.version_number & 3) << 6)
}

/// Unpacks a wire byte into a [`Flg`], preserving reserved bits.
pub fn flg_from_byte(b: u8) -> Flg {
    Flg {
        preset_dictionary: b & 1 != 0,
        reserved1: (b >> 1) & 1,
        stream_checksum: (b >> 2) & 1 != 0,
        stream_size: (b >> 3) & 1 != 0,
        block_checksum: (b >> 4) & 1 != 0,
        block_independence: (b >> 5) & 1 != 0,
        version_number: (b >> 6) & 3,
    }
}

/// Packs a [`Bd`] into its wire byte.
pub fn bd_to_byte(bd: &Bd) -> u8 {
    (bd.reserved3 & 15) | ((bd.block_maximum_size & 7) << 4) | ((bd.reserved2 & 1) << 7)
}

/// Unpacks a wire byte into a [`Bd`], preserving reserved bits.
pub fn bd_from_byte(b: u8) -> Bd {
    Bd {
        reserved3: b & 15,
        block_maximum_size: (b >> 4) & 7,
        reserved2: (b >> 7) & 1,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Derived header quantities
// ─────────────────────────────────────────────────────────────────────────────

/// The single-byte header checksum: bits 15..8 of the XXH32 of the
/// descriptor bytes from the FLG byte through the last optional field.
#[inline]
pub fn header_check_byte(descriptor_bytes: &[u8]) -> u8 {
    ((xxh32(descriptor_bytes, CHECKSUM_SEED) >> 8) & 0xFF) as u8
}

/// Uncompressed block capacity for a block-maximum-size id:
/// `1 << (8 + 2 * id)`, i.e. 64 KiB for id 4 up to 4 MiB for id 7.
///
/// Callers validate the id range first; the shift itself accepts any id.
#[inline]
pub fn block_maximum_size(id: u8) -> usize {
    1usize << (8 + 2 * id as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::types::StreamDescriptor;

    // ── LE scalar I/O ────────────────────────────────────────────────────────

    #[test]
    fn u32_little_endian_layout() {
        let mut buf = [0u8; 4];
        store_u32(&mut buf, 0xDEAD_BEEF);
        assert_eq!(buf, [0xEF, 0xBE, 0xAD, 0xDE]);
        assert_eq!(load_u32(&buf), 0xDEAD_BEEF);
    }

    #[test]
    fn u64_little_endian_layout() {
        let mut buf = [0u8; 8];
        store_u64(&mut buf, 0x0102_0304_0506_0708);
        assert_eq!(buf, [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(load_u64(&buf), 0x0102_0304_0506_0708);
    }

    #[test]
    fn scalar_io_ignores_trailing_bytes() {
        let buf = [0x01, 0x00, 0x00, 0x00, 0xFF, 0xFF];
        assert_eq!(load_u32(&buf), 1);
    }

    // ── FLG / BD packing ─────────────────────────────────────────────────────

    #[test]
    fn default_descriptor_flag_bytes() {
        // version 1, independent blocks, stream checksum: 0x40 | 0x20 | 0x04
        let sd = StreamDescriptor::default();
        assert_eq!(flg_to_byte(&sd.flg), 0x64);
        // block size id 7 in bits 6..4
        assert_eq!(bd_to_byte(&sd.bd), 0x70);
    }

    #[test]
    fn flg_round_trips_every_byte() {
        for b in 0..=255u8 {
            assert_eq!(flg_to_byte(&flg_from_byte(b)), b);
        }
    }

    #[test]
    fn bd_round_trips_every_byte() {
        for b in 0..=255u8 {
            assert_eq!(bd_to_byte(&bd_from_byte(b)), b);
        }
    }

    #[test]
    fn flg_bit_positions() {
        let flg = flg_from_byte(1 << 4);
        assert!(flg.block_checksum);
        assert!(!flg.stream_checksum);

        let flg = flg_from_byte(1 << 3);
        assert!(flg.stream_size);

        let flg = flg_from_byte(0b11 << 6);
        assert_eq!(flg.version_number, 3);

        let flg = flg_from_byte(1);
        assert!(flg.preset_dictionary);
    }

    #[test]
    fn bd_bit_positions() {
        let bd = bd_from_byte(0x70);
        assert_eq!(bd.block_maximum_size, 7);
        assert_eq!(bd.reserved2, 0);
        assert_eq!(bd.reserved3, 0);

        let bd = bd_from_byte(0x8F);
        assert_eq!(bd.reserved2, 1);
        assert_eq!(bd.reserved3, 15);
        assert_eq!(bd.block_maximum_size, 0);
    }

    // ── derived quantities ───────────────────────────────────────────────────

    #[test]
    fn header_check_byte_formula() {
        let bytes = [0x64u8, 0x70];
        let h = crate::xxhash::xxh32(&bytes, 0);
        assert_eq!(header_check_byte(&bytes), ((h >> 8) & 0xFF) as u8);
    }

    #[test]
    fn block_sizes_for_every_id() {
        assert_eq!(block_maximum_size(4), 64 * 1024);
        assert_eq!(block_maximum_size(5), 256 * 1024);
        assert_eq!(block_maximum_size(6), 1024 * 1024);
        assert_eq!(block_maximum_size(7), 4 * 1024 * 1024);
    }
}
