//! Frame format types, wire constants, and the operation result taxonomy.
//!
//! Covers:
//! - Wire constants: magic numbers, end-of-stream marker, size-prefix flag bit.
//! - [`Flg`] / [`Bd`] / [`StreamDescriptor`] — the parsed frame header, with
//!   the validation rules of the [LZ4 Frame Format Specification].
//! - [`Mode`] — per-operation parallel/sequential switch.
//! - [`FrameResult`] — the single enumerated result kind shared by encoder
//!   and decoder, with its diagnostic text mapping.
//!
//! [LZ4 Frame Format Specification]: https://github.com/lz4/lz4/blob/dev/doc/lz4_Frame_format.md

use core::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Wire constants
// ─────────────────────────────────────────────────────────────────────────────

/// LZ4 frame magic number, serialized little-endian.
pub const MAGIC_NUMBER: u32 = 0x184D_2204;

/// First magic number of the skippable-frame range.
pub const SKIPPABLE_MAGIC_MIN: u32 = 0x184D_2A50;

/// Last magic number of the skippable-frame range.
pub const SKIPPABLE_MAGIC_MAX: u32 = 0x184D_2A5F;

/// End-of-stream marker: a zero block-size prefix.
pub const EOS_MARKER: u32 = 0;

/// High bit of a block's size prefix: the payload is stored uncompressed.
pub const BLOCK_UNCOMPRESSED_FLAG: u32 = 0x8000_0000;

/// Seed for every XXH32 computation in the frame format.
pub const CHECKSUM_SEED: u32 = 0;

/// Largest possible frame header: magic + FLG + BD + stream size + dict id +
/// check byte.
pub const MAX_HEADER_SIZE: usize = 4 + 2 + 8 + 4 + 1;

/// Smallest valid block-maximum-size id.
pub const BLOCK_SIZE_ID_MIN: u8 = 4;

/// Largest valid block-maximum-size id.
pub const BLOCK_SIZE_ID_MAX: u8 = 7;

/// Returns `true` for magic numbers in the skippable-frame range.
#[inline]
pub fn is_skippable_magic(magic: u32) -> bool {
    (SKIPPABLE_MAGIC_MIN..=SKIPPABLE_MAGIC_MAX).contains(&magic)
}

// ─────────────────────────────────────────────────────────────────────────────
// Execution mode
// ─────────────────────────────────────────────────────────────────────────────

/// Per-operation execution mode bitfield. Bit 0 selects sequential
/// (single-threaded) execution; all other bits are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode(u32);

impl Mode {
    /// Fan blocks out across a worker pool (the default).
    pub const PARALLEL: Mode = Mode(0);
    /// Run every block inline on the calling thread.
    pub const SEQUENTIAL: Mode = Mode(1);

    /// Raw bitfield value.
    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether bit 0 (sequential execution) is set.
    #[inline]
    pub fn is_sequential(self) -> bool {
        self.0 & 1 != 0
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::PARALLEL
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stream descriptor
// ─────────────────────────────────────────────────────────────────────────────

/// Decoded FLG byte. Reserved bits are preserved on parse so validation can
/// reject headers that set them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flg {
    /// Format version, two bits. Must be 1.
    pub version_number: u8,
    /// Blocks are compressed independently. Must be set; linked-block mode
    /// is not supported and is reported as such.
    pub block_independence: bool,
    /// A 4-byte XXH32 of the stored bytes follows each block.
    pub block_checksum: bool,
    /// The header carries a u64 total uncompressed length.
    pub stream_size: bool,
    /// A 4-byte XXH32 of the uncompressed payload follows the EOS marker.
    pub stream_checksum: bool,
    /// Reserved, must be 0.
    pub reserved1: u8,
    /// The header carries a u32 dictionary id. Preset dictionaries are not
    /// supported and are reported as such.
    pub preset_dictionary: bool,
}

/// Decoded BD byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bd {
    /// Block-maximum-size id, three bits; valid ids are 4..=7 selecting
    /// 64 KiB, 256 KiB, 1 MiB, or 4 MiB uncompressed blocks.
    pub block_maximum_size: u8,
    /// Reserved, must be 0.
    pub reserved2: u8,
    /// Reserved, must be 0.
    pub reserved3: u8,
}

/// The parsed and validated frame header.
///
/// `stream_size` is meaningful iff `flg.stream_size` is set, and `dict_id`
/// iff `flg.preset_dictionary` is set, matching the optional wire fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub flg: Flg,
    pub bd: Bd,
    /// Total uncompressed length declared by the frame; parsed but not
    /// enforced.
    pub stream_size: u64,
    /// Dictionary id; rejected by validation when flagged.
    pub dict_id: u32,
}

impl Default for StreamDescriptor {
    /// Encoder-side defaults: version 1, independent blocks, stream checksum
    /// on, 4 MiB blocks.
    fn default() -> Self {
        StreamDescriptor {
            flg: Flg {
                version_number: 1,
                block_independence: true,
                block_checksum: false,
                stream_size: false,
                stream_checksum: true,
                reserved1: 0,
                preset_dictionary: false,
            },
            bd: Bd {
                block_maximum_size: BLOCK_SIZE_ID_MAX,
                reserved2: 0,
                reserved3: 0,
            },
            stream_size: 0,
            dict_id: 0,
        }
    }
}

impl StreamDescriptor {
    /// Checks every header rule, returning the first violated one.
    ///
    /// Both encoder and decoder call this before touching the stream, so a
    /// rejected descriptor never produces or consumes a single payload byte.
    pub fn validate(&self) -> FrameResult {
        if self.flg.version_number != 1 {
            return FrameResult::InvalidVersion;
        }
        if self.flg.preset_dictionary {
            return FrameResult::PresetDictionaryNotSupported;
        }
        if self.flg.reserved1 != 0 {
            return FrameResult::InvalidHeader;
        }
        if !self.flg.block_independence {
            return FrameResult::BlockDependenceNotSupported;
        }
        if self.bd.block_maximum_size < BLOCK_SIZE_ID_MIN
            || self.bd.block_maximum_size > BLOCK_SIZE_ID_MAX
        {
            return FrameResult::InvalidBlockMaximumSize;
        }
        if self.bd.reserved3 != 0 {
            return FrameResult::InvalidHeader;
        }
        if self.bd.reserved2 != 0 {
            return FrameResult::InvalidHeader;
        }
        FrameResult::Ok
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result taxonomy
// ─────────────────────────────────────────────────────────────────────────────

/// Enumerated outcome of one encode or decode operation.
///
/// The latch inside an operation only promotes from [`FrameResult::Ok`] or
/// the generic [`FrameResult::Error`] to a specific code; once a specific
/// code is set it sticks, so the first failure observed is the one reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameResult {
    Ok,
    /// Unspecified failure, typically a short read or write that a caller
    /// promotes to a specific code.
    Error,
    InvalidMagicNumber,
    InvalidHeader,
    PresetDictionaryNotSupported,
    BlockDependenceNotSupported,
    InvalidVersion,
    InvalidHeaderChecksum,
    InvalidBlockMaximumSize,
    CannotWriteHeader,
    CannotWriteEos,
    CannotWriteStreamChecksum,
    CannotReadBlockSize,
    CannotReadBlockData,
    CannotReadBlockChecksum,
    CannotReadStreamChecksum,
    StreamChecksumMismatch,
    BlockChecksumMismatch,
    DecompressFail,
}

impl FrameResult {
    /// Diagnostic name for this code.
    pub fn name(&self) -> &'static str {
        match self {
            FrameResult::Ok => "OK",
            FrameResult::Error => "ERROR",
            FrameResult::InvalidMagicNumber => "INVALID_MAGIC_NUMBER",
            FrameResult::InvalidHeader => "INVALID_HEADER",
            FrameResult::PresetDictionaryNotSupported => "PRESET_DICTIONARY_NOT_SUPPORTED",
            FrameResult::BlockDependenceNotSupported => "BLOCK_DEPENDENCE_NOT_SUPPORTED",
            FrameResult::InvalidVersion => "INVALID_VERSION",
            FrameResult::InvalidHeaderChecksum => "INVALID_HEADER_CHECKSUM",
            FrameResult::InvalidBlockMaximumSize => "INVALID_BLOCK_MAXIMUM_SIZE",
            FrameResult::CannotWriteHeader => "CANNOT_WRITE_HEADER",
            FrameResult::CannotWriteEos => "CANNOT_WRITE_EOS",
            FrameResult::CannotWriteStreamChecksum => "CANNOT_WRITE_STREAM_CHECKSUM",
            FrameResult::CannotReadBlockSize => "CANNOT_READ_BLOCK_SIZE",
            FrameResult::CannotReadBlockData => "CANNOT_READ_BLOCK_DATA",
            FrameResult::CannotReadBlockChecksum => "CANNOT_READ_BLOCK_CHECKSUM",
            FrameResult::CannotReadStreamChecksum => "CANNOT_READ_STREAM_CHECKSUM",
            FrameResult::StreamChecksumMismatch => "STREAM_CHECKSUM_MISMATCH",
            FrameResult::BlockChecksumMismatch => "BLOCK_CHECKSUM_MISMATCH",
            FrameResult::DecompressFail => "DECOMPRESS_FAIL",
        }
    }

    /// `true` for [`FrameResult::Ok`].
    #[inline]
    pub fn is_ok(&self) -> bool {
        matches!(self, FrameResult::Ok)
    }

    /// `true` for every variant except [`FrameResult::Ok`].
    #[inline]
    pub fn is_error(&self) -> bool {
        !self.is_ok()
    }

    /// Converts to a `Result`, mapping [`FrameResult::Ok`] to `Ok(())`.
    pub fn into_result(self) -> Result<(), FrameResult> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FrameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::error::Error for FrameResult {}
