//! LZ4 frame container — parallel encode and decode.
//!
//! The frame format wraps independently compressed LZ4 blocks in a portable,
//! self-describing container defined by the [LZ4 Frame Format Specification]:
//! a frame header (magic number, flag bytes, optional content size and
//! dictionary id, one-byte header checksum), length-prefixed blocks whose
//! size prefix carries a stored-uncompressed flag in its high bit, an
//! end-of-stream marker, and an optional trailing checksum over the
//! uncompressed payload sequence.
//!
//! This module implements the container state machine only; the block codec
//! and the byte streams are caller-supplied collaborators bundled in a
//! [`FrameContext`](crate::context::FrameContext).
//!
//! # Submodules
//!
//! * [`types`]      — descriptor, mode, wire constants, result taxonomy.
//! * [`header`]     — byte codec helpers: LE scalars, flag bytes, check byte.
//! * [`compress`]   — frame encoder with the parallel block pipeline.
//! * [`decompress`] — frame decoder, magic dispatch, checksum verification.
//!
//! # One-shot helpers
//!
//! [`compress_to_vec`] and [`decompress_to_vec`] are allocation-owning
//! wrappers for callers that work on in-memory slices.
//!
//! [LZ4 Frame Format Specification]: https://github.com/lz4/lz4/blob/dev/doc/lz4_Frame_format.md

pub mod compress;
pub mod decompress;
pub mod header;
pub mod types;

pub use compress::compress;
pub use decompress::decompress;
pub use types::{Bd, Flg, FrameResult, Mode, StreamDescriptor};

use std::io::Cursor;
use std::sync::Mutex;

use crate::context::{BlockCodec, FrameContext, IoReader, Shared};
use crate::mempool::MemPool;
use crate::xxhash::Xxh32;

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline plumbing shared by the encoder and decoder
// ─────────────────────────────────────────────────────────────────────────────

/// One queued block task. Parallel mode spawns these on the worker pool;
/// sequential mode invokes them inline in producer context.
pub(crate) type BlockJob<'env> = Box<dyn FnOnce() + Send + 'env>;

/// Per-operation state every block worker needs: the latched sink, the block
/// codec, the destination buffer pool, the shared stream digester, and the
/// two checksum switches from the descriptor.
pub(crate) struct BlockPipeline<'env, 'w> {
    pub(crate) shared: &'env Shared<'w>,
    pub(crate) codec: &'env dyn BlockCodec,
    pub(crate) dst_pool: &'env MemPool,
    pub(crate) digester: &'env Mutex<Xxh32>,
    pub(crate) block_checksum: bool,
    pub(crate) stream_checksum: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// One-shot convenience helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Encodes `src` as one complete frame into a freshly allocated `Vec<u8>`.
pub fn compress_to_vec(
    src: &[u8],
    codec: &dyn BlockCodec,
    sd: &StreamDescriptor,
    mode: Mode,
) -> Result<Vec<u8>, FrameResult> {
    let mut reader = IoReader::new(Cursor::new(src));
    let mut out = Vec::new();
    let result = {
        let mut ctx = FrameContext::new(&mut reader, &mut out, codec).with_mode(mode);
        compress(&mut ctx, sd)
    };
    result.into_result().map(|_| out)
}

/// Decodes every frame in `frames` and returns the concatenated uncompressed
/// payload.
pub fn decompress_to_vec(
    frames: &[u8],
    codec: &dyn BlockCodec,
    mode: Mode,
) -> Result<Vec<u8>, FrameResult> {
    let mut reader = IoReader::new(Cursor::new(frames));
    let mut out = Vec::new();
    let mut sd = StreamDescriptor::default();
    let result = {
        let mut ctx = FrameContext::new(&mut reader, &mut out, codec).with_mode(mode);
        decompress(&mut ctx, &mut sd)
    };
    result.into_result().map(|_| out)
}
