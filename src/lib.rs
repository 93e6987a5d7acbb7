//! `lz4par` — a multi-threaded encoder/decoder core for the LZ4 frame
//! format.
//!
//! The crate implements the frame container state machine and a parallel
//! block pipeline, sitting between a caller-supplied LZ4 block codec and
//! caller-supplied byte streams. Blocks are compressed and verified on a
//! worker pool while output order and the rolling stream checksum follow
//! strict block order; a bounded buffer pool provides back-pressure so the
//! producer never runs more than one block ahead of the workers.
//!
//! # Crate layout
//!
//! | Module       | Contents |
//! |--------------|----------|
//! | `frame`      | Frame container: header, block loops, checksum tails. |
//! | `context`    | `FrameRead` / `FrameWrite` / `BlockCodec` seams and the per-operation context. |
//! | `mempool`    | Bounded pool of fixed-size reusable buffers. |
//! | `threadpool` | Scoped rayon-backed worker pool. |
//! | `xxhash`     | XXH32 one-shot and incremental digest wrapper. |
//!
//! # Example
//!
//! ```no_run
//! use lz4par::{compress, FrameContext, IoReader, Mode, StreamDescriptor};
//! # struct NullCodec;
//! # impl lz4par::BlockCodec for NullCodec {
//! #     fn compress(&self, _s: &[u8], _d: &mut [u8]) -> i32 { 0 }
//! #     fn decompress(&self, _s: &[u8], _d: &mut [u8]) -> i32 { -1 }
//! # }
//! let codec = NullCodec;
//! let mut reader = IoReader::new(std::io::Cursor::new(b"payload".to_vec()));
//! let mut out = Vec::new();
//! let mut ctx = FrameContext::new(&mut reader, &mut out, &codec)
//!     .with_mode(Mode::PARALLEL);
//! let result = compress(&mut ctx, &StreamDescriptor::default());
//! assert!(result.is_ok());
//! ```

pub mod context;
pub mod frame;
pub mod mempool;
pub mod threadpool;
pub mod xxhash;

// ── Top-level re-exports ──────────────────────────────────────────────────────
pub use context::{BlockCodec, FrameContext, FrameRead, FrameWrite, IoReader};
pub use frame::{
    compress, compress_to_vec, decompress, decompress_to_vec, Bd, Flg, FrameResult, Mode,
    StreamDescriptor,
};
pub use mempool::{Buffer, MemPool};
pub use threadpool::{count_cores, WorkerPool};
