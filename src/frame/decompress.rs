//! Frame decoder: magic dispatch, header parsing, the parallel block
//! pipeline, and checksum verification.
//!
//! The outer loop consumes consecutive frames until a clean end of stream,
//! handing skippable frames to the reader's handler and pushing back the
//! four magic bytes of anything it does not recognize. Within a frame the
//! producer reads size prefixes and payloads while workers decompress and
//! verify concurrently, gated into output order the same way the encoder is.

use std::sync::Mutex;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::context::{read_full, FrameContext, FrameRead, Shared};
use crate::frame::compress::wait_predecessor;
use crate::frame::header::{
    bd_from_byte, block_maximum_size, flg_from_byte, header_check_byte, load_u32, load_u64,
};
use crate::frame::types::{
    is_skippable_magic, FrameResult, StreamDescriptor, BLOCK_UNCOMPRESSED_FLAG, CHECKSUM_SEED,
    EOS_MARKER, MAGIC_NUMBER, MAX_HEADER_SIZE,
};
use crate::frame::{BlockJob, BlockPipeline};
use crate::mempool::{Buffer, MemPool};
use crate::threadpool::{count_cores, WorkerPool};
use crate::xxhash::{xxh32, Xxh32};

/// Decodes every frame from `ctx`'s reader, writing the uncompressed
/// payload to `ctx`'s writer. The last parsed frame header is left in `sd`.
///
/// End of stream between frames is a clean finish; end of stream inside a
/// frame surfaces as the specific `INVALID_HEADER` / `CANNOT_READ_*` code
/// for whatever field was cut short.
pub fn decompress(ctx: &mut FrameContext<'_>, sd: &mut StreamDescriptor) -> FrameResult {
    let mode = ctx.mode;
    let codec = ctx.codec;
    let reader = &mut *ctx.reader;
    let shared = Shared::new(&mut *ctx.writer);

    let pool = if mode.is_sequential() {
        None
    } else {
        WorkerPool::new(count_cores())
    };
    let nb_buffers = pool.as_ref().map_or(1, |p| p.num_threads() + 1);

    while !shared.quit() && !shared.error() && !reader.is_eof() {
        // ── Magic dispatch ───────────────────────────────────────────────────
        let mut magic_bytes = [0u8; 4];
        let got = read_full(reader, &mut magic_bytes);
        if got == 0 {
            break; // end of stream between frames
        }
        if got < 4 {
            shared.set_result(FrameResult::InvalidHeader);
            break;
        }
        let magic = load_u32(&magic_bytes);

        if is_skippable_magic(magic) {
            let len = match shared.read_u32(reader) {
                Some(v) => v,
                None => {
                    shared.set_result(FrameResult::InvalidHeader);
                    break;
                }
            };
            if reader.consume_skippable(magic, len).is_err() {
                shared.set_result(FrameResult::InvalidHeader);
                break;
            }
            continue;
        }

        if magic != MAGIC_NUMBER {
            // Leave the unread bytes for the caller to reinterpret.
            let _ = reader.seek_relative(-4);
            shared.set_result(FrameResult::InvalidMagicNumber);
            break;
        }

        // ── Descriptor ───────────────────────────────────────────────────────
        let mut hdr = [0u8; MAX_HEADER_SIZE];
        if read_full(reader, &mut hdr[..2]) != 2 {
            shared.set_result(FrameResult::InvalidHeader);
            break;
        }
        sd.flg = flg_from_byte(hdr[0]);
        sd.bd = bd_from_byte(hdr[1]);
        let validity = sd.validate();
        if validity.is_error() {
            shared.set_result(validity);
            break;
        }

        let n_extra = usize::from(sd.flg.stream_size) * 8
            + usize::from(sd.flg.preset_dictionary) * 4
            + 1;
        if read_full(reader, &mut hdr[2..2 + n_extra]) != n_extra {
            shared.set_result(FrameResult::InvalidHeader);
            break;
        }
        let mut p = 2;
        if sd.flg.stream_size {
            sd.stream_size = load_u64(&hdr[p..]);
            p += 8;
        }
        if sd.flg.preset_dictionary {
            sd.dict_id = load_u32(&hdr[p..]);
            p += 4;
        }
        if hdr[p] != header_check_byte(&hdr[..p]) {
            shared.set_result(FrameResult::InvalidHeaderChecksum);
            break;
        }

        // ── Block pipeline ───────────────────────────────────────────────────
        let block_max = block_maximum_size(sd.bd.block_maximum_size);
        let src_pool = MemPool::new(block_max, nb_buffers);
        let dst_pool = MemPool::new(block_max, nb_buffers);
        let digester = Mutex::new(Xxh32::new(CHECKSUM_SEED));
        let pipe = BlockPipeline {
            shared: &shared,
            codec,
            dst_pool: &dst_pool,
            digester: &digester,
            block_checksum: sd.flg.block_checksum,
            stream_checksum: sd.flg.stream_checksum,
        };

        match &pool {
            Some(pool) => pool.scope(|scope| {
                decode_blocks(&mut *reader, &pipe, &src_pool, &mut |job| {
                    scope.spawn(move |_| job())
                });
            }),
            None => decode_blocks(&mut *reader, &pipe, &src_pool, &mut |job| job()),
        }

        // ── Stream checksum ──────────────────────────────────────────────────
        if !shared.error() && sd.flg.stream_checksum {
            let expected = match shared.read_u32(&mut *reader) {
                Some(v) => v,
                None => {
                    shared.set_result(FrameResult::CannotReadStreamChecksum);
                    break;
                }
            };
            if digester.lock().unwrap().digest() != expected {
                shared.set_result(FrameResult::StreamChecksumMismatch);
                break;
            }
        }
    }

    shared.result()
}

/// Producer loop: read one size prefix, payload, and optional block
/// checksum, then dispatch a worker; stops at the EOS marker, end of
/// stream, or a latched failure.
fn decode_blocks<'env>(
    reader: &mut dyn FrameRead,
    pipe: &'env BlockPipeline<'env, '_>,
    src_pool: &MemPool,
    submit: &mut dyn FnMut(BlockJob<'env>),
) {
    let mut prev_done: Option<Receiver<()>> = None;
    loop {
        if pipe.shared.quit() || reader.is_eof() {
            break;
        }
        let size_bits = match pipe.shared.read_u32(reader) {
            Some(v) => v,
            None => {
                pipe.shared.set_result(FrameResult::CannotReadBlockSize);
                break;
            }
        };
        if size_bits == EOS_MARKER {
            break;
        }
        let incompressible = size_bits & BLOCK_UNCOMPRESSED_FLAG != 0;
        let src_size = (size_bits & !BLOCK_UNCOMPRESSED_FLAG) as usize;
        if src_size > src_pool.buf_size() {
            // A size prefix above the declared block maximum cannot have
            // come from a conforming encoder.
            pipe.shared.set_result(FrameResult::CannotReadBlockData);
            break;
        }

        let mut src = src_pool.alloc();
        src.resize(src_size);
        if read_full(reader, src.data_mut()) != src_size {
            pipe.shared.set_result(FrameResult::CannotReadBlockData);
            break;
        }

        let expected_hash = if pipe.block_checksum {
            match pipe.shared.read_u32(reader) {
                Some(v) => v,
                None => {
                    pipe.shared.set_result(FrameResult::CannotReadBlockChecksum);
                    break;
                }
            }
        } else {
            0
        };

        let (done_tx, done_rx) = bounded::<()>(1);
        let gate = prev_done.replace(done_rx);
        submit(Box::new(move || {
            decode_one_block(pipe, src, incompressible, expected_hash, gate, done_tx)
        }));
    }
}

/// Worker body for block `i`: verify the stored-byte checksum, decompress
/// unless the block is stored raw, then — gated on block `i-1` — fold the
/// stream checksum over the uncompressed bytes and write them out.
fn decode_one_block(
    pipe: &BlockPipeline<'_, '_>,
    src: Buffer,
    incompressible: bool,
    expected_hash: u32,
    mut gate: Option<Receiver<()>>,
    done: Sender<()>,
) {
    // Dropping `done` on return (any path) is what releases the successor.
    let _done = done;
    if pipe.shared.error() || pipe.shared.quit() {
        return;
    }

    // The block checksum covers the stored bytes, still compressed for
    // compressed blocks; the comparison happens after the write, matching
    // the encoder's hash-over-stored-bytes convention.
    let block_hash = if pipe.block_checksum {
        Some(xxh32(src.data(), CHECKSUM_SEED))
    } else {
        None
    };

    if incompressible {
        wait_predecessor(&mut gate);
        if pipe.stream_checksum {
            pipe.digester.lock().unwrap().update(src.data());
        }
        pipe.shared.write_bin(src.data());
    } else {
        let mut dst = pipe.dst_pool.alloc();
        let dec_size = pipe.codec.decompress(src.data(), dst.data_mut());
        if dec_size < 0 {
            pipe.shared.set_result(FrameResult::DecompressFail);
            return;
        }
        dst.resize(dec_size as usize);
        wait_predecessor(&mut gate);
        if pipe.stream_checksum {
            pipe.digester.lock().unwrap().update(dst.data());
        }
        pipe.shared.write_bin(dst.data());
    }

    if let Some(hash) = block_hash {
        if hash != expected_hash {
            pipe.shared.set_result(FrameResult::BlockChecksumMismatch);
        }
    }
}
