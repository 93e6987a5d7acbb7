//! Frame encoder: header emission, the parallel block pipeline, and the
//! end-of-stream tail.
//!
//! The producer thread reads one block at a time into a pool buffer and
//! dispatches a worker per block. Workers compress, hash, and write
//! concurrently; output order is enforced by a chain of per-block completion
//! gates — worker `i` waits for worker `i-1` to finish before its ordered
//! section (stream-hash fold plus writes), so the output stream and the
//! rolling checksum both observe blocks in read order while compression
//! itself overlaps freely.

use std::sync::Mutex;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::context::{read_full, FrameContext, FrameRead, Shared};
use crate::frame::header::{
    bd_to_byte, block_maximum_size, flg_to_byte, header_check_byte, store_u32, store_u64,
};
use crate::frame::types::{
    FrameResult, StreamDescriptor, BLOCK_UNCOMPRESSED_FLAG, CHECKSUM_SEED, EOS_MARKER,
    MAGIC_NUMBER, MAX_HEADER_SIZE,
};
use crate::frame::{BlockJob, BlockPipeline};
use crate::mempool::{Buffer, MemPool};
use crate::threadpool::{count_cores, WorkerPool};
use crate::xxhash::{xxh32, Xxh32};

/// Encodes the byte stream behind `ctx`'s reader as one LZ4 frame described
/// by `sd`, writing the container to `ctx`'s writer.
///
/// The descriptor is validated before any output byte is produced. Returns
/// the first failure latched by the producer or any block worker.
pub fn compress(ctx: &mut FrameContext<'_>, sd: &StreamDescriptor) -> FrameResult {
    let mode = ctx.mode;
    let codec = ctx.codec;
    let reader = &mut *ctx.reader;
    let shared = Shared::new(&mut *ctx.writer);

    let validity = sd.validate();
    if validity.is_error() {
        return shared.set_result(validity);
    }

    // ── Header ───────────────────────────────────────────────────────────────
    let mut header = [0u8; MAX_HEADER_SIZE];
    store_u32(&mut header, MAGIC_NUMBER);
    let sum_begin = 4;
    let mut end = sum_begin;
    header[end] = flg_to_byte(&sd.flg);
    end += 1;
    header[end] = bd_to_byte(&sd.bd);
    end += 1;
    if sd.flg.stream_size {
        store_u64(&mut header[end..], sd.stream_size);
        end += 8;
    }
    if sd.flg.preset_dictionary {
        store_u32(&mut header[end..], sd.dict_id);
        end += 4;
    }
    header[end] = header_check_byte(&header[sum_begin..end]);
    end += 1;
    if !shared.write_bin(&header[..end]) {
        return shared.set_result(FrameResult::CannotWriteHeader);
    }

    // ── Block pipeline ───────────────────────────────────────────────────────
    let block_max = block_maximum_size(sd.bd.block_maximum_size);

    let pool = if mode.is_sequential() {
        None
    } else {
        WorkerPool::new(count_cores())
    };
    // One buffer per worker plus one for the producer to prefetch into.
    let nb_buffers = pool.as_ref().map_or(1, |p| p.num_threads() + 1);

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
            encode_blocks(reader, &pipe, &src_pool, &mut |job| {
                scope.spawn(move |_| job())
            });
        }),
        None => encode_blocks(reader, &pipe, &src_pool, &mut |job| job()),
    }

    // ── Tail ─────────────────────────────────────────────────────────────────
    if !shared.write_u32(EOS_MARKER) {
        return shared.set_result(FrameResult::CannotWriteEos);
    }
    if sd.flg.stream_checksum {
        let digest = digester.lock().unwrap().digest();
        if !shared.write_u32(digest) {
            return shared.set_result(FrameResult::CannotWriteStreamChecksum);
        }
    }
    shared.result()
}

/// Producer loop: read a block, dispatch a worker, repeat until end of
/// input or a latched failure.
fn encode_blocks<'env>(
    reader: &mut dyn FrameRead,
    pipe: &'env BlockPipeline<'env, '_>,
    src_pool: &MemPool,
    submit: &mut dyn FnMut(BlockJob<'env>),
) {
    let mut prev_done: Option<Receiver<()>> = None;
    loop {
        if pipe.shared.quit() {
            break;
        }
        let mut src = src_pool.alloc();
        let read_size = read_full(reader, src.data_mut());
        if read_size == 0 {
            break;
        }
        src.resize(read_size);

        let (done_tx, done_rx) = bounded::<()>(1);
        let gate = prev_done.replace(done_rx);
        submit(Box::new(move || encode_one_block(pipe, src, gate, done_tx)));
    }
}

/// Worker body for block `i`: compress, choose the stored form, hash, then —
/// gated on block `i-1` — fold the stream checksum and emit the size prefix,
/// payload, and optional block checksum.
fn encode_one_block(
    pipe: &BlockPipeline<'_, '_>,
    src: Buffer,
    mut gate: Option<Receiver<()>>,
    done: Sender<()>,
) {
    // Dropping `done` on return (any path) is what releases the successor.
    let _done = done;
    if pipe.shared.error() {
        return;
    }

    let src_len = src.data().len();
    let mut dst = pipe.dst_pool.alloc();
    // Output capacity bounded to the input size: a codec that cannot fit the
    // block into as many bytes as it started with reports incompressible.
    let cmp_size = pipe.codec.compress(src.data(), &mut dst.data_mut()[..src_len]);
    let incompressible = cmp_size <= 0;
    if !incompressible {
        dst.resize(cmp_size as usize);
    }
    let (stored, size_bits) = if incompressible {
        (src.data(), src_len as u32 | BLOCK_UNCOMPRESSED_FLAG)
    } else {
        (dst.data(), cmp_size as u32)
    };
    // The block checksum covers the stored bytes, compressed or raw.
    let block_hash = if pipe.block_checksum {
        Some(xxh32(stored, CHECKSUM_SEED))
    } else {
        None
    };

    wait_predecessor(&mut gate);

    if pipe.stream_checksum {
        // Folds are gated like writes, so the digest sees the uncompressed
        // payloads in block order.
        pipe.digester.lock().unwrap().update(src.data());
    }
    pipe.shared.write_u32(size_bits);
    pipe.shared.write_bin(stored);
    if let Some(hash) = block_hash {
        pipe.shared.write_u32(hash);
    }
}

/// Blocks until the predecessor worker has finished its ordered section.
/// A token or a closed channel both mean "done".
pub(crate) fn wait_predecessor(gate: &mut Option<Receiver<()>>) {
    if let Some(rx) = gate.take() {
        let _ = rx.recv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BlockCodec, IoReader};
    use crate::frame::types::Mode;
    use std::io::{self, Cursor};

    /// Never compresses, so every block takes the stored path and the wire
    /// bytes are computable by hand.
    struct StoredCodec;
    impl BlockCodec for StoredCodec {
        fn compress(&self, _src: &[u8], _dst: &mut [u8]) -> i32 {
            0
        }
        fn decompress(&self, _src: &[u8], _dst: &mut [u8]) -> i32 {
            -1
        }
    }

    fn run(input: &[u8], sd: &StreamDescriptor, mode: Mode) -> (FrameResult, Vec<u8>) {
        let codec = StoredCodec;
        let mut reader = IoReader::new(Cursor::new(input.to_vec()));
        let mut out = Vec::new();
        let result = {
            let mut ctx = FrameContext::new(&mut reader, &mut out, &codec).with_mode(mode);
            compress(&mut ctx, sd)
        };
        (result, out)
    }

    #[test]
    fn empty_input_writes_header_eos_and_stream_hash() {
        let sd = StreamDescriptor::default();
        let (result, out) = run(b"", &sd, Mode::SEQUENTIAL);
        assert_eq!(result, FrameResult::Ok);

        let check = header_check_byte(&[0x64, 0x70]);
        let mut expected = vec![0x04, 0x22, 0x4D, 0x18, 0x64, 0x70, check, 0, 0, 0, 0];
        expected.extend_from_slice(&0x02CC_5D05u32.to_le_bytes()); // xxh32("", 0)
        assert_eq!(out, expected);
    }

    #[test]
    fn stored_block_sets_high_bit_and_copies_payload() {
        let mut sd = StreamDescriptor::default();
        sd.flg.stream_checksum = false;
        let (result, out) = run(b"Hello, World!", &sd, Mode::SEQUENTIAL);
        assert_eq!(result, FrameResult::Ok);

        let check = header_check_byte(&[0x60, 0x70]);
        let mut expected = vec![0x04, 0x22, 0x4D, 0x18, 0x60, 0x70, check];
        expected.extend_from_slice(&(13u32 | BLOCK_UNCOMPRESSED_FLAG).to_le_bytes());
        expected.extend_from_slice(b"Hello, World!");
        expected.extend_from_slice(&[0, 0, 0, 0]);
        assert_eq!(out, expected);
    }

    #[test]
    fn block_checksum_covers_stored_bytes() {
        let mut sd = StreamDescriptor::default();
        sd.flg.stream_checksum = false;
        sd.flg.block_checksum = true;
        let payload = b"block checksum payload";
        let (result, out) = run(payload, &sd, Mode::SEQUENTIAL);
        assert_eq!(result, FrameResult::Ok);

        // flg: version | independence | block checksum = 0x70
        let check = header_check_byte(&[0x70, 0x70]);
        let mut expected = vec![0x04, 0x22, 0x4D, 0x18, 0x70, 0x70, check];
        expected.extend_from_slice(&(payload.len() as u32 | BLOCK_UNCOMPRESSED_FLAG).to_le_bytes());
        expected.extend_from_slice(payload);
        expected.extend_from_slice(&xxh32(payload, 0).to_le_bytes());
        expected.extend_from_slice(&[0, 0, 0, 0]);
        assert_eq!(out, expected);
    }

    #[test]
    fn stream_size_field_is_emitted_when_flagged() {
        let mut sd = StreamDescriptor::default();
        sd.flg.stream_checksum = false;
        sd.flg.stream_size = true;
        sd.stream_size = 13;
        let (result, out) = run(b"Hello, World!", &sd, Mode::SEQUENTIAL);
        assert_eq!(result, FrameResult::Ok);

        // flg: version | independence | stream size = 0x68
        let mut descriptor = vec![0x68, 0x70];
        descriptor.extend_from_slice(&13u64.to_le_bytes());
        let check = header_check_byte(&descriptor);

        let mut expected = vec![0x04, 0x22, 0x4D, 0x18];
        expected.extend_from_slice(&descriptor);
        expected.push(check);
        assert_eq!(&out[..expected.len()], &expected[..]);
    }

    #[test]
    fn invalid_descriptor_writes_nothing() {
        let mut sd = StreamDescriptor::default();
        sd.flg.version_number = 2;
        let (result, out) = run(b"payload", &sd, Mode::SEQUENTIAL);
        assert_eq!(result, FrameResult::InvalidVersion);
        assert!(out.is_empty());
    }

    struct FailingSink;
    impl io::Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "sink failure"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn unwritable_sink_reports_header_failure() {
        let codec = StoredCodec;
        let mut reader = IoReader::new(Cursor::new(b"data".to_vec()));
        let mut sink = FailingSink;
        let result = {
            let mut ctx =
                FrameContext::new(&mut reader, &mut sink, &codec).with_mode(Mode::SEQUENTIAL);
            compress(&mut ctx, &StreamDescriptor::default())
        };
        assert_eq!(result, FrameResult::CannotWriteHeader);
    }

    #[test]
    fn parallel_and_sequential_emit_identical_bytes() {
        // Four 64 KiB blocks plus a short tail.
        let input: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
        let mut sd = StreamDescriptor::default();
        sd.bd.block_maximum_size = 4;
        sd.flg.block_checksum = true;

        let (r_seq, seq) = run(&input, &sd, Mode::SEQUENTIAL);
        let (r_par, par) = run(&input, &sd, Mode::PARALLEL);
        assert_eq!(r_seq, FrameResult::Ok);
        assert_eq!(r_par, FrameResult::Ok);
        assert_eq!(seq, par);
    }
}
