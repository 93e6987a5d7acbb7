//! Shared fixtures for the frame pipeline integration tests: block codec
//! adapters, deterministic data generators, and a skippable-frame recorder.
#![allow(dead_code)] // each test binary uses a different subset

use std::io::{self, Cursor};

use lz4par::{BlockCodec, FrameRead, FrameResult, IoReader, Mode, StreamDescriptor};

/// Real LZ4 block codec backed by `lz4_flex`.
///
/// `compress` reports incompressible (0) when the block does not fit the
/// bounded output, which is exactly the encoder's stored-block signal;
/// `decompress` reports corrupt input as a negative count.
pub struct Lz4FlexCodec;

impl BlockCodec for Lz4FlexCodec {
    fn compress(&self, src: &[u8], dst: &mut [u8]) -> i32 {
        match lz4_flex::block::compress_into(src, dst) {
            Ok(n) => n as i32,
            Err(_) => 0,
        }
    }

    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> i32 {
        match lz4_flex::block::decompress_into(src, dst) {
            Ok(n) => n as i32,
            Err(_) => -1,
        }
    }
}

/// Codec that never compresses, forcing the stored-block path so wire
/// offsets stay computable by hand.
pub struct StoredCodec;

impl BlockCodec for StoredCodec {
    fn compress(&self, _src: &[u8], _dst: &mut [u8]) -> i32 {
        0
    }

    fn decompress(&self, _src: &[u8], _dst: &mut [u8]) -> i32 {
        -1
    }
}

/// Deterministic xorshift byte stream; incompressible for LZ4.
pub fn random_bytes(len: usize, mut seed: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        out.push(seed as u8);
    }
    out
}

/// Highly compressible text-like pattern.
pub fn compressible_bytes(len: usize) -> Vec<u8> {
    b"all work and no play makes block pipelines dull "
        .iter()
        .cycle()
        .take(len)
        .copied()
        .collect()
}

/// Encodes `input` with `codec`, panicking on failure.
pub fn encode(input: &[u8], codec: &dyn BlockCodec, sd: &StreamDescriptor, mode: Mode) -> Vec<u8> {
    lz4par::compress_to_vec(input, codec, sd, mode).expect("encode fixture")
}

/// Decodes `frames`, returning the result code and whatever payload was
/// written before any failure.
pub fn decode(frames: &[u8], codec: &dyn BlockCodec, mode: Mode) -> (FrameResult, Vec<u8>) {
    let mut reader = IoReader::new(Cursor::new(frames.to_vec()));
    let mut out = Vec::new();
    let mut sd = StreamDescriptor::default();
    let result = {
        let mut ctx = lz4par::FrameContext::new(&mut reader, &mut out, codec).with_mode(mode);
        lz4par::decompress(&mut ctx, &mut sd)
    };
    (result, out)
}

/// Reader wrapper that records every skippable frame it is handed.
pub struct SkippableRecorder {
    inner: IoReader<Cursor<Vec<u8>>>,
    pub frames: Vec<(u32, Vec<u8>)>,
}

impl SkippableRecorder {
    pub fn new(bytes: Vec<u8>) -> Self {
        SkippableRecorder {
            inner: IoReader::new(Cursor::new(bytes)),
            frames: Vec::new(),
        }
    }
}

impl FrameRead for SkippableRecorder {
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        self.inner.read(dst)
    }

    fn is_eof(&mut self) -> bool {
        self.inner.is_eof()
    }

    fn seek_relative(&mut self, offset: i64) -> io::Result<()> {
        self.inner.seek_relative(offset)
    }

    fn consume_skippable(&mut self, magic: u32, len: u32) -> io::Result<()> {
        let mut payload = vec![0u8; len as usize];
        let mut total = 0;
        while total < payload.len() {
            let n = self.read(&mut payload[total..])?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "skippable frame truncated",
                ));
            }
            total += n;
        }
        self.frames.push((magic, payload));
        Ok(())
    }
}

/// Builds a skippable frame with the given magic and payload.
pub fn skippable_frame(magic: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload.len());
    out.extend_from_slice(&magic.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}
