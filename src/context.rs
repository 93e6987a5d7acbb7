//! I/O and codec seams for one frame operation, plus the shared fault latch.
//!
//! A [`FrameContext`] bundles what the encoder and decoder need from the
//! outside world: a byte source, a byte sink, a block codec, and the
//! execution [`Mode`]. The block codec and the streams are collaborators the
//! core never implements itself — it only moves bytes between them.
//!
//! Internally each operation wraps the sink and its result state in a
//! [`Shared`] latch that workers on other threads can reach: writes are
//! suppressed once any failure is recorded, and recorded failures only ever
//! promote from `Ok`/generic `Error` to a specific code, so the first
//! specific failure wins no matter how many workers race to report one.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::frame::header::store_u32;
use crate::frame::types::{FrameResult, Mode};

// ─────────────────────────────────────────────────────────────────────────────
// Caller-supplied collaborators
// ─────────────────────────────────────────────────────────────────────────────

/// Byte source for a frame operation.
pub trait FrameRead: Send {
    /// Reads up to `dst.len()` bytes. `Ok(0)` signals end of stream.
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize>;

    /// Whether the stream is exhausted.
    fn is_eof(&mut self) -> bool;

    /// Repositions the stream relative to the current offset; negative
    /// values rewind. Used to push back an unrecognized magic number.
    fn seek_relative(&mut self, offset: i64) -> io::Result<()>;

    /// Invoked once per skippable frame with its magic number and declared
    /// payload length. The default implementation discards the payload.
    fn consume_skippable(&mut self, _magic: u32, len: u32) -> io::Result<()> {
        let mut remaining = len as usize;
        let mut scratch = [0u8; 4096];
        while remaining > 0 {
            let want = scratch.len().min(remaining);
            let n = self.read(&mut scratch[..want])?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "skippable frame truncated",
                ));
            }
            remaining -= n;
        }
        Ok(())
    }
}

/// Byte sink for a frame operation. Implemented for every
/// `std::io::Write + Send`, where a short write surfaces as an error.
pub trait FrameWrite: Send {
    fn write_all(&mut self, src: &[u8]) -> io::Result<()>;
}

impl<W: io::Write + Send> FrameWrite for W {
    fn write_all(&mut self, src: &[u8]) -> io::Result<()> {
        io::Write::write_all(self, src)
    }
}

/// The external LZ4 block compressor/decompressor pair.
///
/// Both calls use the signed-count convention of the underlying codecs:
/// `compress` returns the stored size, or a value ≤ 0 when the input cannot
/// be compressed into `dst` (the encoder bounds `dst` to the input size, so
/// this is the incompressibility signal); `decompress` returns the
/// decompressed size, or a negative value on corrupt input.
pub trait BlockCodec: Sync {
    fn compress(&self, src: &[u8], dst: &mut [u8]) -> i32;
    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> i32;
}

/// [`FrameRead`] adapter for buffered, seekable readers (`Cursor`, a
/// `BufReader<File>`, …).
pub struct IoReader<R> {
    inner: R,
}

impl<R> IoReader<R> {
    pub fn new(inner: R) -> Self {
        IoReader { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: io::BufRead + io::Seek + Send> FrameRead for IoReader<R> {
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        self.inner.read(dst)
    }

    fn is_eof(&mut self) -> bool {
        self.inner.fill_buf().map(|b| b.is_empty()).unwrap_or(true)
    }

    fn seek_relative(&mut self, offset: i64) -> io::Result<()> {
        self.inner.seek(io::SeekFrom::Current(offset)).map(|_| ())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FrameContext
// ─────────────────────────────────────────────────────────────────────────────

/// Everything one `compress` or `decompress` call needs: source, sink,
/// block codec, and execution mode.
pub struct FrameContext<'a> {
    pub(crate) reader: &'a mut dyn FrameRead,
    pub(crate) writer: &'a mut dyn FrameWrite,
    pub(crate) codec: &'a dyn BlockCodec,
    pub(crate) mode: Mode,
}

impl<'a> FrameContext<'a> {
    /// Bundles the collaborators with the default parallel [`Mode`].
    pub fn new(
        reader: &'a mut dyn FrameRead,
        writer: &'a mut dyn FrameWrite,
        codec: &'a dyn BlockCodec,
    ) -> Self {
        FrameContext {
            reader,
            writer,
            codec,
            mode: Mode::default(),
        }
    }

    /// Overrides the execution mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared per-operation state
// ─────────────────────────────────────────────────────────────────────────────

/// Sink plus result latch plus quit flag, shared by the producer and every
/// block worker of one operation.
pub(crate) struct Shared<'a> {
    writer: Mutex<&'a mut dyn FrameWrite>,
    result: Mutex<FrameResult>,
    quit: AtomicBool,
}

impl<'a> Shared<'a> {
    pub(crate) fn new(writer: &'a mut dyn FrameWrite) -> Self {
        Shared {
            writer: Mutex::new(writer),
            result: Mutex::new(FrameResult::Ok),
            quit: AtomicBool::new(false),
        }
    }

    /// Whether any failure has been recorded.
    pub(crate) fn error(&self) -> bool {
        self.result.lock().unwrap().is_error()
    }

    /// Whether in-flight workers should bail out without touching the sink.
    pub(crate) fn quit(&self) -> bool {
        self.quit.load(Ordering::Acquire)
    }

    /// Records `result`, promoting only from `Ok` or the generic `Error`;
    /// a specific code already latched is sticky. Any recorded failure also
    /// raises the quit flag. Returns the latched value.
    pub(crate) fn set_result(&self, result: FrameResult) -> FrameResult {
        let mut slot = self.result.lock().unwrap();
        if matches!(*slot, FrameResult::Ok | FrameResult::Error) {
            *slot = result;
        }
        if slot.is_error() {
            self.quit.store(true, Ordering::Release);
        }
        *slot
    }

    /// The currently latched result.
    pub(crate) fn result(&self) -> FrameResult {
        *self.result.lock().unwrap()
    }

    /// Writes `bytes` to the sink unless a failure is already latched.
    /// A failed write latches the generic error and returns `false`.
    pub(crate) fn write_bin(&self, bytes: &[u8]) -> bool {
        if self.error() {
            return false;
        }
        if self.writer.lock().unwrap().write_all(bytes).is_err() {
            self.set_result(FrameResult::Error);
            return false;
        }
        true
    }

    /// Little-endian `u32` variant of [`Shared::write_bin`].
    pub(crate) fn write_u32(&self, value: u32) -> bool {
        let mut d = [0u8; 4];
        store_u32(&mut d, value);
        self.write_bin(&d)
    }

    /// Reads a little-endian `u32` from `reader`, latching the generic error
    /// on a short read. Call sites promote the latch to their specific code.
    pub(crate) fn read_u32(&self, reader: &mut dyn FrameRead) -> Option<u32> {
        if self.error() {
            return None;
        }
        let mut d = [0u8; 4];
        if read_full(reader, &mut d) != 4 {
            self.set_result(FrameResult::Error);
            return None;
        }
        Some(crate::frame::header::load_u32(&d))
    }
}

/// Fills `dst` from `reader`, looping over partial reads. Returns the number
/// of bytes read, which is short only on end of stream or a read error.
pub(crate) fn read_full(reader: &mut dyn FrameRead, dst: &mut [u8]) -> usize {
    let mut total = 0;
    while total < dst.len() {
        match reader.read(&mut dst[total..]) {
            Ok(0) | Err(_) => break,
            Ok(n) => total += n,
        }
    }
    total
}
