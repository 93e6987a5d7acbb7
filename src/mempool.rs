//! Bounded pool of fixed-capacity reusable byte buffers.
//!
//! The pool doubles as the pipeline's admission control: the producer blocks
//! in [`MemPool::alloc`] while every buffer is in flight, so at most
//! `nb_buffers` blocks are ever being read, transformed, or written at once.
//! The free list is a pre-filled bounded channel — the same semaphore idiom
//! as the worker pool's slot accounting — and dropping a [`Buffer`] sends its
//! backing store home, including on unwind paths.

use crossbeam_channel::{bounded, Receiver, Sender};

/// Pool of `nb_buffers` same-size buffers. Safe to share across workers.
pub struct MemPool {
    buf_size: usize,
    free_tx: Sender<Vec<u8>>,
    free_rx: Receiver<Vec<u8>>,
}

/// Owning handle on one pool buffer.
///
/// `data()` exposes the logical length, which starts at the full capacity and
/// only shrinks through [`Buffer::resize`]. The backing store keeps its full
/// capacity for the next borrower.
pub struct Buffer {
    data: Vec<u8>,
    len: usize,
    home: Sender<Vec<u8>>,
}

impl MemPool {
    /// Creates a pool holding `nb_buffers` buffers of `buf_size` bytes each.
    pub fn new(buf_size: usize, nb_buffers: usize) -> Self {
        let (free_tx, free_rx) = bounded(nb_buffers);
        for _ in 0..nb_buffers {
            free_tx
                .send(vec![0u8; buf_size])
                .expect("free list sized to hold every buffer");
        }
        MemPool {
            buf_size,
            free_tx,
            free_rx,
        }
    }

    /// Takes a buffer out of the pool, blocking until one is free.
    pub fn alloc(&self) -> Buffer {
        let data = self
            .free_rx
            .recv()
            .expect("pool owns a sender; the free list cannot disconnect");
        Buffer {
            len: data.len(),
            data,
            home: self.free_tx.clone(),
        }
    }

    /// Capacity of each buffer in the pool.
    pub fn buf_size(&self) -> usize {
        self.buf_size
    }
}

impl Buffer {
    /// The logically valid bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Mutable view of the logically valid bytes.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data[..self.len]
    }

    /// Fixed capacity of the underlying storage.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Shrinks the logical length to `len` bytes.
    ///
    /// # Panics
    /// Panics if `len` exceeds the buffer capacity.
    pub fn resize(&mut self, len: usize) {
        assert!(len <= self.data.len(), "resize beyond buffer capacity");
        self.len = len;
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        // Send failure means the pool itself is gone; the storage is freed.
        let _ = self.home.send(std::mem::take(&mut self.data));
    }
}
