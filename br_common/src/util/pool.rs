use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::{
  fmt,
  ops::{Deref, DerefMut},
};

/// Default to 256 buffers kept around by a pool.
pub const DEFAULT_LIMIT: usize = 256;

/// A pool of scratch byte buffers. Chunk encoding allocates a few kilobytes per
/// column, so instead of dropping the buffer after every packet, we hand it
/// back here and reuse the allocation.
///
/// Buffers are handed out through a [`PooledBuf`] guard, which puts the buffer
/// back when it is dropped. This means an early return (or a `?`) can never
/// leak a buffer.
///
/// This is cheap to clone, and all clones share the same free list.
#[derive(Clone)]
pub struct BufferPool {
  tx: Sender<Vec<u8>>,
  rx: Receiver<Vec<u8>>,
}

impl fmt::Debug for BufferPool {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("BufferPool").field("free", &self.rx.len()).finish()
  }
}

impl Default for BufferPool {
  fn default() -> Self { BufferPool::new(DEFAULT_LIMIT) }
}

impl BufferPool {
  /// Creates a buffer pool that will keep at most `limit` unused buffers. Any
  /// buffers returned past that point are simply freed.
  ///
  /// # Panics
  ///
  /// Panics if the limit is 0.
  pub fn new(limit: usize) -> Self {
    if limit == 0 {
      panic!("cannot create a buffer pool with no space");
    }
    let (tx, rx) = crossbeam_channel::bounded(limit);
    BufferPool { tx, rx }
  }

  /// Takes a buffer out of the pool, or allocates a new empty one if the pool
  /// is empty. The returned buffer is always empty, but it may have some
  /// capacity left over from the last time it was used.
  pub fn acquire(&self) -> PooledBuf {
    let buf = self.rx.try_recv().unwrap_or_default();
    PooledBuf { buf, tx: self.tx.clone() }
  }

  /// Returns the number of buffers waiting in the pool.
  pub fn free(&self) -> usize { self.rx.len() }
}

/// A buffer borrowed from a [`BufferPool`]. This derefs to a `Vec<u8>`, and
/// will be cleared and sent back to the pool once dropped.
pub struct PooledBuf {
  buf: Vec<u8>,
  tx:  Sender<Vec<u8>>,
}

impl fmt::Debug for PooledBuf {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("PooledBuf").field("len", &self.buf.len()).finish()
  }
}

impl PooledBuf {
  /// Copies the contents of this buffer out into a new `Vec`. The pooled
  /// allocation stays with this guard, and will go back to the pool.
  pub fn to_vec(&self) -> Vec<u8> { self.buf.clone() }
}

impl Deref for PooledBuf {
  type Target = Vec<u8>;
  fn deref(&self) -> &Vec<u8> { &self.buf }
}
impl DerefMut for PooledBuf {
  fn deref_mut(&mut self) -> &mut Vec<u8> { &mut self.buf }
}

impl Drop for PooledBuf {
  fn drop(&mut self) {
    let mut buf = std::mem::take(&mut self.buf);
    buf.clear();
    match self.tx.try_send(buf) {
      Ok(()) => {}
      // The pool is full, so this buffer just gets freed.
      Err(TrySendError::Full(_)) => {}
      // The pool was dropped before this buffer.
      Err(TrySendError::Disconnected(_)) => {}
    }
  }
}
