mod buffer;
mod pool;

pub use buffer::{Buffer, BufferError, BufferErrorKind, Mode};
pub use pool::{BufferPool, PooledBuf, DEFAULT_LIMIT};

/// Returns the number of bytes `v` takes up when written as an unsigned
/// varint. This is the Bedrock `VarUInt32` encoding, which is the same bytes
/// as a Java varint for non-negative values.
pub fn varuint_len(v: u32) -> usize {
  match v {
    0..=0x7f => 1,
    0x80..=0x3fff => 2,
    0x4000..=0x1f_ffff => 3,
    0x20_0000..=0xfff_ffff => 4,
    _ => 5,
  }
}

/// Zigzag encodes the given value, so that small negative numbers become
/// small unsigned numbers. Used for Bedrock's signed varints.
pub const fn zigzag32(v: i32) -> u32 { ((v << 1) ^ (v >> 31)) as u32 }
/// Zigzag encodes a 64 bit value. See [`zigzag32`].
pub const fn zigzag64(v: i64) -> u64 { ((v << 1) ^ (v >> 63)) as u64 }
