use std::fmt;

/// The position of a chunk column. This is a block position divided by 16.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChunkPos {
  x: i32,
  z: i32,
}

impl fmt::Display for ChunkPos {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "ChunkPos({} {})", self.x, self.z)
  }
}

impl ChunkPos {
  /// Creates a new chunk position.
  pub const fn new(x: i32, z: i32) -> Self { ChunkPos { x, z } }
  /// Returns the chunk that contains the given block coordinates.
  pub const fn of_block(x: i32, z: i32) -> Self { ChunkPos { x: x >> 4, z: z >> 4 } }
  /// Returns the X value of the position.
  #[inline(always)]
  pub const fn x(&self) -> i32 { self.x }
  /// Returns the Z value of the position.
  #[inline(always)]
  pub const fn z(&self) -> i32 { self.z }
  /// Returns the minimum block X value of the position. This is just x * 16.
  #[inline(always)]
  pub const fn block_x(&self) -> i32 { self.x * 16 }
  /// Returns the minimum block Z value of the position. This is just z * 16.
  #[inline(always)]
  pub const fn block_z(&self) -> i32 { self.z * 16 }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn of_block() {
    assert_eq!(ChunkPos::of_block(0, 0), ChunkPos::new(0, 0));
    assert_eq!(ChunkPos::of_block(15, 16), ChunkPos::new(0, 1));
    assert_eq!(ChunkPos::of_block(-1, -16), ChunkPos::new(-1, -1));
    assert_eq!(ChunkPos::of_block(-17, 31), ChunkPos::new(-2, 1));
    assert_eq!(ChunkPos::new(-2, 1).block_x(), -32);
  }
}
