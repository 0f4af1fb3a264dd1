use std::fmt;

/// A position relative to a chunk section. This has X, Y and Z set to only be
/// in the range `0..16`.
///
/// The two editions lay out a section differently. Java stores blocks in YZX
/// order, and Bedrock stores them in XZY order. Both indices are available
/// here, so that nothing else needs to remember the shifts.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct SectionRelPos {
  x: u8,
  y: u8,
  z: u8,
}

impl fmt::Display for SectionRelPos {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "SectionRelPos({} {} {})", self.x, self.y, self.z)
  }
}

impl SectionRelPos {
  /// A section-relative position.
  ///
  /// # Panics
  /// If the X, Y, or Z is greater than 15.
  pub fn new(x: u8, y: u8, z: u8) -> Self {
    if x >= 16 || y >= 16 || z >= 16 {
      panic!("X, Y and Z must be within 0..16, got {x} {y} {z}");
    }
    SectionRelPos { x, y, z }
  }
  /// Converts a Bedrock (XZY) flat index back into a position.
  ///
  /// # Panics
  /// If the index is outside of `0..4096`.
  pub fn from_bedrock_index(index: usize) -> Self {
    assert!(index < 4096, "index {index} is outside of a section");
    SectionRelPos { x: (index >> 8) as u8, z: ((index >> 4) & 0xf) as u8, y: (index & 0xf) as u8 }
  }
  /// Returns the X position. This won't return a value above 15.
  #[inline(always)]
  pub fn x(&self) -> u8 { self.x }
  /// Returns the Y position. This won't return a value above 15.
  #[inline(always)]
  pub fn y(&self) -> u8 { self.y }
  /// Returns the Z position. This won't return a value above 15.
  #[inline(always)]
  pub fn z(&self) -> u8 { self.z }

  /// The Bedrock flat index, `x << 8 | z << 4 | y`.
  #[inline(always)]
  pub fn bedrock_index(&self) -> usize {
    (self.x as usize) << 8 | (self.z as usize) << 4 | self.y as usize
  }
  /// The Java flat index, `y << 8 | z << 4 | x`.
  #[inline(always)]
  pub fn java_index(&self) -> usize {
    (self.y as usize) << 8 | (self.z as usize) << 4 | self.x as usize
  }
}

/// Converts a Java (YZX) flat index into a Bedrock (XZY) flat index. The Z
/// nibble stays where it is, and X and Y trade places.
#[inline(always)]
pub const fn java_to_bedrock_index(yzx: usize) -> usize {
  (yzx >> 8) | (yzx & 0xf0) | ((yzx & 0xf) << 8)
}
