//! Bedrock's packed index arrays. These are what every block layer and biome
//! section is made of on the wire.

use std::fmt;

/// The number of cells in a sub chunk.
pub const SIZE: usize = 4096;

/// One of the bit widths that Bedrock supports. Values are packed into 32 bit
/// words, and never span two words, so some versions waste a few bits at the
/// top of every word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PaletteVersion {
  /// Every cell is the first dictionary entry. No words are stored.
  V0,
  V1,
  V2,
  V3,
  V4,
  V5,
  V6,
  V8,
  V16,
}

impl PaletteVersion {
  pub const ALL: [PaletteVersion; 9] = [
    Self::V0,
    Self::V1,
    Self::V2,
    Self::V3,
    Self::V4,
    Self::V5,
    Self::V6,
    Self::V8,
    Self::V16,
  ];

  /// Bits per entry.
  pub const fn bits(self) -> u8 {
    match self {
      Self::V0 => 0,
      Self::V1 => 1,
      Self::V2 => 2,
      Self::V3 => 3,
      Self::V4 => 4,
      Self::V5 => 5,
      Self::V6 => 6,
      Self::V8 => 8,
      Self::V16 => 16,
    }
  }

  /// Number of entries packed into one word. This is 0 for `V0`, which has no
  /// words at all.
  pub const fn entries_per_word(self) -> usize {
    match self.bits() {
      0 => 0,
      b => 32 / b as usize,
    }
  }

  /// Number of words needed to store a whole sub chunk.
  pub const fn words(self) -> usize {
    match self.entries_per_word() {
      0 => 0,
      epw => (SIZE + epw - 1) / epw,
    }
  }

  /// The largest dictionary index that fits in this version.
  pub const fn max_index(self) -> u32 { (1 << self.bits()) - 1 }

  /// The next wider version, or `None` for `V16`.
  pub const fn next(self) -> Option<Self> {
    Some(match self {
      Self::V0 => Self::V1,
      Self::V1 => Self::V2,
      Self::V2 => Self::V3,
      Self::V3 => Self::V4,
      Self::V4 => Self::V5,
      Self::V5 => Self::V6,
      Self::V6 => Self::V8,
      Self::V8 => Self::V16,
      Self::V16 => return None,
    })
  }

  /// Returns the narrowest version with at least `bits` bits per entry.
  pub fn for_bits_ceil(bits: u8) -> Option<Self> {
    Self::ALL.iter().copied().find(|v| v.bits() >= bits)
  }

  /// The header byte that goes in front of a storage on the wire. The low bit
  /// is set for runtime ids, which is all the network ever uses.
  pub const fn header(self, runtime: bool) -> u8 { self.bits() << 1 | runtime as u8 }
}

impl fmt::Display for PaletteVersion {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "V{}", self.bits()) }
}

/// A fixed size array of 4096 dictionary indices, packed at the width of its
/// [`PaletteVersion`].
#[derive(Clone, PartialEq, Eq)]
pub struct Palette {
  version: PaletteVersion,
  words:   Vec<u32>,
}

impl fmt::Debug for Palette {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Palette")
      .field("version", &self.version)
      .field("nonzero_words", &self.words.iter().filter(|w| **w != 0).count())
      .finish()
  }
}

impl Palette {
  /// Creates a palette with every index set to 0.
  pub fn new(version: PaletteVersion) -> Self {
    Palette { version, words: vec![0; version.words()] }
  }

  /// Wraps existing words.
  ///
  /// # Panics
  /// If the number of words doesn't match the version.
  pub fn from_words(version: PaletteVersion, words: Vec<u32>) -> Self {
    assert_eq!(
      words.len(),
      version.words(),
      "wrong number of words for palette version {version}"
    );
    Palette { version, words }
  }

  pub fn version(&self) -> PaletteVersion { self.version }
  pub fn words(&self) -> &[u32] { &self.words }

  #[inline(always)]
  fn check_index(index: usize) {
    assert!(index < SIZE, "index {index} is outside of a sub chunk (must be less than {SIZE})");
  }

  /// Returns the dictionary index stored at the given cell.
  ///
  /// # Panics
  /// If `index` is outside of `0..4096`.
  #[inline(always)]
  pub fn get(&self, index: usize) -> u32 {
    Self::check_index(index);
    let epw = self.version.entries_per_word();
    if epw == 0 {
      return 0;
    }
    let bits = self.version.bits() as usize;
    (self.words[index / epw] >> ((index % epw) * bits)) & self.version.max_index()
  }

  /// Stores a dictionary index at the given cell.
  ///
  /// # Panics
  /// If `index` is outside of `0..4096`, or `value` is too wide for this
  /// palette's version.
  #[inline(always)]
  pub fn set(&mut self, index: usize, value: u32) {
    Self::check_index(index);
    let max = self.version.max_index();
    assert!(value <= max, "value {value} does not fit in palette {} (max {max})", self.version);
    let epw = self.version.entries_per_word();
    if epw == 0 {
      return;
    }
    let shift = (index % epw) * self.version.bits() as usize;
    let w = &mut self.words[index / epw];
    *w &= !(max << shift);
    *w |= value << shift;
  }

  /// Sets every cell to the given value.
  pub fn fill(&mut self, value: u32) {
    for i in 0..SIZE {
      self.set(i, value);
    }
  }

  /// Re-encodes every cell into a new palette of the given version.
  ///
  /// # Panics
  /// If any stored value doesn't fit in the new version.
  pub fn resize(&self, version: PaletteVersion) -> Palette {
    let mut new = Palette::new(version);
    if self.version != PaletteVersion::V0 {
      for i in 0..SIZE {
        new.set(i, self.get(i));
      }
    }
    new
  }

  /// Returns true if every word is zero, which means every cell points at the
  /// first dictionary entry.
  pub fn is_zero(&self) -> bool { self.words.iter().all(|w| *w == 0) }
}
