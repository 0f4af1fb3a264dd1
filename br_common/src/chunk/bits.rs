//! The packed long array used by Java edition chunk data, 1.16 and up.

use std::{error::Error, fmt};

/// A fixed length array of small unsigned values, packed into longs. Values
/// never span two longs. If `64 / bits` doesn't divide evenly, the top bits of
/// each long are left as padding.
///
/// Sections use this with a length of 4096, and biomes use it with a length
/// of 64.
#[derive(Clone, PartialEq, Eq)]
pub struct BitStorage {
  /// Bits per entry
  bits: u8,
  /// Number of entries
  len:  usize,
  /// The actual data
  data: Vec<u64>,
}

/// Returned from [`BitStorage::from_data`] when the long array is the wrong
/// size for the given bits and length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLength {
  pub bits:     u8,
  pub expected: usize,
  pub actual:   usize,
}

impl fmt::Display for InvalidLength {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(
      f,
      "expected {} longs for {} bits per entry, got {}",
      self.expected, self.bits, self.actual
    )
  }
}

impl Error for InvalidLength {}

impl fmt::Debug for BitStorage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "BitStorage {{")?;
    for v in &self.data {
      self.dbg_binary(f, *v)?;
    }
    writeln!(f, "}}")?;
    Ok(())
  }
}

impl BitStorage {
  /// Returns the number of longs needed to store `len` values with `bits`
  /// bits each.
  pub const fn longs_for(bits: u8, len: usize) -> usize {
    let per_long = 64 / bits as usize;
    (len + per_long - 1) / per_long
  }

  /// Creates a new bit storage, with all of the data set to 0.
  ///
  /// # Panics
  /// - If `bits` is 0, or larger than 32.
  pub fn new(bits: u8, len: usize) -> Self {
    assert!(bits > 0 && bits <= 32, "bits per entry of {} is invalid (must be 1..=32)", bits);
    BitStorage { bits, len, data: vec![0; Self::longs_for(bits, len)] }
  }

  /// Creates a bit storage from existing data. This is used to wrap data read
  /// off the network, so a mismatched length is an error instead of a panic.
  ///
  /// # Panics
  /// - If `bits` is 0, or larger than 32.
  pub fn from_data(bits: u8, len: usize, data: Vec<u64>) -> Result<Self, InvalidLength> {
    assert!(bits > 0 && bits <= 32, "bits per entry of {} is invalid (must be 1..=32)", bits);
    let expected = Self::longs_for(bits, len);
    if data.len() != expected {
      return Err(InvalidLength { bits, expected, actual: data.len() });
    }
    Ok(BitStorage { bits, len, data })
  }

  /// This is useful for debugging internal data; it will print out the number
  /// in binary format, with spaces inserted between every element.
  fn dbg_binary(&self, f: &mut fmt::Formatter, val: u64) -> fmt::Result {
    writeln!(
      f,
      "  {}",
      format!("{:064b}", val)
        .chars()
        .collect::<Vec<char>>()
        .rchunks(self.bits.into())
        .map(|arr| arr.iter().collect::<String>())
        .rev()
        .collect::<Vec<String>>()
        .join(" ")
    )
  }

  #[inline(always)]
  fn mask(&self) -> u64 { (1 << self.bits as u64) - 1 }

  /// Writes an element into the array.
  ///
  /// # Panics
  /// - If `index` is outside of `0..len`
  /// - If `value` is outside of `0..1 << bits`
  #[inline(always)]
  pub fn set(&mut self, index: usize, value: u32) {
    assert!(index < self.len, "index {} is too large (must be less than {})", index, self.len);
    assert!(
      u64::from(value) <= self.mask(),
      "value {} is too large for {} bits per entry",
      value,
      self.bits
    );
    let per_long = 64 / self.bits as usize;
    let shift = (index % per_long) * self.bits as usize;
    let mask = self.mask();
    let l = &mut self.data[index / per_long];
    *l &= !(mask << shift);
    *l |= u64::from(value) << shift;
  }

  /// Reads an element from the array. The returned value will always be within
  /// `0..1 << bits`.
  ///
  /// # Panics
  /// - If `index` is outside of `0..len`
  #[inline(always)]
  pub fn get(&self, index: usize) -> u32 {
    assert!(index < self.len, "index {} is too large (must be less than {})", index, self.len);
    let per_long = 64 / self.bits as usize;
    let shift = (index % per_long) * self.bits as usize;
    ((self.data[index / per_long] >> shift) & self.mask()) as u32
  }

  /// Returns an iterator over every value in this array, in index order.
  pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
    let per_long = 64 / self.bits as usize;
    let bits = self.bits as usize;
    let mask = self.mask();
    self
      .data
      .iter()
      .flat_map(move |l| (0..per_long).map(move |i| ((l >> (i * bits)) & mask) as u32))
      .take(self.len)
  }

  pub fn bits(&self) -> u8 { self.bits }
  pub fn len(&self) -> usize { self.len }
  pub fn is_empty(&self) -> bool { self.len == 0 }
  pub fn long_array(&self) -> &[u64] { &self.data }
  pub fn into_inner(self) -> Vec<u64> { self.data }
}
