use super::{BitStorage, InvalidLength};
use crate::math::WyHashBuilder;
use std::collections::HashMap;

/// Describes how a paletted container picks its encoding. Block containers
/// and biome containers use different bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerKind {
  /// The number of values in the container.
  pub len:          usize,
  /// Indirect palettes never use fewer bits than this.
  pub min_indirect: u8,
  /// Anything wider than this uses global ids directly.
  pub max_indirect: u8,
  /// The bits per entry used for global ids.
  pub global_bits:  u8,
}

/// The bits needed for every block state id in 1.18.
pub const GLOBAL_BLOCK_BITS: u8 = 15;
/// The bits needed for every biome id in 1.18.
pub const GLOBAL_BIOME_BITS: u8 = 6;

impl ContainerKind {
  /// Block states in a 16x16x16 section.
  pub const fn blocks(global_bits: u8) -> Self {
    ContainerKind { len: 4096, min_indirect: 4, max_indirect: 8, global_bits }
  }
  /// Biomes in a 4x4x4 section.
  pub const fn biomes(global_bits: u8) -> Self {
    ContainerKind { len: 64, min_indirect: 1, max_indirect: 3, global_bits }
  }

  /// Returns the bits per entry for an indirect palette that was sent with
  /// the given bits.
  fn indirect_bits(&self, bits: u8) -> u8 { bits.max(self.min_indirect) }
}

/// A Java edition paletted container. This is how both block states and
/// biomes are stored in a chunk section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PalettedContainer {
  /// Every value in the container is the same.
  Single(u32),
  /// The data is a list of indices into the palette.
  Indirect { palette: Vec<u32>, data: BitStorage },
  /// The data is global ids.
  Global(BitStorage),
}

impl PalettedContainer {
  /// Creates an indirect container from its parts.
  pub fn indirect(palette: Vec<u32>, data: BitStorage) -> Self {
    PalettedContainer::Indirect { palette, data }
  }

  /// Builds the smallest container that holds the given values, the same way
  /// the server picks one. `values` must be `kind.len` long.
  ///
  /// # Panics
  /// If `values` is the wrong length, or a value doesn't fit in the global
  /// bits.
  pub fn from_values(values: &[u32], kind: ContainerKind) -> Self {
    assert_eq!(values.len(), kind.len, "wrong number of values for container");
    let mut palette = vec![];
    let mut reverse = HashMap::with_hasher(WyHashBuilder);
    for &v in values {
      reverse.entry(v).or_insert_with(|| {
        palette.push(v);
        palette.len() as u32 - 1
      });
    }
    if palette.len() == 1 {
      return PalettedContainer::Single(palette[0]);
    }
    let needed = (32 - (palette.len() as u32 - 1).leading_zeros()) as u8;
    if needed <= kind.max_indirect {
      let mut data = BitStorage::new(kind.indirect_bits(needed), kind.len);
      for (i, v) in values.iter().enumerate() {
        data.set(i, reverse[v]);
      }
      PalettedContainer::Indirect { palette, data }
    } else {
      let mut data = BitStorage::new(kind.global_bits, kind.len);
      for (i, &v) in values.iter().enumerate() {
        data.set(i, v);
      }
      PalettedContainer::Global(data)
    }
  }

  /// Creates a container from the bits per entry read off the wire, and the
  /// raw long array. A single valued container ignores `longs`.
  pub fn from_parts(
    bits: u8,
    value_or_palette: Vec<u32>,
    longs: Vec<u64>,
    kind: ContainerKind,
  ) -> Result<Self, InvalidLength> {
    Ok(match bits {
      0 => PalettedContainer::Single(value_or_palette.first().copied().unwrap_or(0)),
      b if b <= kind.max_indirect => PalettedContainer::Indirect {
        palette: value_or_palette,
        data:    BitStorage::from_data(kind.indirect_bits(b), kind.len, longs)?,
      },
      _ => PalettedContainer::Global(BitStorage::from_data(kind.global_bits, kind.len, longs)?),
    })
  }

  /// Returns the global id at the given index. An index into a palette which
  /// is out of bounds returns 0, as the vanilla client does.
  pub fn get(&self, index: usize) -> u32 {
    match self {
      Self::Single(v) => *v,
      Self::Indirect { palette, data } => {
        palette.get(data.get(index) as usize).copied().unwrap_or(0)
      }
      Self::Global(data) => data.get(index),
    }
  }

  /// Returns the bits per entry of the backing storage. This is 0 for single
  /// valued containers.
  pub fn bits(&self) -> u8 {
    match self {
      Self::Single(_) => 0,
      Self::Indirect { data, .. } => data.bits(),
      Self::Global(data) => data.bits(),
    }
  }
}
