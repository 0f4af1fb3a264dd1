//! Bedrock chunk encoding. A Java chunk column is turned into a list of
//! [`ChunkSection`]s, then written out with its biomes and block entities as a
//! single `LevelChunk` payload.

mod biome;
mod column;
mod palette;
mod section;
mod storage;

pub use biome::{encode_biomes, CARRY_PREVIOUS_BIOME, EMPTY_BIOME_DATA};
pub use column::{Column, ColumnAssembler};
pub use palette::{Palette, PaletteVersion, SIZE};
pub use section::{ChunkSection, SECTION_VERSION};
pub use storage::BlockStorage;

use std::{fmt, str::FromStr};

/// The lowest block the client accepts in an overworld with extended height.
pub const MIN_HEIGHT_OVERWORLD: i32 = -64;
/// One above the highest block the client accepts in an overworld with
/// extended height.
pub const MAX_HEIGHT_OVERWORLD: i32 = 320;
/// The lowest block the client accepts in every other dimension.
pub const MIN_HEIGHT: i32 = 0;
/// One above the highest block the client accepts in every other dimension.
pub const MAX_HEIGHT: i32 = 256;

/// The range of sections the client will accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionBounds {
  /// The section Y of the lowest section.
  pub min_section: i32,
  /// The number of sections.
  pub sections:    usize,
}

impl DimensionBounds {
  /// Returns the bounds of the overworld with extended height, or the bounds
  /// of every other dimension.
  pub const fn new(extended_height: bool) -> Self {
    let (min, max) = if extended_height {
      (MIN_HEIGHT_OVERWORLD, MAX_HEIGHT_OVERWORLD)
    } else {
      (MIN_HEIGHT, MAX_HEIGHT)
    };
    DimensionBounds { min_section: min >> 4, sections: ((max - min) >> 4) as usize }
  }
}

/// The Bedrock protocol version that chunks are written for. The only
/// difference is how many biome sections the client expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetVersion {
  V1_17_10,
  V1_18_0,
}

impl TargetVersion {
  /// The number of biome sections the client always reads.
  pub const fn biome_sections(self) -> usize {
    match self {
      Self::V1_17_10 => 32,
      Self::V1_18_0 => 25,
    }
  }
}

impl fmt::Display for TargetVersion {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::V1_17_10 => write!(f, "1.17.10"),
      Self::V1_18_0 => write!(f, "1.18.0"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidVersion(pub String);

impl fmt::Display for InvalidVersion {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "unknown bedrock version `{}`", self.0)
  }
}

impl std::error::Error for InvalidVersion {}

impl FromStr for TargetVersion {
  type Err = InvalidVersion;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "1.17.10" => Ok(Self::V1_17_10),
      "1.18.0" | "1.18" => Ok(Self::V1_18_0),
      _ => Err(InvalidVersion(s.into())),
    }
  }
}
