//! The Java edition (1.18+) chunk model. This is what the server sends us, and
//! what gets translated into Bedrock sub chunks.

mod bits;
mod paletted;
mod read;

pub use bits::{BitStorage, InvalidLength};
pub use paletted::{ContainerKind, PalettedContainer, GLOBAL_BIOME_BITS, GLOBAL_BLOCK_BITS};

use crate::{
  math::{ChunkPos, SectionRelPos},
  nbt::Tag,
};

/// One 16x16x16 section of a Java chunk column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSection {
  /// The number of non-air blocks, as sent by the server. If this is 0, the
  /// section is treated as empty without looking at the blocks.
  block_count: u16,
  blocks:      PalettedContainer,
  /// Biomes, at a quarter of the resolution of the blocks (4x4x4).
  biomes:      PalettedContainer,
}

impl SourceSection {
  pub fn new(block_count: u16, blocks: PalettedContainer, biomes: PalettedContainer) -> Self {
    SourceSection { block_count, blocks, biomes }
  }
  /// A section of nothing but air, in a single biome.
  pub fn empty(air: u32, biome: u32) -> Self {
    SourceSection {
      block_count: 0,
      blocks:      PalettedContainer::Single(air),
      biomes:      PalettedContainer::Single(biome),
    }
  }

  pub fn block_count(&self) -> u16 { self.block_count }
  pub fn blocks(&self) -> &PalettedContainer { &self.blocks }
  pub fn biomes(&self) -> &PalettedContainer { &self.biomes }

  /// Returns the block state at the given position.
  pub fn block_at(&self, pos: SectionRelPos) -> u32 { self.blocks.get(pos.java_index()) }
  /// Returns the biome of the given quarter cell. Each coordinate must be
  /// within `0..4`.
  ///
  /// # Panics
  /// If any coordinate is outside of `0..4`.
  pub fn biome_at(&self, qx: u8, qy: u8, qz: u8) -> u32 {
    assert!(qx < 4 && qy < 4 && qz < 4, "quarter position {qx} {qy} {qz} is outside of 0..4");
    self.biomes.get((qy as usize) << 4 | (qz as usize) << 2 | qx as usize)
  }
}

/// A block entity, as sent in a Java chunk packet.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntityInfo {
  /// Chunk relative X, within `0..16`.
  pub x:    u8,
  /// Absolute Y.
  pub y:    i32,
  /// Chunk relative Z, within `0..16`.
  pub z:    u8,
  /// The block entity type. This is `None` when the server sent a type we
  /// don't know about.
  pub kind: Option<u32>,
  /// Extra data. The server leaves this out for block entities that have
  /// nothing to say.
  pub nbt:  Option<Tag>,
}

/// A Java chunk column. Sections are stored from the bottom up, starting at
/// `min_section`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceChunk {
  pos:            ChunkPos,
  min_section:    i32,
  sections:       Vec<SourceSection>,
  block_entities: Vec<BlockEntityInfo>,
}

impl SourceChunk {
  pub fn new(
    pos: ChunkPos,
    min_section: i32,
    sections: Vec<SourceSection>,
    block_entities: Vec<BlockEntityInfo>,
  ) -> Self {
    SourceChunk { pos, min_section, sections, block_entities }
  }

  /// Replaces the block entities of this chunk. These are sent separately
  /// from the section data, so [`read`](Self::read) never fills them in.
  pub fn with_block_entities(mut self, block_entities: Vec<BlockEntityInfo>) -> Self {
    self.block_entities = block_entities;
    self
  }

  pub fn pos(&self) -> ChunkPos { self.pos }
  /// The section index of the lowest section. This is -4 for a default
  /// overworld, and 0 for most other dimensions.
  pub fn min_section(&self) -> i32 { self.min_section }
  pub fn sections(&self) -> &[SourceSection] { &self.sections }
  pub fn block_entities(&self) -> &[BlockEntityInfo] { &self.block_entities }

  /// Returns the section at the given absolute section Y.
  pub fn section(&self, y: i32) -> Option<&SourceSection> {
    usize::try_from(y - self.min_section).ok().and_then(|i| self.sections.get(i))
  }

  /// Returns the block state at the given chunk relative X/Z, and absolute Y.
  /// Positions outside of this chunk return `None`.
  pub fn block_at(&self, x: u8, y: i32, z: u8) -> Option<u32> {
    if x >= 16 || z >= 16 {
      return None;
    }
    let section = self.section(y.div_euclid(16))?;
    Some(section.block_at(SectionRelPos::new(x, y.rem_euclid(16) as u8, z)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn chunk() -> SourceChunk {
    let mut values = vec![0; 4096];
    values[SectionRelPos::new(1, 2, 3).java_index()] = 9;
    let blocks = PalettedContainer::from_values(&values, ContainerKind::blocks(GLOBAL_BLOCK_BITS));
    SourceChunk::new(
      ChunkPos::new(3, -2),
      -4,
      vec![SourceSection::empty(0, 1), SourceSection::new(1, blocks, PalettedContainer::Single(1))],
      vec![],
    )
  }

  #[test]
  fn block_lookup() {
    let c = chunk();
    assert_eq!(c.block_at(1, -64 + 16 + 2, 3), Some(9));
    assert_eq!(c.block_at(1, -64 + 2, 3), Some(0));
    assert_eq!(c.block_at(1, -65, 3), None);
    assert_eq!(c.block_at(1, -64 + 32, 3), None);
    assert_eq!(c.block_at(16, 0, 0), None);
    assert!(c.section(-3).is_some());
    assert!(c.section(-5).is_none());
  }

  #[test]
  fn biome_lookup() {
    let values: Vec<u32> = (0..64).collect();
    let biomes = PalettedContainer::from_values(&values, ContainerKind::biomes(GLOBAL_BIOME_BITS));
    let s = SourceSection::new(0, PalettedContainer::Single(0), biomes);
    assert_eq!(s.biome_at(0, 0, 0), 0);
    assert_eq!(s.biome_at(1, 0, 0), 1);
    assert_eq!(s.biome_at(0, 0, 1), 4);
    assert_eq!(s.biome_at(0, 1, 0), 16);
    assert_eq!(s.biome_at(3, 3, 3), 63);
  }
}
