use super::{
  biome::{encode_biomes, CARRY_PREVIOUS_BIOME, EMPTY_BIOME_DATA},
  palette::{Palette, PaletteVersion, SIZE},
  section::ChunkSection,
  storage::BlockStorage,
  DimensionBounds, TargetVersion,
};
use crate::{
  conv::TypeConverter,
  packet::{LevelChunk, PacketSink},
  Error, Result,
};
use br_common::{
  chunk::{PalettedContainer, SourceChunk, SourceSection},
  math::{java_to_bedrock_index, ChunkPos},
  nbt::{Tag, NBT},
  util::{Buffer, BufferPool},
};
use std::sync::Arc;

/// Bytes reserved for each block entity. Most are far smaller than this.
const BLOCK_ENTITY_ESTIMATE: usize = 64;
/// The border block count, and the extra data length.
const TRAILER_SIZE: usize = 2;
/// An empty section is just the version, layer count and index.
const EMPTY_SECTION_SIZE: usize = 3;

/// A translated chunk column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
  pub packet:   LevelChunk,
  /// The sections that were sent, from the bottom of the world up. Sections
  /// above the last non-empty one are not included.
  pub sections: Vec<Option<ChunkSection>>,
}

/// Turns Java chunk columns into `LevelChunk` packets. This holds no state
/// between columns, so one of these can be shared by every chunk a session
/// sends.
#[derive(Debug, Clone)]
pub struct ColumnAssembler {
  conv:    Arc<TypeConverter>,
  pool:    BufferPool,
  version: TargetVersion,
  bounds:  DimensionBounds,
}

impl ColumnAssembler {
  pub fn new(
    conv: Arc<TypeConverter>,
    pool: BufferPool,
    version: TargetVersion,
    extended_height: bool,
  ) -> Self {
    ColumnAssembler { conv, pool, version, bounds: DimensionBounds::new(extended_height) }
  }

  /// Switches between overworld and legacy world heights. This changes when
  /// the client changes dimension.
  pub fn set_extended_height(&mut self, extended_height: bool) {
    self.bounds = DimensionBounds::new(extended_height);
  }

  pub fn conv(&self) -> &Arc<TypeConverter> { &self.conv }
  pub fn version(&self) -> TargetVersion { self.version }
  pub fn bounds(&self) -> DimensionBounds { self.bounds }

  /// The number of sections between the bottom of the Java world and the
  /// bottom of the Bedrock world. Source section `s` is sent as section
  /// `s + offset`.
  fn offset(&self, chunk: &SourceChunk) -> i32 { chunk.min_section() - self.bounds.min_section }

  fn sub_chunk_index(&self, index: usize) -> i8 { (index as i32 + self.bounds.min_section) as i8 }

  /// Translates a single Java section, at section Y `section_y` of the
  /// column at `pos`. Returns `None` if the section has no blocks in it.
  ///
  /// Blocks that only have a block entity in Bedrock (flower pots and
  /// pistons) get their block entity generated and pushed onto
  /// `block_entities`. Singleton sections are skipped for this.
  pub fn translate_section(
    &self,
    section: &SourceSection,
    pos: ChunkPos,
    section_y: i32,
    block_entities: &mut Vec<Tag>,
  ) -> Option<ChunkSection> {
    if section.block_count() == 0 {
      return None;
    }
    let index = section_y as i8;
    let air = self.conv.air();
    // Absolute position of a Java (YZX) index in this section.
    let block_pos = |yzx: usize| {
      (
        pos.block_x() + (yzx & 0xf) as i32,
        section_y * 16 + ((yzx >> 8) & 0xf) as i32,
        pos.block_z() + ((yzx >> 4) & 0xf) as i32,
      )
    };
    let mut bedrock_only = |java: u32, yzx: usize| {
      let (x, y, z) = block_pos(yzx);
      block_entities.extend(self.conv.bedrock_only_tag(java, x, y, z));
    };
    match section.blocks() {
      PalettedContainer::Single(java) => {
        let mut layers = vec![BlockStorage::singleton(air, self.conv.block(*java))];
        if self.conv.is_waterlogged(*java) {
          layers.push(BlockStorage::singleton(air, self.conv.water()));
        }
        Some(ChunkSection::from_layers(index, air, layers))
      }
      PalettedContainer::Indirect { palette, data } => {
        if palette.is_empty() {
          warn!("indirect section {index} has an empty palette");
          return None;
        }
        // The palette is converted once, and then indices are copied over
        // directly.
        let version = PaletteVersion::for_bits_ceil(data.bits()).unwrap_or(PaletteVersion::V16);
        let palette = &palette[..palette.len().min(version.max_index() as usize + 1)];
        let dictionary: Vec<u32> = palette.iter().map(|id| self.conv.block(*id)).collect();
        let waterlogged: Vec<bool> =
          palette.iter().map(|id| self.conv.is_waterlogged(*id)).collect();
        let has_bedrock_only = palette.iter().any(|id| self.conv.is_bedrock_only(*id));
        let mut blocks = Palette::new(version);
        let mut water = waterlogged.contains(&true).then(|| Palette::new(PaletteVersion::V1));
        for yzx in 0..SIZE {
          let mut idx = data.get(yzx);
          if idx as usize >= dictionary.len() {
            idx = 0;
          }
          let xzy = java_to_bedrock_index(yzx);
          blocks.set(xzy, idx);
          if let Some(water) = &mut water {
            if waterlogged[idx as usize] {
              water.set(xzy, 1);
            }
          }
          if has_bedrock_only {
            bedrock_only(palette[idx as usize], yzx);
          }
        }
        let mut layers = vec![BlockStorage::from_parts(air, blocks, dictionary)];
        if let Some(water) = water {
          layers.push(BlockStorage::from_parts(air, water, vec![air, self.conv.water()]));
        }
        Some(ChunkSection::from_layers(index, air, layers))
      }
      PalettedContainer::Global(data) => {
        let blocks = BlockStorage::new(air);
        let mut water: Option<BlockStorage> = None;
        for (yzx, java) in data.iter().enumerate().take(SIZE) {
          let xzy = java_to_bedrock_index(yzx);
          blocks.set_full_block(xzy, self.conv.block(java));
          if self.conv.is_waterlogged(java) {
            let water = water.get_or_insert_with(|| BlockStorage::new(air));
            water.set_full_block(xzy, self.conv.water());
          }
          bedrock_only(java, yzx);
        }
        Some(ChunkSection::from_layers(index, air, std::iter::once(blocks).chain(water)))
      }
    }
  }

  /// Translates every section of the column that the client can see. Empty
  /// sections are `None`, and the list ends at the last non-empty section.
  ///
  /// Also returns the block entities generated for Bedrock only blocks.
  pub fn build_sections(&self, chunk: &SourceChunk) -> (Vec<Option<ChunkSection>>, Vec<Tag>) {
    let offset = self.offset(chunk);
    let mut sections: Vec<Option<ChunkSection>> = vec![None; self.bounds.sections];
    let mut block_entities = vec![];
    for (s, section) in chunk.sections().iter().enumerate() {
      let index = s as i32 + offset;
      if index < 0 || index as usize >= self.bounds.sections {
        continue;
      }
      let index = index as usize;
      let section_y = self.sub_chunk_index(index) as i32;
      sections[index] =
        self.translate_section(section, chunk.pos(), section_y, &mut block_entities);
    }
    while sections.last().map_or(false, is_empty) {
      sections.pop();
    }
    (sections, block_entities)
  }

  /// Translates the given column into a packet. The returned sections are
  /// the ones that were encoded into the packet.
  pub fn assemble(&self, chunk: &SourceChunk) -> Result<Column> {
    let (sections, bedrock_only) = self.build_sections(chunk);
    let data = self.encode(chunk, &sections, &bedrock_only)?;
    let packet = LevelChunk {
      pos: chunk.pos(),
      sub_chunk_count: sections.len() as u32,
      cache_enabled: false,
      data,
    };
    Ok(Column { packet, sections })
  }

  /// Assembles the column, and hands the packet to the given sink.
  pub fn send(
    &self,
    chunk: &SourceChunk,
    sink: &dyn PacketSink,
  ) -> Result<Vec<Option<ChunkSection>>> {
    let Column { packet, sections } = self.assemble(chunk)?;
    trace!("sending chunk {} with {} sub chunks", packet.pos, packet.sub_chunk_count);
    sink.send(packet.into());
    Ok(sections)
  }

  fn estimate_size(
    &self,
    chunk: &SourceChunk,
    sections: &[Option<ChunkSection>],
    bedrock_only: &[Tag],
  ) -> usize {
    let sections: usize = sections
      .iter()
      .map(|s| s.as_ref().map_or(EMPTY_SECTION_SIZE, ChunkSection::estimate_network_size))
      .sum();
    sections
      + self.version.biome_sections() * EMPTY_BIOME_DATA.len()
      + TRAILER_SIZE
      + (chunk.block_entities().len() + bedrock_only.len()) * BLOCK_ENTITY_ESTIMATE
  }

  fn encode(
    &self,
    chunk: &SourceChunk,
    sections: &[Option<ChunkSection>],
    bedrock_only: &[Tag],
  ) -> Result<Vec<u8>> {
    let pos = chunk.pos();
    let size = self.estimate_size(chunk, sections, bedrock_only);
    let mut data = self.pool.acquire();
    data.try_reserve(size).map_err(|err| Error::Alloc { pos, requested: size, err })?;
    let mut buf = Buffer::new(&mut *data);

    for (i, section) in sections.iter().enumerate() {
      match section {
        Some(s) => s.write_to_network(&mut buf),
        None => ChunkSection::empty(self.sub_chunk_index(i), self.conv.air())
          .write_to_network(&mut buf),
      }
    }

    // One biome section for every section in the client's world, then
    // padding up to the number of sections the client always reads.
    let offset = self.offset(chunk) as isize;
    let source = chunk.sections();
    for t in 0..self.version.biome_sections() {
      if t >= self.bounds.sections {
        match self.version {
          TargetVersion::V1_17_10 => buf.write_buf(&EMPTY_BIOME_DATA),
          TargetVersion::V1_18_0 => buf.write_u8(CARRY_PREVIOUS_BIOME),
        }
        continue;
      }
      let s = t as isize - offset;
      match usize::try_from(s).ok().and_then(|s| source.get(s)) {
        Some(section) => encode_biomes(section, &self.conv).write_to_network(&mut buf),
        None => buf.write_buf(&EMPTY_BIOME_DATA),
      }
    }

    // Border blocks, which only exist in education edition.
    buf.write_u8(0);
    // Extra data.
    buf.write_varuint(0);

    for info in chunk.block_entities() {
      match self.conv.block_entity_tag(pos, info) {
        Some(tag) => NBT::new("", tag).serialize_network_buf(&mut buf),
        None => trace!("skipping block entity {:?} in chunk {pos}", info.kind),
      }
    }
    for tag in bedrock_only {
      NBT::new("", tag.clone()).serialize_network_buf(&mut buf);
    }

    Ok(data.to_vec())
  }
}

fn is_empty(section: &Option<ChunkSection>) -> bool {
  section.as_ref().map_or(true, ChunkSection::is_empty)
}

#[cfg(test)]
mod tests;
