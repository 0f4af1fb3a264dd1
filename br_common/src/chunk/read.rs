use super::{ContainerKind, PalettedContainer, SourceChunk, SourceSection};
use crate::{
  math::ChunkPos,
  util::{Buffer, BufferError, BufferErrorKind, Mode},
};

impl SourceChunk {
  /// Reads the section data of a Java 1.18 chunk packet. `data` is the byte
  /// array from the packet, which holds `section_count` sections, each of
  /// which is a block count, a block state container, and a biome container.
  ///
  /// Block entities are sent separately from this array, so the returned
  /// chunk has none.
  pub fn read(
    pos: ChunkPos,
    min_section: i32,
    section_count: usize,
    data: &[u8],
    blocks: ContainerKind,
    biomes: ContainerKind,
  ) -> Result<SourceChunk, BufferError> {
    let mut buf = Buffer::new(data);
    let mut sections = Vec::with_capacity(section_count);
    for _ in 0..section_count {
      let count = buf.read_i16()?;
      let block_count = u16::try_from(count).map_err(|_| {
        buf.err(BufferErrorKind::Invalid(format!("negative block count {count}")), Mode::Reading)
      })?;
      let blocks = read_container(&mut buf, blocks)?;
      let biomes = read_container(&mut buf, biomes)?;
      sections.push(SourceSection::new(block_count, blocks, biomes));
    }
    if buf.remaining() != 0 {
      debug!("{} bytes left over after reading chunk {}", buf.remaining(), pos);
    }
    Ok(SourceChunk::new(pos, min_section, sections, vec![]))
  }
}

fn read_container(
  buf: &mut Buffer<&[u8]>,
  kind: ContainerKind,
) -> Result<PalettedContainer, BufferError> {
  let bits = buf.read_u8()?;
  let values = match bits {
    0 => vec![buf.read_varint()? as u32],
    b if b <= kind.max_indirect => {
      buf.read_list_max(|buf| Ok(buf.read_varint()? as u32), 1 << kind.max_indirect)?
    }
    _ => vec![],
  };
  let len = buf.read_len(kind.len)?;
  let mut longs = Vec::with_capacity(len);
  for _ in 0..len {
    longs.push(buf.read_u64()?);
  }
  PalettedContainer::from_parts(bits, values, longs, kind)
    .map_err(|e| buf.err(BufferErrorKind::Invalid(e.to_string()), Mode::Reading))
}
