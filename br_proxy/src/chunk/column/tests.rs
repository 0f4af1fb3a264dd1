use super::*;
use crate::{conv::Mappings, packet::Packet};
use br_common::{
  chunk::{BlockEntityInfo, ContainerKind, GLOBAL_BLOCK_BITS},
  math::{ChunkPos, SectionRelPos},
  nbt::Tag,
};
use pretty_assertions::assert_eq;

const AIR: u32 = 1;
const WATER: u32 = 2;

/// Java block `j` becomes `1000 + j`, except for air. Java block 3 is
/// waterlogged, and Java block 4 is a flower pot.
fn conv() -> Arc<TypeConverter> {
  Arc::new(TypeConverter::new(Mappings {
    air: AIR,
    water: WATER,
    blocks: (0..300).map(|j| if j == 0 { AIR } else { 1000 + j }).collect(),
    waterlogged: vec![3],
    biomes: [(0, 0), (1, 5)].into_iter().collect(),
    default_biome: 0,
    block_entities: [(7, "Chest".to_string())].into_iter().collect(),
    bedrock_only: [(4, "FlowerPot".to_string())].into_iter().collect(),
  }))
}

fn assembler(version: TargetVersion, extended_height: bool) -> ColumnAssembler {
  ColumnAssembler::new(conv(), BufferPool::new(4), version, extended_height)
}

fn filled(java: u32, biome: u32) -> SourceSection {
  SourceSection::new(4096, PalettedContainer::Single(java), PalettedContainer::Single(biome))
}
fn empty() -> SourceSection { SourceSection::empty(0, 0) }

fn column(min_section: i32, sections: Vec<SourceSection>) -> SourceChunk {
  SourceChunk::new(ChunkPos::new(0, 0), min_section, sections, vec![])
}

fn repeat(bytes: &[u8], n: usize) -> Vec<u8> { bytes.repeat(n) }

#[test]
fn trailing_sections_are_trimmed() {
  let mut sections: Vec<_> = (0..24).map(|_| empty()).collect();
  sections[0] = filled(1, 0);
  sections[2] = filled(1, 0);
  let col = assembler(TargetVersion::V1_18_0, true).assemble(&column(-4, sections)).unwrap();

  assert_eq!(col.sections.len(), 3);
  assert!(col.sections[1].is_none());
  assert_eq!(col.packet.sub_chunk_count, 3);

  let mut expected = vec![9, 1, 0xfc, 1, 1, 0xe9, 0x07];
  expected.extend([9, 0, 0xfd]);
  expected.extend([9, 1, 0xfe, 1, 1, 0xe9, 0x07]);
  expected.extend(repeat(&EMPTY_BIOME_DATA, 24));
  expected.push(CARRY_PREVIOUS_BIOME);
  expected.extend([0, 0]);
  assert_eq!(col.packet.data, expected);
}

#[test]
fn sections_below_the_world_are_skipped() {
  let mut sections: Vec<_> = (0..24).map(|_| empty()).collect();
  for s in &mut sections[..4] {
    *s = filled(1, 0);
  }
  sections[4] = filled(2, 1);
  let col = assembler(TargetVersion::V1_17_10, false).assemble(&column(-4, sections)).unwrap();

  assert_eq!(col.sections.len(), 1);
  let section = col.sections[0].as_ref().unwrap();
  assert_eq!(section.sub_chunk_index(), 0);
  assert_eq!(section.get_full_block(0, 0, 0, 0), 1002);

  let mut expected = vec![9, 1, 0, 1, 1, 0xea, 0x07];
  expected.extend([1, 1, 5]);
  expected.extend(repeat(&EMPTY_BIOME_DATA, 31));
  expected.extend([0, 0]);
  assert_eq!(col.packet.data, expected);
}

#[test]
fn empty_column() {
  let sections = (0..16).map(|_| empty()).collect();
  let col = assembler(TargetVersion::V1_17_10, false).assemble(&column(0, sections)).unwrap();
  assert_eq!(col.sections, vec![]);
  assert_eq!(col.packet.sub_chunk_count, 0);
  let mut expected = repeat(&EMPTY_BIOME_DATA, 32);
  expected.extend([0, 0]);
  assert_eq!(col.packet.data, expected);
}

#[test]
fn air_sections_are_trimmed() {
  let sections = vec![filled(1, 0), filled(0, 0), empty()];
  let col = assembler(TargetVersion::V1_18_0, false).assemble(&column(0, sections)).unwrap();
  assert_eq!(col.sections.len(), 1);
}

#[test]
fn waterlogged_singleton() {
  let asm = assembler(TargetVersion::V1_18_0, true);
  let section = asm.translate_section(&filled(3, 0), ChunkPos::new(0, 0), 2, &mut vec![]).unwrap();
  let mut data = vec![];
  section.write_to_network(&mut Buffer::new(&mut data));
  assert_eq!(data, vec![9, 2, 2, 1, 1, 0xeb, 0x07, 1, 1, WATER as u8]);
}

#[test]
fn indirect_with_water() {
  let mut values = vec![0; 4096];
  values[SectionRelPos::new(0, 0, 0).java_index()] = 3;
  values[SectionRelPos::new(1, 2, 3).java_index()] = 2;
  let blocks = PalettedContainer::from_values(&values, ContainerKind::blocks(GLOBAL_BLOCK_BITS));
  assert!(matches!(blocks, PalettedContainer::Indirect { .. }));
  let source = SourceSection::new(2, blocks, PalettedContainer::Single(0));

  let asm = assembler(TargetVersion::V1_18_0, true);
  let section = asm.translate_section(&source, ChunkPos::new(0, 0), 0, &mut vec![]).unwrap();
  assert_eq!(section.layers().len(), 2);
  let layer = &section.layers()[0];
  assert_eq!(layer.version(), PaletteVersion::V4);
  assert_eq!(layer.dictionary(), vec![1003, AIR, 1002]);
  assert_eq!(section.get_full_block(0, 0, 0, 0), 1003);
  assert_eq!(section.get_full_block(1, 2, 3, 0), 1002);
  assert_eq!(section.get_full_block(3, 2, 1, 0), AIR);
  assert_eq!(section.get_full_block(15, 15, 15, 0), AIR);

  let water = &section.layers()[1];
  assert_eq!(water.version(), PaletteVersion::V1);
  assert_eq!(water.dictionary(), vec![AIR, WATER]);
  assert_eq!(water.non_default_cells(), 1);
  assert_eq!(section.get_full_block(0, 0, 0, 1), WATER);
  assert_eq!(section.get_full_block(1, 2, 3, 1), AIR);
}

#[test]
fn global_section() {
  let values: Vec<u32> = (0..4096).map(|i| i % 300).collect();
  let blocks = PalettedContainer::from_values(&values, ContainerKind::blocks(GLOBAL_BLOCK_BITS));
  assert!(matches!(blocks, PalettedContainer::Global(_)));
  let source = SourceSection::new(4000, blocks, PalettedContainer::Single(0));

  let asm = assembler(TargetVersion::V1_18_0, true);
  let mut tags = vec![];
  let section = asm.translate_section(&source, ChunkPos::new(0, 0), 0, &mut tags).unwrap();
  assert_eq!(section.layers().len(), 2);
  for i in (0..4096).step_by(37) {
    let p = SectionRelPos::from_bedrock_index(i);
    let java = values[p.java_index()];
    assert_eq!(section.get_full_block(p.x(), p.y(), p.z(), 0), asm.conv().block(java));
    let water = if java == 3 { WATER } else { AIR };
    assert_eq!(section.get_full_block(p.x(), p.y(), p.z(), 1), water);
  }
  // Every flower pot gets a block entity.
  assert_eq!(tags.len(), values.iter().filter(|v| **v == 4).count());

  let chunk = column(0, vec![source]);
  let (sections, bedrock_only) = asm.build_sections(&chunk);
  let col = asm.assemble(&chunk).unwrap();
  assert!(asm.estimate_size(&chunk, &sections, &bedrock_only) >= col.packet.data.len());
}

#[test]
fn block_entities_follow_the_trailer() {
  let info = BlockEntityInfo {
    x:    1,
    y:    5,
    z:    2,
    kind: Some(7),
    nbt:  Some(Tag::compound(&[("Lock", Tag::String("".into()))])),
  };
  let unknown = BlockEntityInfo { x: 0, y: 0, z: 0, kind: None, nbt: None };
  let mut sections: Vec<_> = (0..16).map(|_| empty()).collect();
  sections[0] = filled(1, 0);
  let pos = ChunkPos::new(1, 0);
  let chunk = SourceChunk::new(pos, 0, sections, vec![info.clone(), unknown]);

  let asm = assembler(TargetVersion::V1_18_0, false);
  let col = asm.assemble(&chunk).unwrap();
  let nbt = NBT::new("", asm.conv().block_entity_tag(pos, &info).unwrap()).serialize_network();

  let data = &col.packet.data;
  assert!(data.ends_with(&nbt));
  let before = &data[..data.len() - nbt.len()];
  let mut expected = vec![CARRY_PREVIOUS_BIOME; 9];
  expected.extend([0, 0]);
  assert!(before.ends_with(&expected));
  assert_eq!(col.packet.pos, pos);
}

#[test]
fn buffer_goes_back_to_the_pool() {
  let pool = BufferPool::new(4);
  let asm = ColumnAssembler::new(conv(), pool.clone(), TargetVersion::V1_18_0, true);
  asm.assemble(&column(-4, vec![filled(1, 0)])).unwrap();
  assert_eq!(pool.free(), 1);
  asm.assemble(&column(-4, vec![filled(1, 0)])).unwrap();
  assert_eq!(pool.free(), 1);
}

#[test]
fn send_to_channel() {
  let asm = assembler(TargetVersion::V1_18_0, true);
  let chunk = column(-4, vec![filled(1, 0), filled(2, 0)]);
  let (tx, rx) = crossbeam_channel::unbounded::<Packet>();
  let sections = asm.send(&chunk, &tx).unwrap();
  assert_eq!(sections.len(), 2);
  let expected = asm.assemble(&chunk).unwrap().packet;
  assert_eq!(rx.try_recv(), Ok(Packet::LevelChunk(expected)));
}

#[test]
fn switching_dimensions() {
  let mut asm = assembler(TargetVersion::V1_18_0, true);
  let chunk = column(0, vec![filled(1, 0)]);
  assert_eq!(asm.build_sections(&chunk).0.len(), 5);
  asm.set_extended_height(false);
  assert_eq!(asm.build_sections(&chunk).0.len(), 1);
  assert_eq!(asm.bounds().sections, 16);
}

#[test]
fn biomes_follow_blocks_into_a_taller_world() {
  // A 0 to 256 world, sent with extended height. Source section 12 lands at
  // target index 16.
  let mut sections: Vec<_> = (0..16).map(|_| empty()).collect();
  sections[12] = filled(1, 1);
  let col = assembler(TargetVersion::V1_18_0, true).assemble(&column(0, sections)).unwrap();
  assert_eq!(col.packet.sub_chunk_count, 17);

  let mut expected = vec![];
  for index in -4..12_i8 {
    expected.extend([9, 0, index as u8]);
  }
  expected.extend([9, 1, 12, 1, 1, 0xe9, 0x07]);
  // Below the source world, then source sections 0 to 11.
  expected.extend(repeat(&EMPTY_BIOME_DATA, 16));
  expected.extend([1, 1, 5]);
  // Source sections 13 to 15, then above the source world.
  expected.extend(repeat(&EMPTY_BIOME_DATA, 7));
  expected.push(CARRY_PREVIOUS_BIOME);
  expected.extend([0, 0]);
  assert_eq!(col.packet.data, expected);
}

#[test]
fn biomes_above_a_shorter_world_are_not_sent() {
  // A -64 to 320 world, sent without extended height. Source sections 20 to
  // 23 would land at target 16 to 19, which the client doesn't have.
  let sections: Vec<_> = (0..24).map(|_| filled(1, 1)).collect();
  let chunk = column(-4, sections);

  let mut blocks = vec![];
  for index in 0..16_u8 {
    blocks.extend([9, 1, index, 1, 1, 0xe9, 0x07]);
  }

  let col = assembler(TargetVersion::V1_17_10, false).assemble(&chunk).unwrap();
  let mut expected = blocks.clone();
  expected.extend(repeat(&[1, 1, 5], 16));
  expected.extend(repeat(&EMPTY_BIOME_DATA, 16));
  expected.extend([0, 0]);
  assert_eq!(col.packet.data, expected);

  let col = assembler(TargetVersion::V1_18_0, false).assemble(&chunk).unwrap();
  let mut expected = blocks;
  expected.extend(repeat(&[1, 1, 5], 16));
  expected.extend([CARRY_PREVIOUS_BIOME; 9]);
  expected.extend([0, 0]);
  assert_eq!(col.packet.data, expected);
}

#[test]
fn bedrock_only_block_entities() {
  let kind = ContainerKind::blocks(GLOBAL_BLOCK_BITS);
  let mut values = vec![0; 4096];
  values[SectionRelPos::new(1, 2, 3).java_index()] = 4;
  let indirect = PalettedContainer::from_values(&values, kind);
  assert!(matches!(indirect, PalettedContainer::Indirect { .. }));
  let global: Vec<u32> = (0..4096).map(|i| i % 300).collect();
  let global = PalettedContainer::from_values(&global, kind);
  assert!(matches!(global, PalettedContainer::Global(_)));

  let pos = ChunkPos::new(2, -1);
  let server = BlockEntityInfo { x: 0, y: 0, z: 0, kind: Some(7), nbt: None };
  let chunk = SourceChunk::new(
    pos,
    0,
    vec![
      // A whole section of flower pots is left alone.
      filled(4, 0),
      SourceSection::new(1, indirect, PalettedContainer::Single(0)),
      SourceSection::new(4096, global, PalettedContainer::Single(0)),
    ],
    vec![server.clone()],
  );

  let asm = assembler(TargetVersion::V1_18_0, false);
  let (_, tags) = asm.build_sections(&chunk);
  // Java index `i` is a flower pot when `i % 300 == 4`.
  assert_eq!(tags.len(), 1 + 14);
  let conv = asm.conv();
  assert_eq!(tags[0], conv.bedrock_only_tag(4, 32 + 1, 16 + 2, -16 + 3).unwrap());
  assert_eq!(tags[1], conv.bedrock_only_tag(4, 32 + 4, 32, -16).unwrap());
  // Java index 304 is x 0, z 3, y 1.
  assert_eq!(tags[2], conv.bedrock_only_tag(4, 32, 33, -16 + 3).unwrap());

  // They come after the ones the server sent.
  let mut nbt = NBT::new("", conv.block_entity_tag(pos, &server).unwrap()).serialize_network();
  for tag in &tags {
    nbt.extend(NBT::new("", tag.clone()).serialize_network());
  }
  let col = asm.assemble(&chunk).unwrap();
  assert!(col.packet.data.ends_with(&nbt));
}
