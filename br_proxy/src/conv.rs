//! Lookups from Java ids to Bedrock ids. These are built once at startup, and
//! shared between every session.

use crate::Result;
use br_common::{
  chunk::BlockEntityInfo,
  math::{ChunkPos, WyHashBuilder},
  nbt::Tag,
};
use serde::Deserialize;
use std::{
  collections::{HashMap, HashSet},
  fs,
};

/// The mappings file, as stored on disk. Every table is indexed by Java id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Mappings {
  /// The Bedrock runtime id of air.
  pub air:            u32,
  /// The Bedrock runtime id of still water.
  pub water:          u32,
  /// Java block state id to Bedrock runtime id.
  pub blocks:         Vec<u32>,
  /// Java block states that have water in them.
  pub waterlogged:    Vec<u32>,
  /// Java biome id to Bedrock biome id.
  pub biomes:         HashMap<u32, u32>,
  /// Used for any Java biome missing from `biomes`.
  pub default_biome:  u32,
  /// Java block entity type to Bedrock block entity id.
  pub block_entities: HashMap<u32, String>,
  /// Java block states that are plain blocks in Java, but need a block
  /// entity in Bedrock (flower pots and pistons), to that block entity's id.
  pub bedrock_only:   HashMap<u32, String>,
}

/// Converts Java block states, biomes and block entities into their Bedrock
/// equivalents. Unknown ids never fail: blocks fall back to air, and biomes
/// fall back to the default biome.
#[derive(Debug, Clone)]
pub struct TypeConverter {
  air:            u32,
  water:          u32,
  blocks:         Vec<u32>,
  waterlogged:    HashSet<u32, WyHashBuilder>,
  biomes:         HashMap<u32, u32, WyHashBuilder>,
  default_biome:  u32,
  block_entities: HashMap<u32, String, WyHashBuilder>,
  bedrock_only:   HashMap<u32, String, WyHashBuilder>,
}

impl TypeConverter {
  pub fn new(mappings: Mappings) -> Self {
    TypeConverter {
      air:            mappings.air,
      water:          mappings.water,
      blocks:         mappings.blocks,
      waterlogged:    mappings.waterlogged.into_iter().collect(),
      biomes:         mappings.biomes.into_iter().collect(),
      default_biome:  mappings.default_biome,
      block_entities: mappings.block_entities.into_iter().collect(),
      bedrock_only:   mappings.bedrock_only.into_iter().collect(),
    }
  }

  /// Parses the given json mappings.
  pub fn from_json(src: &str) -> Result<Self> {
    let mappings: Mappings = serde_json::from_str(src)?;
    info!(
      "loaded {} block mappings and {} biome mappings",
      mappings.blocks.len(),
      mappings.biomes.len()
    );
    Ok(TypeConverter::new(mappings))
  }

  /// Reads and parses the mappings file at the given path.
  pub fn load(path: &str) -> Result<Self> {
    TypeConverter::from_json(&fs::read_to_string(path)?)
  }

  pub fn air(&self) -> u32 { self.air }
  pub fn water(&self) -> u32 { self.water }

  /// Returns the Bedrock runtime id for the given Java block state.
  #[inline]
  pub fn block(&self, java: u32) -> u32 {
    self.blocks.get(java as usize).copied().unwrap_or(self.air)
  }

  /// Returns true if the given Java block state is waterlogged.
  #[inline]
  pub fn is_waterlogged(&self, java: u32) -> bool { self.waterlogged.contains(&java) }

  /// Returns the Bedrock biome id for the given Java biome.
  #[inline]
  pub fn biome(&self, java: u32) -> u32 {
    self.biomes.get(&java).copied().unwrap_or(self.default_biome)
  }

  /// Returns true if the given Java block state needs a block entity that
  /// the server will never send.
  #[inline]
  pub fn is_bedrock_only(&self, java: u32) -> bool { self.bedrock_only.contains_key(&java) }

  /// Builds the block entity for a Bedrock only block at the given absolute
  /// position. Returns `None` if the block state doesn't need one.
  pub fn bedrock_only_tag(&self, java: u32, x: i32, y: i32, z: i32) -> Option<Tag> {
    let id = self.bedrock_only.get(&java)?;
    Some(Tag::compound(&[
      ("id", Tag::String(id.clone())),
      ("x", Tag::Int(x)),
      ("y", Tag::Int(y)),
      ("z", Tag::Int(z)),
      ("isMovable", Tag::Byte(1)),
    ]))
  }

  /// Builds the Bedrock tag for a block entity in the given chunk. Returns
  /// `None` for block entities that have no Bedrock equivalent.
  ///
  /// The position and id are always written first. Any data the server sent
  /// is copied after that.
  pub fn block_entity_tag(&self, chunk: ChunkPos, info: &BlockEntityInfo) -> Option<Tag> {
    let id = self.block_entities.get(&info.kind?)?;
    let mut tag = Tag::compound(&[
      ("id", Tag::String(id.clone())),
      ("x", Tag::Int(chunk.block_x() + i32::from(info.x))),
      ("y", Tag::Int(info.y)),
      ("z", Tag::Int(chunk.block_z() + i32::from(info.z))),
      ("isMovable", Tag::Byte(1)),
    ]);
    if let Some(Tag::Compound(extra)) = &info.nbt {
      for (name, value) in extra {
        if !matches!(name.as_str(), "id" | "x" | "y" | "z") {
          tag.insert(name, value.clone());
        }
      }
    }
    Some(tag)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  const JSON: &str = r#"{
    "air": 134,
    "water": 7,
    "blocks": [134, 1, 2, 3],
    "waterlogged": [3],
    "biomes": { "0": 10, "1": 11 },
    "default_biome": 1,
    "block_entities": { "2": "Chest" },
    "bedrock_only": { "1": "FlowerPot" }
  }"#;

  #[test]
  fn lookups() {
    let conv = TypeConverter::from_json(JSON).unwrap();
    assert_eq!(conv.block(0), 134);
    assert_eq!(conv.block(3), 3);
    assert_eq!(conv.block(10_000), 134);
    assert!(conv.is_waterlogged(3));
    assert!(!conv.is_waterlogged(2));
    assert_eq!(conv.biome(1), 11);
    assert_eq!(conv.biome(50), 1);
    assert_eq!(conv.water(), 7);
  }

  #[test]
  fn missing_tables() {
    let conv = TypeConverter::from_json(r#"{ "air": 5 }"#).unwrap();
    assert_eq!(conv.block(0), 5);
    assert_eq!(conv.biome(0), 0);
  }

  #[test]
  fn invalid_json() {
    assert!(matches!(TypeConverter::from_json("{ air: 5 }"), Err(crate::Error::Json(_))));
  }

  #[test]
  fn block_entities() {
    let conv = TypeConverter::from_json(JSON).unwrap();
    let mut info = BlockEntityInfo {
      x:    3,
      y:    -10,
      z:    15,
      kind: Some(2),
      nbt:  Some(Tag::compound(&[("x", Tag::Int(99)), ("CustomName", Tag::String("a".into()))])),
    };
    let tag = conv.block_entity_tag(ChunkPos::new(-1, 2), &info).unwrap();
    assert_eq!(
      tag,
      Tag::compound(&[
        ("id", Tag::String("Chest".into())),
        ("x", Tag::Int(-13)),
        ("y", Tag::Int(-10)),
        ("z", Tag::Int(47)),
        ("isMovable", Tag::Byte(1)),
        ("CustomName", Tag::String("a".into())),
      ])
    );

    assert!(conv.is_bedrock_only(1));
    assert!(!conv.is_bedrock_only(2));
    assert_eq!(
      conv.bedrock_only_tag(1, -5, 64, 20),
      Some(Tag::compound(&[
        ("id", Tag::String("FlowerPot".into())),
        ("x", Tag::Int(-5)),
        ("y", Tag::Int(64)),
        ("z", Tag::Int(20)),
        ("isMovable", Tag::Byte(1)),
      ]))
    );
    assert_eq!(conv.bedrock_only_tag(2, 0, 0, 0), None);

    info.kind = None;
    assert_eq!(conv.block_entity_tag(ChunkPos::new(0, 0), &info), None);
    info.kind = Some(1);
    assert_eq!(conv.block_entity_tag(ChunkPos::new(0, 0), &info), None);
  }
}
