use super::storage::BlockStorage;
use br_common::{math::SectionRelPos, util::Buffer};
use smallvec::SmallVec;
use std::io::{Cursor, Write};

/// The sub chunk format version. Version 9 is the first one that includes
/// the sub chunk index.
pub const SECTION_VERSION: u8 = 9;

/// The bytes written before any layers: version, layer count and index.
const HEADER_SIZE: usize = 3;

/// A Bedrock sub chunk. Layer 0 holds blocks, and layer 1 (if present) holds
/// the water inside waterlogged blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSection {
  index:  i8,
  air:    u32,
  layers: SmallVec<[BlockStorage; 2]>,
}

impl ChunkSection {
  /// Creates a section with one empty layer.
  pub fn new(index: i8, air: u32) -> Self {
    ChunkSection { index, air, layers: smallvec![BlockStorage::new(air)] }
  }
  /// Creates a section with no layers. This is how sections that have nothing
  /// in them are sent.
  pub fn empty(index: i8, air: u32) -> Self { ChunkSection { index, air, layers: SmallVec::new() } }
  /// Creates a section from existing layers.
  ///
  /// # Panics
  /// If there are more than 2 layers.
  pub fn from_layers(index: i8, air: u32, layers: impl IntoIterator<Item = BlockStorage>) -> Self {
    let layers: SmallVec<[BlockStorage; 2]> = layers.into_iter().collect();
    assert!(layers.len() <= 2, "a sub chunk cannot have {} layers", layers.len());
    ChunkSection { index, air, layers }
  }

  /// The index of this section, counted in sections from the bottom of the
  /// world. Negative sections are below Y 0.
  pub fn sub_chunk_index(&self) -> i8 { self.index }
  pub fn layers(&self) -> &[BlockStorage] { &self.layers }

  fn flat_index(x: u8, y: u8, z: u8) -> usize { SectionRelPos::new(x, y, z).bedrock_index() }

  /// Returns the runtime id at the given position in the given layer. A layer
  /// that has not been created yet is all air.
  ///
  /// # Panics
  /// If any coordinate is outside of `0..16`, or the layer is not 0 or 1.
  pub fn get_full_block(&self, x: u8, y: u8, z: u8, layer: usize) -> u32 {
    assert!(layer < 2, "invalid layer {layer}");
    let index = Self::flat_index(x, y, z);
    match self.layers.get(layer) {
      Some(l) => l.get_full_block(index),
      None => self.air,
    }
  }

  /// Sets the runtime id at the given position in the given layer. Missing
  /// layers are created as needed.
  ///
  /// # Panics
  /// If any coordinate is outside of `0..16`, or the layer is not 0 or 1.
  pub fn set_full_block(&mut self, x: u8, y: u8, z: u8, layer: usize, runtime_id: u32) {
    assert!(layer < 2, "invalid layer {layer}");
    let index = Self::flat_index(x, y, z);
    while self.layers.len() <= layer {
      self.layers.push(BlockStorage::new(self.air));
    }
    self.layers[layer].set_full_block(index, runtime_id);
  }

  /// Returns the layer at the given index, creating it (and any layers below
  /// it) if needed.
  ///
  /// # Panics
  /// If the layer is not 0 or 1.
  pub fn layer(&mut self, layer: usize) -> &BlockStorage {
    assert!(layer < 2, "invalid layer {layer}");
    while self.layers.len() <= layer {
      self.layers.push(BlockStorage::new(self.air));
    }
    &self.layers[layer]
  }

  pub fn write_to_network<T>(&self, buf: &mut Buffer<T>)
  where
    Cursor<T>: Write,
  {
    buf.write_u8(SECTION_VERSION);
    buf.write_u8(self.layers.len() as u8);
    buf.write_i8(self.index);
    for layer in &self.layers {
      layer.write_to_network(buf);
    }
  }

  pub fn estimate_network_size(&self) -> usize {
    HEADER_SIZE + self.layers.iter().map(|l| l.estimate_network_size()).sum::<usize>()
  }

  /// Returns true if every layer is empty. A section with no layers is empty.
  pub fn is_empty(&self) -> bool { self.layers.iter().all(|l| l.is_empty()) }

  /// Makes a deep copy of this section, with a new index.
  pub fn copy(&self, index: i8) -> ChunkSection {
    ChunkSection { index, air: self.air, layers: self.layers.iter().map(|l| l.copy()).collect() }
  }
}
