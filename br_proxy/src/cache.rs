use crate::chunk::{ChunkSection, DimensionBounds};
use br_common::math::ChunkPos;
use parking_lot::RwLock;
use std::collections::HashMap;

/// The chunks a client has been sent. Columns are stored as deep copies, so
/// nothing done to the sections after they are cached can change what is in
/// here.
///
/// This can be shared between threads. Reads only take a read lock, so a
/// background thread can look up blocks while the session keeps sending
/// chunks.
#[derive(Debug)]
pub struct ChunkCache {
  air:     u32,
  bounds:  DimensionBounds,
  columns: RwLock<HashMap<ChunkPos, Vec<Option<ChunkSection>>>>,
}

impl ChunkCache {
  pub fn new(air: u32, bounds: DimensionBounds) -> Self {
    ChunkCache { air, bounds, columns: RwLock::new(HashMap::new()) }
  }

  /// Stores a copy of the given sections, replacing anything at that position.
  pub fn insert(&self, pos: ChunkPos, sections: &[Option<ChunkSection>]) {
    let copy = sections
      .iter()
      .map(|s| s.as_ref().map(|s| s.copy(s.sub_chunk_index())))
      .collect();
    self.columns.write().insert(pos, copy);
  }

  /// Returns the runtime id at the given absolute block position. Anything
  /// outside of a cached chunk is air.
  pub fn block_at(&self, x: i32, y: i32, z: i32) -> u32 {
    let pos = ChunkPos::of_block(x, z);
    let index = y.div_euclid(16) - self.bounds.min_section;
    let index = match usize::try_from(index) {
      Ok(i) => i,
      Err(_) => return self.air,
    };
    let columns = self.columns.read();
    match columns.get(&pos).and_then(|c| c.get(index)) {
      Some(Some(section)) => section.get_full_block(
        x.rem_euclid(16) as u8,
        y.rem_euclid(16) as u8,
        z.rem_euclid(16) as u8,
        0,
      ),
      _ => self.air,
    }
  }

  pub fn contains(&self, pos: ChunkPos) -> bool { self.columns.read().contains_key(&pos) }

  /// Removes a column. Returns true if the column was present.
  pub fn remove(&self, pos: ChunkPos) -> bool { self.columns.write().remove(&pos).is_some() }

  /// Drops every cached column. This happens when the client changes
  /// dimension.
  pub fn clear(&self) { self.columns.write().clear(); }

  pub fn len(&self) -> usize { self.columns.read().len() }
  pub fn is_empty(&self) -> bool { self.columns.read().is_empty() }
}
