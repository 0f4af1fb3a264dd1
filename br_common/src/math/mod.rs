//! Positions within the world, and a few small helpers that go with them.

mod chunk_pos;
mod rel_pos;

pub use chunk_pos::ChunkPos;
pub use rel_pos::{java_to_bedrock_index, SectionRelPos};

use std::hash::BuildHasher;
use wyhash::WyHash;

#[derive(Debug, Default, Clone, Copy)]
pub struct WyHashBuilder;

impl BuildHasher for WyHashBuilder {
  type Hasher = WyHash;

  fn build_hasher(&self) -> Self::Hasher {
    // Random number. This hashser should only be used when we don't care about DOS
    // situations.
    WyHash::with_seed(0xe6cc56f1f7550d95)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  #[test]
  fn wyhash_map() {
    let mut map = HashMap::with_hasher(WyHashBuilder);
    for i in 0..1000_u32 {
      map.insert(i, i * 2);
    }
    for i in 0..1000_u32 {
      assert_eq!(map.get(&i), Some(&(i * 2)));
    }
    assert_eq!(map.get(&1000), None);
  }
}
