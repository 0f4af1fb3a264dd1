//! Converts Java's 4x4x4 biome sections into Bedrock's full resolution biome
//! storages.

use super::{
  palette::{Palette, PaletteVersion},
  storage::BlockStorage,
};
use crate::conv::TypeConverter;
use br_common::{
  chunk::{PalettedContainer, SourceSection},
  math::SectionRelPos,
};

/// A biome storage where every cell is biome 0. This is the singleton
/// encoding: a `V0` header, then a one entry dictionary.
pub const EMPTY_BIOME_DATA: [u8; 3] = [PaletteVersion::V0.header(true), 1, 0];

/// Tells the client to reuse the biomes of the section below. Only 1.18 and
/// up understands this.
pub const CARRY_PREVIOUS_BIOME: u8 = (127 << 1) | 1;

/// The number of quarter cells in a section.
const QUARTERS: usize = 64;

/// Converts the biomes of a Java section into a Bedrock storage.
///
/// If every cell ends up as the same Bedrock biome, this always produces the
/// singleton encoding, no matter how the server encoded the section.
pub fn encode_biomes(section: &SourceSection, conv: &TypeConverter) -> BlockStorage {
  let biomes = section.biomes();
  if let PalettedContainer::Single(id) = biomes {
    return BlockStorage::singleton(0, conv.biome(*id));
  }

  let mut translated = [0; QUARTERS];
  for (i, v) in translated.iter_mut().enumerate() {
    *v = conv.biome(biomes.get(i));
  }
  if translated.iter().all(|v| *v == translated[0]) {
    return BlockStorage::singleton(0, translated[0]);
  }

  match biomes {
    PalettedContainer::Indirect { palette, data } => {
      // The palette can be converted directly, so the storage never resizes.
      let version = PaletteVersion::for_bits_ceil(data.bits()).unwrap_or(PaletteVersion::V16);
      let capacity = version.max_index() as usize + 1;
      let dictionary: Vec<u32> =
        palette.iter().take(capacity).map(|id| conv.biome(*id)).collect();
      let mut out = Palette::new(version);
      for i in 0..QUARTERS {
        let mut idx = data.get(i);
        if idx as usize >= dictionary.len() {
          idx = 0;
        }
        upsample(i, |index| out.set(index, idx));
      }
      BlockStorage::from_parts(0, out, dictionary)
    }
    _ => {
      let storage = BlockStorage::new(0);
      for (i, biome) in translated.iter().enumerate() {
        upsample(i, |index| storage.set_full_block(index, *biome));
      }
      storage
    }
  }
}

/// Calls `set` with the flat index of all 64 cells covered by the given
/// quarter cell.
fn upsample(quarter: usize, mut set: impl FnMut(usize)) {
  let qx = (quarter & 3) as u8;
  let qz = ((quarter >> 2) & 3) as u8;
  let qy = ((quarter >> 4) & 3) as u8;
  for x in qx << 2..(qx << 2) + 4 {
    for z in qz << 2..(qz << 2) + 4 {
      for y in qy << 2..(qy << 2) + 4 {
        set(SectionRelPos::new(x, y, z).bedrock_index());
      }
    }
  }
}
