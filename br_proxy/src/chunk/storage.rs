use super::palette::{Palette, PaletteVersion, SIZE};
use br_common::{math::WyHashBuilder, util::Buffer};
use parking_lot::Mutex;
use std::{
  collections::HashMap,
  io::{Cursor, Write},
  ptr,
};

/// One layer of a sub chunk. This maps each of the 4096 cells to a runtime
/// id, through a dictionary that only grows.
///
/// Everything is behind a lock, so that a cached section can be read from
/// another thread while the session keeps working.
#[derive(Debug)]
pub struct BlockStorage {
  /// The air id this storage was created with. This is only used to check
  /// for emptiness.
  air:   u32,
  inner: Mutex<Inner>,
}

#[derive(Debug, Clone)]
struct Inner {
  palette:    Palette,
  dictionary: Vec<u32>,
  // Maps runtime ids to dictionary indices. If the dictionary has duplicates,
  // this points at the first one.
  reverse:    HashMap<u32, u32, WyHashBuilder>,
}

impl Inner {
  fn new(palette: Palette, dictionary: Vec<u32>) -> Self {
    let mut reverse = HashMap::with_capacity_and_hasher(dictionary.len(), WyHashBuilder);
    for (i, id) in dictionary.iter().enumerate() {
      reverse.entry(*id).or_insert(i as u32);
    }
    Inner { palette, dictionary, reverse }
  }

  fn id_for(&mut self, runtime_id: u32) -> u32 {
    if let Some(&idx) = self.reverse.get(&runtime_id) {
      return idx;
    }
    let idx = self.dictionary.len() as u32;
    if idx > self.palette.version().max_index() {
      // At most 4096 different ids can be in use, and V16 holds 65536, so this
      // always has a next version.
      let next = match self.palette.version().next() {
        Some(v) => v,
        None => panic!("dictionary has {} entries, which is more than a sub chunk can use", idx),
      };
      trace!("dictionary has {} entries, resizing to {}", idx, next);
      self.palette = self.palette.resize(next);
    }
    self.dictionary.push(runtime_id);
    self.reverse.insert(runtime_id, idx);
    idx
  }
}

impl BlockStorage {
  /// Creates an empty storage, where every cell is `air`.
  pub fn new(air: u32) -> Self {
    BlockStorage::from_parts(air, Palette::new(PaletteVersion::V2), vec![air])
  }

  /// Creates a storage where every cell is `id`. This doesn't allocate any
  /// words until a second id is added.
  pub fn singleton(air: u32, id: u32) -> Self {
    BlockStorage::from_parts(air, Palette::new(PaletteVersion::V0), vec![id])
  }

  /// Creates a storage from an existing palette and dictionary. The dictionary
  /// may contain duplicates, which is what happens when two source ids map to
  /// the same runtime id.
  ///
  /// # Panics
  /// If the dictionary is empty.
  pub fn from_parts(air: u32, palette: Palette, dictionary: Vec<u32>) -> Self {
    assert!(!dictionary.is_empty(), "a block storage needs at least one dictionary entry");
    BlockStorage { air, inner: Mutex::new(Inner::new(palette, dictionary)) }
  }

  /// Returns the dictionary index for the given runtime id, adding it to the
  /// dictionary if needed. Adding an id may widen the palette.
  pub fn id_for(&self, runtime_id: u32) -> u32 { self.inner.lock().id_for(runtime_id) }

  /// Sets the cell at the given flat (XZY) index.
  ///
  /// # Panics
  /// If `index` is outside of `0..4096`.
  pub fn set_full_block(&self, index: usize, runtime_id: u32) {
    let mut inner = self.inner.lock();
    let idx = inner.id_for(runtime_id);
    inner.palette.set(index, idx);
  }

  /// Returns the runtime id of the cell at the given flat (XZY) index.
  ///
  /// # Panics
  /// If `index` is outside of `0..4096`.
  pub fn get_full_block(&self, index: usize) -> u32 {
    let inner = self.inner.lock();
    let idx = inner.palette.get(index) as usize;
    // Converted palettes may point past the end of the dictionary. The client
    // treats those as the first entry.
    inner.dictionary.get(idx).copied().unwrap_or(inner.dictionary[0])
  }

  /// Writes this storage in the network format: a header byte, the packed
  /// words in little endian, then the dictionary.
  pub fn write_to_network<T>(&self, buf: &mut Buffer<T>)
  where
    Cursor<T>: Write,
  {
    let inner = self.inner.lock();
    buf.write_u8(inner.palette.version().header(true));
    for w in inner.palette.words() {
      buf.write_u32_le(*w);
    }
    buf.write_varuint(inner.dictionary.len() as u32);
    for id in &inner.dictionary {
      buf.write_varuint(*id);
    }
  }

  /// Returns an upper bound (for any reasonable runtime id) of the number of
  /// bytes [`write_to_network`](Self::write_to_network) will write. Runtime
  /// ids are assumed to fit in 3 varint bytes.
  pub fn estimate_network_size(&self) -> usize {
    let inner = self.inner.lock();
    1 + inner.palette.words().len() * 4 + 3 + inner.dictionary.len() * 3
  }

  /// Returns true if every cell is air.
  pub fn is_empty(&self) -> bool {
    let inner = self.inner.lock();
    inner.palette.is_zero() && inner.dictionary[0] == self.air
  }

  /// Makes a deep copy of this storage. Nothing is shared with the original.
  pub fn copy(&self) -> BlockStorage {
    BlockStorage { air: self.air, inner: Mutex::new(self.inner.lock().clone()) }
  }

  pub fn air(&self) -> u32 { self.air }
  pub fn version(&self) -> PaletteVersion { self.inner.lock().palette.version() }
  /// Returns a copy of the dictionary, in insertion order.
  pub fn dictionary(&self) -> Vec<u32> { self.inner.lock().dictionary.clone() }
  /// Returns the number of cells set to something other than the first
  /// dictionary entry.
  pub fn non_default_cells(&self) -> usize {
    let inner = self.inner.lock();
    (0..SIZE).filter(|i| inner.palette.get(*i) != 0).count()
  }
}

impl Clone for BlockStorage {
  fn clone(&self) -> Self { self.copy() }
}

impl PartialEq for BlockStorage {
  fn eq(&self, other: &Self) -> bool {
    if ptr::eq(self, other) {
      return true;
    }
    // Both locks are always taken in address order, so `a == b` and `b == a`
    // on two threads can't deadlock.
    let (first, second) = if ptr::addr_of!(*self) < ptr::addr_of!(*other) {
      (self, other)
    } else {
      (other, self)
    };
    let a = first.inner.lock();
    let b = second.inner.lock();
    self.air == other.air && a.palette == b.palette && a.dictionary == b.dictionary
  }
}
