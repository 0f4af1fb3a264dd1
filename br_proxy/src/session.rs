//! The chunk side of a single client connection.

use crate::{
  batch::ChunkBatchSizeCalculator,
  cache::ChunkCache,
  chunk::ColumnAssembler,
  config::ProxyConfig,
  conv::TypeConverter,
  packet::PacketSink,
  Error, Result,
};
use br_common::{
  chunk::{BlockEntityInfo, ContainerKind, SourceChunk, GLOBAL_BIOME_BITS, GLOBAL_BLOCK_BITS},
  math::ChunkPos,
  util::BufferPool,
};
use std::{collections::VecDeque, sync::Arc};

/// Queues up the chunks the server sends to one client, and sends them out a
/// few at a time. How many chunks get sent every tick is decided by a
/// [`ChunkBatchSizeCalculator`], so that a slow machine doesn't spend a whole
/// tick encoding chunks.
///
/// This is only ever used from the session's own thread, so nothing in here
/// is locked. The [`ChunkCache`] is the exception, as it can be shared with
/// other threads through [`cache`](Self::cache).
pub struct ChunkSession<S> {
  assembler: ColumnAssembler,
  calc:      ChunkBatchSizeCalculator,
  pending:   VecDeque<SourceChunk>,
  cache:     Option<Arc<ChunkCache>>,
  sink:      S,
  blocks:    ContainerKind,
  biomes:    ContainerKind,
}

impl<S: PacketSink> ChunkSession<S> {
  /// Creates a new session. If `cache` is set, every chunk sent will be
  /// stored in a [`ChunkCache`].
  pub fn new(assembler: ColumnAssembler, sink: S, cache: bool) -> Self {
    let cache = cache.then(|| Arc::new(Self::new_cache(&assembler)));
    ChunkSession {
      assembler,
      calc: ChunkBatchSizeCalculator::new(),
      pending: VecDeque::new(),
      cache,
      sink,
      blocks: ContainerKind::blocks(GLOBAL_BLOCK_BITS),
      biomes: ContainerKind::biomes(GLOBAL_BIOME_BITS),
    }
  }

  /// Creates a session using the chunk settings from the config.
  pub fn from_config(
    config: &ProxyConfig,
    conv: Arc<TypeConverter>,
    pool: BufferPool,
    sink: S,
  ) -> Self {
    let assembler =
      ColumnAssembler::new(conv, pool, config.target_version, config.extended_height);
    ChunkSession::new(assembler, sink, config.cache)
  }

  fn new_cache(assembler: &ColumnAssembler) -> ChunkCache {
    ChunkCache::new(assembler.conv().air(), assembler.bounds())
  }

  /// Sets the number of bits the server uses for global block and biome ids.
  /// These depend on the size of the server's registries.
  pub fn set_global_bits(&mut self, block_bits: u8, biome_bits: u8) {
    self.blocks = ContainerKind::blocks(block_bits);
    self.biomes = ContainerKind::biomes(biome_bits);
  }

  /// Adds a chunk to the end of the queue.
  pub fn queue(&mut self, chunk: SourceChunk) { self.pending.push_back(chunk); }

  /// Parses the section data of a Java chunk packet, and queues it.
  pub fn queue_raw(
    &mut self,
    pos: ChunkPos,
    min_section: i32,
    section_count: usize,
    data: &[u8],
    block_entities: Vec<BlockEntityInfo>,
  ) -> Result<()> {
    let chunk = SourceChunk::read(pos, min_section, section_count, data, self.blocks, self.biomes)
      .map_err(|e| Error::InvalidChunk { pos, msg: e.to_string() })?;
    self.queue(chunk.with_block_entities(block_entities));
    Ok(())
  }

  /// Forgets about a chunk. Any queued copies of it will not be sent, and it
  /// is removed from the cache.
  pub fn unload(&mut self, pos: ChunkPos) {
    self.pending.retain(|c| c.pos() != pos);
    if let Some(cache) = &self.cache {
      cache.remove(pos);
    }
  }

  /// Called when the client switches dimension. Everything queued is for the
  /// old dimension, so it is all dropped.
  pub fn change_dimension(&mut self, extended_height: bool) {
    self.pending.clear();
    self.assembler.set_extended_height(extended_height);
    if self.cache.is_some() {
      self.cache = Some(Arc::new(Self::new_cache(&self.assembler)));
    }
  }

  /// Sends the next batch of chunks. Returns the number of chunks sent.
  ///
  /// A chunk that fails to encode is logged and skipped. The server will
  /// send it again if the client still needs it.
  pub fn tick(&mut self) -> usize {
    if self.pending.is_empty() {
      return 0;
    }
    let desired = self.calc.desired_chunks_per_tick().floor().max(1.0) as usize;
    self.calc.on_batch_start();
    let mut sent = 0;
    for _ in 0..desired {
      let chunk = match self.pending.pop_front() {
        Some(c) => c,
        None => break,
      };
      match self.assembler.send(&chunk, &self.sink) {
        Ok(sections) => {
          if let Some(cache) = &self.cache {
            cache.insert(chunk.pos(), &sections);
          }
          sent += 1;
        }
        Err(e) => error!("could not send chunk {}: {e}", chunk.pos()),
      }
    }
    self.calc.on_batch_finished(sent as u32);
    trace!("sent {sent} chunks, {} left", self.pending.len());
    sent
  }

  pub fn pending(&self) -> usize { self.pending.len() }
  pub fn cache(&self) -> Option<&Arc<ChunkCache>> { self.cache.as_ref() }
  pub fn calculator(&self) -> &ChunkBatchSizeCalculator { &self.calc }
  pub fn assembler(&self) -> &ColumnAssembler { &self.assembler }
  pub fn sink(&self) -> &S { &self.sink }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{chunk::TargetVersion, conv::Mappings, packet::Packet};
  use br_common::{
    chunk::{PalettedContainer, SourceSection},
    util::Buffer,
  };
  use crossbeam_channel::{Receiver, Sender};

  const AIR: u32 = 1;

  fn session(cache: bool) -> (ChunkSession<Sender<Packet>>, Receiver<Packet>) {
    let conv = Arc::new(TypeConverter::new(Mappings {
      air: AIR,
      blocks: vec![AIR, 20, 30],
      ..Default::default()
    }));
    let asm = ColumnAssembler::new(conv, BufferPool::new(4), TargetVersion::V1_18_0, true);
    let (tx, rx) = crossbeam_channel::unbounded();
    (ChunkSession::new(asm, tx, cache), rx)
  }

  fn chunk(x: i32) -> SourceChunk {
    let section =
      SourceSection::new(4096, PalettedContainer::Single(1), PalettedContainer::Single(0));
    SourceChunk::new(ChunkPos::new(x, 0), -4, vec![section], vec![])
  }

  fn received(rx: &Receiver<Packet>) -> Vec<i32> {
    rx.try_iter()
      .map(|p| match p {
        Packet::LevelChunk(c) => c.pos.x(),
      })
      .collect()
  }

  #[test]
  fn sends_in_order() {
    let (mut s, rx) = session(false);
    for x in 0..10 {
      s.queue(chunk(x));
    }
    // The initial estimate allows 3.5 chunks per tick.
    assert_eq!(s.tick(), 3);
    assert_eq!(received(&rx), vec![0, 1, 2]);
    assert_eq!(s.pending(), 7);

    let mut total = 3;
    while s.pending() > 0 {
      let sent = s.tick();
      assert!(sent >= 1);
      total += sent;
    }
    assert_eq!(total, 10);
    assert_eq!(received(&rx), (3..10).collect::<Vec<_>>());
    assert_eq!(s.tick(), 0);
  }

  #[test]
  fn caches_sent_chunks() {
    let (mut s, _rx) = session(true);
    s.queue(chunk(2));
    s.tick();
    let cache = s.cache().unwrap().clone();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.block_at(32, -64, 0), 20);
    assert_eq!(cache.block_at(32, -48, 0), AIR);

    s.unload(ChunkPos::new(2, 0));
    assert!(cache.is_empty());

    s.queue(chunk(3));
    s.change_dimension(false);
    assert_eq!(s.pending(), 0);
    assert_eq!(s.assembler().bounds().min_section, 0);
    assert!(s.cache().unwrap().is_empty());
  }

  #[test]
  fn unload_drops_pending() {
    let (mut s, rx) = session(false);
    s.queue(chunk(0));
    s.queue(chunk(1));
    s.unload(ChunkPos::new(0, 0));
    s.tick();
    assert_eq!(received(&rx), vec![1]);
  }

  #[test]
  fn raw_chunks() {
    let (mut s, rx) = session(false);
    let mut data = vec![];
    let mut buf = Buffer::new(&mut data);
    buf.write_i16(4096);
    // Blocks, all set to java id 2.
    buf.write_u8(0);
    buf.write_varint(2);
    buf.write_varint(0);
    // Biomes.
    buf.write_u8(0);
    buf.write_varint(0);
    buf.write_varint(0);

    s.queue_raw(ChunkPos::new(5, 5), -4, 1, &data, vec![]).unwrap();
    assert_eq!(s.tick(), 1);
    match rx.try_recv() {
      Ok(Packet::LevelChunk(c)) => {
        assert_eq!(c.sub_chunk_count, 1);
        assert_eq!(&c.data[..6], &[9, 1, 0xfc, 1, 1, 30]);
      }
      p => panic!("unexpected packet {p:?}"),
    }

    let res = s.queue_raw(ChunkPos::new(5, 5), -4, 2, &data, vec![]);
    assert!(matches!(res, Err(Error::InvalidChunk { .. })));
    assert_eq!(s.pending(), 0);
  }

  #[test]
  fn disconnected_client() {
    let (mut s, rx) = session(false);
    drop(rx);
    s.queue(chunk(0));
    assert_eq!(s.tick(), 1);
  }
}
