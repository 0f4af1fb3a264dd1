//! Outgoing Bedrock packets, and the queue they are handed to.

use br_common::{math::ChunkPos, util::Buffer};
use crossbeam_channel::{Sender, TrySendError};
use std::io::{Cursor, Write};

/// A full chunk column. The payload holds every sub chunk, the biomes, and
/// the block entities, already encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChunk {
  pub pos:             ChunkPos,
  pub sub_chunk_count: u32,
  pub cache_enabled:   bool,
  pub data:            Vec<u8>,
}

impl LevelChunk {
  pub const ID: u32 = 0x3a;

  pub fn write<T>(&self, buf: &mut Buffer<T>)
  where
    Cursor<T>: Write,
  {
    buf.write_varint_zigzag(self.pos.x());
    buf.write_varint_zigzag(self.pos.z());
    buf.write_varuint(self.sub_chunk_count);
    buf.write_bool(self.cache_enabled);
    // Blob ids would go here if caching was enabled.
    buf.write_varuint(self.data.len() as u32);
    buf.write_buf(&self.data);
  }
}

/// Every packet the chunk pipeline can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
  LevelChunk(LevelChunk),
}

impl Packet {
  pub fn id(&self) -> u32 {
    match self {
      Self::LevelChunk(_) => LevelChunk::ID,
    }
  }

  /// Writes the packet id, followed by the packet body.
  pub fn write<T>(&self, buf: &mut Buffer<T>)
  where
    Cursor<T>: Write,
  {
    buf.write_varuint(self.id());
    match self {
      Self::LevelChunk(p) => p.write(buf),
    }
  }

  /// Encodes the packet into a new buffer.
  pub fn serialize(&self) -> Vec<u8> {
    let mut buf = Buffer::new(vec![]);
    self.write(&mut buf);
    buf.into_inner()
  }
}

impl From<LevelChunk> for Packet {
  fn from(p: LevelChunk) -> Self { Packet::LevelChunk(p) }
}

/// The send queue of a single session. Sending never blocks, and a sink for a
/// client that has gone away just drops the packet.
pub trait PacketSink {
  fn send(&self, packet: Packet);
}

impl PacketSink for Sender<Packet> {
  fn send(&self, packet: Packet) {
    match self.try_send(packet) {
      Ok(()) => {}
      Err(TrySendError::Full(p)) => {
        warn!("send queue is full, dropping packet {:#x}", p.id());
      }
      Err(TrySendError::Disconnected(p)) => {
        debug!("dropping packet {:#x} for disconnected client", p.id());
      }
    }
  }
}
