//! The Bedrock side of the proxy's chunk pipeline. Java chunk columns come in
//! as [`SourceChunk`](br_common::chunk::SourceChunk)s, and go out as Bedrock
//! `LevelChunk` packets.

#[macro_use]
extern crate log;
#[macro_use]
extern crate smallvec;

pub mod batch;
pub mod cache;
pub mod chunk;
pub mod config;
pub mod conv;
mod error;
pub mod packet;
pub mod session;

pub use error::{Error, Result};

pub use batch::ChunkBatchSizeCalculator;
pub use cache::ChunkCache;
pub use config::ProxyConfig;
pub use conv::TypeConverter;
pub use packet::{LevelChunk, Packet, PacketSink};
pub use session::ChunkSession;
