use br_common::{config::ParseError, math::ChunkPos, util::BufferError};
use std::{collections::TryReserveError, fmt, io};

#[derive(Debug)]
pub enum Error {
  Buffer(BufferError),
  IO(io::Error),
  /// The scratch buffer for a chunk could not be allocated.
  Alloc {
    pos:       ChunkPos,
    requested: usize,
    err:       TryReserveError,
  },
  InvalidChunk {
    pos: ChunkPos,
    msg: String,
  },
  Json(serde_json::Error),
  Config(ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::Buffer(e) => write!(f, "{e}"),
      Self::IO(e) => write!(f, "{e}"),
      Self::Alloc { pos, requested, err } => {
        write!(f, "could not allocate {requested} bytes for chunk {pos}: {err}")
      }
      Self::InvalidChunk { pos, msg } => write!(f, "invalid chunk {pos}: {msg}"),
      Self::Json(e) => write!(f, "invalid json: {e}"),
      Self::Config(e) => write!(f, "invalid config: {e}"),
    }
  }
}

impl std::error::Error for Error {}

impl From<BufferError> for Error {
  fn from(e: BufferError) -> Self { Error::Buffer(e) }
}
impl From<io::Error> for Error {
  fn from(e: io::Error) -> Self { Error::IO(e) }
}
impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self { Error::Json(e) }
}
impl From<ParseError> for Error {
  fn from(e: ParseError) -> Self { Error::Config(e) }
}
