use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

use std::{
  collections::TryReserveError,
  error::Error,
  fmt, io,
  io::{Cursor, Read, Write},
  ops::{Deref, DerefMut},
};

pub type Result<T> = std::result::Result<T, BufferError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Reading,
  Writing,
}

use Mode::{Reading, Writing};

#[derive(Debug)]
pub struct BufferError {
  err:  BufferErrorKind,
  pos:  u64,
  mode: Mode,
}

impl fmt::Display for BufferError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    if self.mode == Mode::Reading {
      write!(f, "error while reading from buffer at index {}: {}", self.pos, self.err)
    } else {
      write!(f, "error while writing to buffer at index {}: {}", self.pos, self.err)
    }
  }
}

#[derive(Debug)]
pub enum BufferErrorKind {
  VarInt,
  IO(io::Error),
  Alloc(TryReserveError),
  ArrayTooLong { len: u64, max: u64 },
  NegativeLen(i32),
  Invalid(String),
}

impl fmt::Display for BufferErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::VarInt => write!(f, "varint is too long"),
      Self::IO(e) => write!(f, "{}", e),
      Self::Alloc(e) => write!(f, "could not allocate buffer: {}", e),
      Self::ArrayTooLong { len, max } => {
        write!(f, "array is `{}` elements, longer than max `{}`", len, max)
      }
      Self::NegativeLen(len) => write!(f, "len `{}` is negative", len),
      Self::Invalid(msg) => write!(f, "invalid data: {}", msg),
    }
  }
}

impl Error for BufferError {}

impl BufferError {
  pub fn kind(&self) -> &BufferErrorKind { &self.err }
  pub fn pos(&self) -> u64 { self.pos }
  pub fn mode(&self) -> Mode { self.mode }
}

impl From<io::Error> for BufferErrorKind {
  fn from(e: io::Error) -> Self { BufferErrorKind::IO(e) }
}
impl From<TryReserveError> for BufferErrorKind {
  fn from(e: TryReserveError) -> Self { BufferErrorKind::Alloc(e) }
}

#[derive(Debug)]
pub struct Buffer<T> {
  data: Cursor<T>,
}

macro_rules! add_read {
  ($fn: ident, $ty: ty) => {
    pub fn $fn(&mut self) -> Result<$ty> {
      self.data.$fn::<BigEndian>().map_err(|e| self.err(e, Reading))
    }
  };
}
// The same as add_read(), but with no type parameter
macro_rules! add_read_byte {
  ($fn: ident, $ty: ty) => {
    pub fn $fn(&mut self) -> Result<$ty> { self.data.$fn().map_err(|e| self.err(e, Reading)) }
  };
}

macro_rules! add_write {
  ($fn: ident, $ty: ty) => {
    pub fn $fn(&mut self, v: $ty) {
      self.data.$fn::<BigEndian>(v).expect("could not write to buffer")
    }
  };
}
// Little endian writes. Bedrock uses these for almost everything fixed width.
macro_rules! add_write_le {
  ($name: ident, $fn: ident, $ty: ty) => {
    pub fn $name(&mut self, v: $ty) {
      self.data.$fn::<LittleEndian>(v).expect("could not write to buffer")
    }
  };
}
// The same as add_write(), but with no type parameter
macro_rules! add_write_byte {
  ($fn: ident, $ty: ty) => {
    pub fn $fn(&mut self, v: $ty) { self.data.$fn(v).expect("could not write to buffer") }
  };
}

impl<T> Buffer<T> {
  pub fn new(data: T) -> Self { Buffer { data: Cursor::new(data) } }

  pub fn err(&self, e: impl Into<BufferErrorKind>, mode: Mode) -> BufferError {
    BufferError { err: e.into(), pos: self.data.position(), mode }
  }

  pub fn into_inner(self) -> T { self.data.into_inner() }
}

impl<T> Buffer<T>
where
  T: AsRef<[u8]>,
{
  pub fn len(&self) -> usize { self.data.get_ref().as_ref().len() }
  pub fn is_empty(&self) -> bool { self.len() == 0 }
  pub fn index(&self) -> usize { self.data.position() as usize }
  /// Returns the number of bytes left to read.
  pub fn remaining(&self) -> usize { self.len().saturating_sub(self.index()) }

  pub fn read_bool(&mut self) -> Result<bool> { Ok(self.read_u8()? != 0) }
  add_read_byte!(read_u8, u8);
  add_read!(read_u16, u16);
  add_read!(read_u32, u32);
  add_read!(read_u64, u64);
  add_read_byte!(read_i8, i8);
  add_read!(read_i16, i16);
  add_read!(read_i32, i32);
  add_read!(read_i64, i64);

  /// Reads exactly `len` bytes. If there are not enough bytes left, this
  /// returns an error, and the buffer is not guaranteed to be in a useful
  /// state.
  pub fn read_buf(&mut self, len: usize) -> Result<Vec<u8>> {
    if len > self.remaining() {
      return Err(self.err(
        BufferErrorKind::ArrayTooLong { len: len as u64, max: self.remaining() as u64 },
        Reading,
      ));
    }
    let mut buf = vec![0; len];
    self.data.read_exact(&mut buf).map_err(|e| self.err(e, Reading))?;
    Ok(buf)
  }

  pub fn read_varint(&mut self) -> Result<i32> {
    let mut res: i32 = 0;
    for i in 0..5 {
      let read = self.read_u8()?;
      if i == 4 && read & 0b10000000 != 0 {
        return Err(self.err(BufferErrorKind::VarInt, Reading));
      }

      let v = read & 0b01111111;
      res |= (v as i32) << (7 * i);

      if read & 0b10000000 == 0 {
        break;
      }
    }
    Ok(res)
  }

  /// Reads a varint, and makes sure it is a valid length (not negative, and
  /// less than or equal to `max`).
  pub fn read_len(&mut self, max: usize) -> Result<usize> {
    let len = self.read_varint()?;
    let len =
      usize::try_from(len).map_err(|_| self.err(BufferErrorKind::NegativeLen(len), Reading))?;
    if len > max {
      return Err(
        self.err(BufferErrorKind::ArrayTooLong { len: len as u64, max: max as u64 }, Reading),
      );
    }
    Ok(len)
  }

  /// Reads a list from the buffer. If the length is greater than `max`, this
  /// fails.
  pub fn read_list_max<U>(
    &mut self,
    val: impl Fn(&mut Buffer<T>) -> Result<U>,
    max: usize,
  ) -> Result<Vec<U>> {
    let len = self.read_len(max)?;
    let mut list = Vec::with_capacity(len);
    for _ in 0..len {
      list.push(val(self)?);
    }
    Ok(list)
  }
}

impl<T> Buffer<T>
where
  Cursor<T>: io::Write,
{
  pub fn write_bool(&mut self, v: bool) {
    if v {
      self.write_u8(1);
    } else {
      self.write_u8(0);
    }
  }
  add_write_byte!(write_u8, u8);
  add_write!(write_u16, u16);
  add_write!(write_u32, u32);
  add_write!(write_u64, u64);
  add_write_byte!(write_i8, i8);
  add_write!(write_i16, i16);
  add_write!(write_i32, i32);
  add_write!(write_i64, i64);

  add_write_le!(write_u16_le, write_u16, u16);
  add_write_le!(write_u32_le, write_u32, u32);
  add_write_le!(write_i16_le, write_i16, i16);
  add_write_le!(write_i32_le, write_i32, i32);
  add_write_le!(write_i64_le, write_i64, i64);
  add_write_le!(write_f32_le, write_f32, f32);
  add_write_le!(write_f64_le, write_f64, f64);

  /// This doesn't return a result, as the only thing that could go wrong is a
  /// oom error, which isn't even returned as an error.
  pub fn write_buf(&mut self, v: &[u8]) {
    self.data.write_all(v).expect("could not write to buffer");
  }

  /// Writes a Java edition varint. Negative numbers always take up 5 bytes.
  pub fn write_varint(&mut self, v: i32) {
    // Need to work with u32, as >> acts differently on i32 vs u32.
    self.write_varuint(v as u32);
  }

  /// Writes an unsigned varint. This is the Bedrock `VarUInt32`.
  pub fn write_varuint(&mut self, mut val: u32) {
    for _ in 0..5 {
      let mut b: u8 = val as u8 & 0b01111111;
      val >>= 7;
      if val != 0 {
        b |= 0b10000000;
      }
      self.write_u8(b);
      if val == 0 {
        break;
      }
    }
  }

  /// Writes an unsigned 64 bit varint. This is the Bedrock `VarUInt64`.
  pub fn write_varulong(&mut self, mut val: u64) {
    for _ in 0..10 {
      let mut b: u8 = val as u8 & 0b01111111;
      val >>= 7;
      if val != 0 {
        b |= 0b10000000;
      }
      self.write_u8(b);
      if val == 0 {
        break;
      }
    }
  }

  /// Writes a zigzag encoded signed varint. This is the Bedrock `VarInt32`.
  pub fn write_varint_zigzag(&mut self, v: i32) { self.write_varuint(super::zigzag32(v)); }
  /// Writes a zigzag encoded signed 64 bit varint. This is the Bedrock
  /// `VarInt64`.
  pub fn write_varlong_zigzag(&mut self, v: i64) { self.write_varulong(super::zigzag64(v)); }

  /// Writes a string prefixed by an unsigned varint length, which is what both
  /// editions use on the network.
  pub fn write_str(&mut self, v: &str) {
    self.write_varuint(v.len() as u32);
    self.write_buf(v.as_bytes());
  }
}

impl Buffer<Vec<u8>> {
  /// Makes sure that `additional` more bytes can be written without
  /// reallocating. Unlike the write functions, this returns an error if the
  /// allocation fails.
  pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
    let res = self.data.get_mut().try_reserve(additional);
    res.map_err(|e| self.err(e, Writing))
  }
}

impl Buffer<&mut Vec<u8>> {
  /// See [`Buffer::<Vec<u8>>::try_reserve`].
  pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
    let res = self.data.get_mut().try_reserve(additional);
    res.map_err(|e| self.err(e, Writing))
  }
}

impl<T> Deref for Buffer<T> {
  type Target = T;

  fn deref(&self) -> &Self::Target { self.data.get_ref() }
}

impl<T> DerefMut for Buffer<T> {
  fn deref_mut(&mut self) -> &mut Self::Target { self.data.get_mut() }
}
