use super::{Tag, NBT};
use crate::util::Buffer;
use std::io::{Cursor, Write};

impl NBT {
  /// Writes this tag tree using the Bedrock network encoding. Fixed width
  /// values are little endian, ints and longs are zigzag varints, and all
  /// string lengths are unsigned varints.
  pub fn serialize_network_buf<T>(&self, out: &mut Buffer<T>)
  where
    Cursor<T>: Write,
  {
    out.write_u8(self.tag.ty());
    if matches!(self.tag, Tag::End) {
      return;
    }
    out.write_str(&self.name);
    self.tag.serialize_network(out);
  }
  pub fn serialize_network(&self) -> Vec<u8> {
    let mut data = vec![];
    let mut out = Buffer::new(&mut data);
    self.serialize_network_buf(&mut out);
    data
  }
}

impl Tag {
  /// Returns the type of the tag.
  pub fn ty(&self) -> u8 {
    match self {
      Self::End => 0,
      Self::Byte(_) => 1,
      Self::Short(_) => 2,
      Self::Int(_) => 3,
      Self::Long(_) => 4,
      Self::Float(_) => 5,
      Self::Double(_) => 6,
      Self::ByteArr(_) => 7,
      Self::String(_) => 8,
      Self::List(_) => 9,
      Self::Compound(_) => 10,
      Self::IntArray(_) => 11,
      Self::LongArray(_) => 12,
    }
  }

  /// Serializes the data of the tag. Does not add type byte.
  fn serialize_network<T>(&self, out: &mut Buffer<T>)
  where
    Cursor<T>: Write,
  {
    match self {
      Self::End => (),
      Self::Byte(v) => out.write_i8(*v),
      Self::Short(v) => out.write_i16_le(*v),
      Self::Int(v) => out.write_varint_zigzag(*v),
      Self::Long(v) => out.write_varlong_zigzag(*v),
      Self::Float(v) => out.write_f32_le(*v),
      Self::Double(v) => out.write_f64_le(*v),
      Self::ByteArr(v) => {
        out.write_varint_zigzag(v.len() as i32);
        out.write_buf(v);
      }
      Self::String(v) => out.write_str(v),
      Self::List(v) => {
        out.write_u8(v.first().unwrap_or(&Self::End).ty());
        out.write_varint_zigzag(v.len() as i32);
        for tag in v {
          tag.serialize_network(out);
        }
      }
      Self::Compound(v) => {
        for (name, tag) in v {
          out.write_u8(tag.ty());
          if tag.ty() == Self::End.ty() {
            // End tags don't have a name, so we stop early.
            break;
          }
          out.write_str(name);
          tag.serialize_network(out);
        }
        out.write_u8(Self::End.ty());
      }
      Self::IntArray(v) => {
        out.write_varint_zigzag(v.len() as i32);
        for elem in v {
          out.write_varint_zigzag(*elem);
        }
      }
      Self::LongArray(v) => {
        out.write_varint_zigzag(v.len() as i32);
        for elem in v {
          out.write_varlong_zigzag(*elem);
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn serialize_empty() {
    let nbt = NBT::new("", Tag::compound(&[]));
    assert_eq!(nbt.serialize_network(), vec![10, 0, 0]);
    assert_eq!(NBT::new("", Tag::End).serialize_network(), vec![0]);
  }

  #[test]
  fn serialize_block_entity() {
    let nbt = NBT::new(
      "",
      Tag::compound(&[
        ("id", Tag::String("Chest".into())),
        ("x", Tag::Int(-1)),
        ("y", Tag::Int(64)),
        ("isMovable", Tag::Byte(1)),
      ]),
    );
    #[rustfmt::skip]
    let expected = vec![
      10, 0,
      8, 2, b'i', b'd', 5, b'C', b'h', b'e', b's', b't',
      3, 1, b'x', 1,
      3, 1, b'y', 128, 1,
      1, 9, b'i', b's', b'M', b'o', b'v', b'a', b'b', b'l', b'e', 1,
      0,
    ];
    assert_eq!(nbt.serialize_network(), expected);
  }

  #[test]
  fn serialize_lists() {
    let tag = Tag::compound(&[
      ("l", Tag::List(vec![Tag::Short(1), Tag::Short(-2)])),
      ("e", Tag::List(vec![])),
      ("f", Tag::Float(1.0)),
    ]);
    #[rustfmt::skip]
    let expected = vec![
      10, 0,
      9, 1, b'l', 2, 4, 1, 0, 0xfe, 0xff,
      9, 1, b'e', 0, 0,
      5, 1, b'f', 0, 0, 0x80, 0x3f,
      0,
    ];
    assert_eq!(NBT::new("", tag).serialize_network(), expected);
  }
}
