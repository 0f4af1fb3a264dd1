//! The tag format used for block entities. Both editions use the same tree of
//! tags, but write it very differently on the wire. Only the Bedrock network
//! encoding is needed here, so that is all that is implemented.

mod serialize;

/// A named root tag. On the wire, every tag tree starts with one of these.
#[derive(Debug, Clone, PartialEq)]
pub struct NBT {
  name: String,
  tag:  Tag,
}

/// A single tag. Compounds keep their insertion order, as the client reads
/// block entity fields in order in a few places.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
  End,
  Byte(i8),
  Short(i16),
  Int(i32),
  Long(i64),
  Float(f32),
  Double(f64),
  ByteArr(Vec<u8>),
  String(String),
  List(Vec<Tag>),
  Compound(Vec<(String, Tag)>),
  IntArray(Vec<i32>),
  LongArray(Vec<i64>),
}

impl NBT {
  /// Creates a new named tag. The name of a block entity root is almost
  /// always empty.
  pub fn new(name: &str, tag: Tag) -> Self { NBT { name: name.into(), tag } }
  pub fn name(&self) -> &str { &self.name }
  pub fn tag(&self) -> &Tag { &self.tag }
  pub fn into_tag(self) -> Tag { self.tag }
}

impl Tag {
  /// Builds a compound tag out of the given name/value pairs.
  pub fn compound(value: &[(&str, Tag)]) -> Self {
    Tag::Compound(value.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
  }

  /// If this is a compound, returns the first child with the given name.
  pub fn get(&self, name: &str) -> Option<&Tag> {
    match self {
      Self::Compound(v) => v.iter().find(|(k, _)| k == name).map(|(_, v)| v),
      _ => None,
    }
  }

  /// If this is a compound, sets the given child. An existing child with the
  /// same name is replaced in place, otherwise the child is appended.
  ///
  /// # Panics
  /// If this is not a compound.
  pub fn insert(&mut self, name: &str, tag: Tag) {
    match self {
      Self::Compound(v) => match v.iter_mut().find(|(k, _)| k == name) {
        Some((_, old)) => *old = tag,
        None => v.push((name.into(), tag)),
      },
      _ => panic!("cannot insert into {:?}, as it is not a compound", self),
    }
  }
}
