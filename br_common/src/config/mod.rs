use std::{error::Error, fmt, fs, io};
use toml::Value;

mod types;


/// A loaded config file. This always has a default config behind it, which is
/// compiled into the binary. Any key missing from the primary config is read
/// from the default instead.
#[derive(Debug, Clone)]
pub struct Config {
  primary: Value,
  default: Value,
}

/// A view into one table of a [`Config`]. Every key passed to
/// [`get`](Self::get) is prefixed with this section's path.
#[derive(Debug, Clone)]
pub struct ConfigSection<'a> {
  config: &'a Config,
  path:   Vec<String>,
}

#[derive(Debug)]
pub enum ParseError {
  IO(io::Error),
  Toml(toml::de::Error),
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::IO(e) => write!(f, "io error: {e}"),
      Self::Toml(e) => write!(f, "invalid toml: {e}"),
    }
  }
}

impl Error for ParseError {}

impl From<io::Error> for ParseError {
  fn from(e: io::Error) -> Self { ParseError::IO(e) }
}
impl From<toml::de::Error> for ParseError {
  fn from(e: toml::de::Error) -> Self { ParseError::Toml(e) }
}

pub trait TomlValue<'a> {
  /// If this current type matches the toml value, this returns Some(v).
  fn from_toml(v: &'a Value) -> Option<Self>
  where
    Self: Sized;

  /// Returns the name of this toml value (string, integer, etc).
  fn name() -> String
  where
    Self: Sized;
}

/// A toml key. This is how a path to a toml value can be specified. This can be
/// represented as either an array or a string. If it is a string, it will be
/// split by dots into an array.
///
/// ```ignore
/// log-level = "info"
///
/// [chunk]
/// cache = false
/// ```
///
/// These are valid indices:
/// ```ignore
/// log-level   // points to "info"
/// chunk.cache // points to false
/// ```
pub trait TomlKey {
  /// Returns the sections of this key.
  fn sections(&self) -> Vec<&str>;
}

impl TomlKey for str {
  fn sections(&self) -> Vec<&str> { self.split('.').collect() }
}
impl TomlKey for [&str] {
  fn sections(&self) -> Vec<&str> { self.to_vec() }
}

impl Config {
  /// Creates a new config for the given path. The path is a runtime path to
  /// load the config file. The default source should be loaded with
  /// `include_str!`, and is used whenever a key is not present in the main
  /// config. When this is created, the default source is written to
  /// `default_path`, so that users can see every available key. If the file
  /// cannot be written, a warning will be printed.
  ///
  /// If the primary config cannot be read or parsed, an error is logged and
  /// the default is used for every key.
  pub fn new(path: &str, default_path: &str, default_src: &str) -> Self {
    fs::write(default_path, default_src).unwrap_or_else(|e| {
      warn!("could not write default configuration to disk at `{}`: {}", default_path, e);
    });
    let primary = Self::load_toml(path).unwrap_or_else(|e| {
      error!("error loading toml at `{}`: {}", path, e);
      Value::Table(Default::default())
    });
    Config { primary, default: Self::parse_default(default_src) }
  }

  /// Loads the config at the given path, failing if it cannot be read or is
  /// invalid toml.
  pub fn load(path: &str, default_src: &str) -> Result<Self, ParseError> {
    Ok(Config { primary: Self::load_toml(path)?, default: Self::parse_default(default_src) })
  }

  /// Creates a config from two sources. Mostly useful in tests. If the primary
  /// source is invalid, an error is logged and only the default is used.
  pub fn new_src(src: &str, default_src: &str) -> Self {
    let primary = src.parse().unwrap_or_else(|e| {
      error!("error loading toml: {}", e);
      Value::Table(Default::default())
    });
    Config { primary, default: Self::parse_default(default_src) }
  }

  fn load_toml(path: &str) -> Result<Value, ParseError> {
    Ok(fs::read_to_string(path)?.parse()?)
  }
  fn parse_default(src: &str) -> Value {
    src.parse().unwrap_or_else(|e| {
      error!("error loading default toml: {}", e);
      Value::Table(Default::default())
    })
  }

  /// Reads the toml value at the given key. This will always return a value. If
  /// the value doesn't exist in the primary config (or the value is the wrong
  /// type), then it will use the default config. If it doesn't exist there (or
  /// if it's the wrong type), this function will panic.
  ///
  /// All the keys that can be loaded should be present in the default config,
  /// so that it is easy for users to find and edit them.
  pub fn get<'a, K: ?Sized, T>(&'a self, key: &K) -> T
  where
    K: TomlKey,
    T: TomlValue<'a>,
  {
    let sections = key.sections();
    match Self::get_val(&self.primary, &sections) {
      Some(val) => match T::from_toml(val) {
        Some(v) => v,
        None => {
          warn!(
            "unexpected value at `{}`: {}, expected a {}",
            sections.join("."),
            val,
            T::name()
          );
          self.get_default(&sections)
        }
      },
      None => self.get_default(&sections),
    }
  }

  /// Gets the default value at the given key. This will panic if the key does
  /// not exist, or if it was the wrong type.
  fn get_default<'a, T>(&'a self, sections: &[&str]) -> T
  where
    T: TomlValue<'a>,
  {
    let val = Self::get_val(&self.default, sections);
    match val.and_then(T::from_toml) {
      Some(v) => v,
      None => panic!(
        "default had wrong type for key `{}`: {:?}, expected a {}",
        sections.join("."),
        val,
        T::name(),
      ),
    }
  }

  fn get_val<'a>(toml: &'a Value, sections: &[&str]) -> Option<&'a Value> {
    let mut val = toml;
    for s in sections {
      val = match val {
        Value::Table(map) => map.get(*s)?,
        Value::Array(arr) => arr.get(s.parse::<usize>().ok()?)?,
        _ => return None,
      };
    }
    Some(val)
  }

  /// Returns a config section for the given key.
  pub fn section<K: ?Sized>(&self, key: &K) -> ConfigSection<'_>
  where
    K: TomlKey,
  {
    ConfigSection { config: self, path: key.sections().iter().map(|v| v.to_string()).collect() }
  }
}

impl ConfigSection<'_> {
  /// Gets the config value at the given key, prefixed by this reference's path.
  pub fn get<'b, K: ?Sized, T>(&'b self, key: &K) -> T
  where
    K: TomlKey,
    T: TomlValue<'b>,
  {
    let mut path: Vec<_> = self.path.iter().map(|s| s.as_str()).collect();
    path.extend(key.sections());
    self.config.get(path.as_slice())
  }
}
