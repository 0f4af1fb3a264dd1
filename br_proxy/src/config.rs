use crate::{chunk::TargetVersion, Result};
use br_common::config::{Config, TomlValue};
use log::LevelFilter;
use std::str::FromStr;
use toml::Value;

/// The default config, written next to the main config on startup.
pub const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// Settings for the chunk pipeline. Every field has a default in
/// `default.toml`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyConfig {
  /// Only show info logs by default.
  pub log_level:       LevelFilter,
  /// The path to the mappings json.
  pub mappings:        String,
  pub target_version:  TargetVersion,
  /// Uses overworld heights of -64 to 320 when set.
  pub extended_height: bool,
  /// Enables the [`ChunkCache`](crate::ChunkCache).
  pub cache:           bool,
  /// The number of free buffers the [`BufferPool`](br_common::util::BufferPool)
  /// will hold on to.
  pub pool_size:       usize,
}

impl Default for ProxyConfig {
  fn default() -> Self { ProxyConfig::from_config(&Config::new_src("", DEFAULT_CONFIG)) }
}

impl ProxyConfig {
  pub fn from_config(config: &Config) -> Self {
    let chunk = config.section("chunk");
    let mut pool_size: usize = chunk.get("pool-size");
    if pool_size == 0 {
      warn!("chunk.pool-size cannot be 0, using 1");
      pool_size = 1;
    }
    ProxyConfig {
      log_level: config.get("log-level"),
      mappings: config.get("mappings"),
      target_version: chunk.get("target-version"),
      extended_height: chunk.get("extended-height"),
      cache: chunk.get("cache"),
      pool_size,
    }
  }

  /// Loads the config at `path`, and writes the default config to
  /// `default_path`. A missing or invalid config file is logged, and the
  /// defaults are used.
  pub fn new(path: &str, default_path: &str) -> Self {
    ProxyConfig::from_config(&Config::new(path, default_path, DEFAULT_CONFIG))
  }

  /// Loads the config at `path`. Unlike [`new`](Self::new), this fails if the
  /// file cannot be read or parsed.
  pub fn load(path: &str) -> Result<Self> {
    Ok(ProxyConfig::from_config(&Config::load(path, DEFAULT_CONFIG)?))
  }
}

impl TomlValue<'_> for TargetVersion {
  fn from_toml(v: &Value) -> Option<Self> { TargetVersion::from_str(v.as_str()?).ok() }
  fn name() -> String { "bedrock version".into() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn defaults() {
    assert_eq!(
      ProxyConfig::default(),
      ProxyConfig {
        log_level:       LevelFilter::Info,
        mappings:        "mappings.json".into(),
        target_version:  TargetVersion::V1_18_0,
        extended_height: true,
        cache:           false,
        pool_size:       256,
      }
    );
  }

  #[test]
  fn overrides() {
    let config = Config::new_src(
      r#"
      log-level = "debug"

      [chunk]
      target-version = "1.17.10"
      extended-height = false
      cache = true
      "#,
      DEFAULT_CONFIG,
    );
    let config = ProxyConfig::from_config(&config);
    assert_eq!(config.log_level, LevelFilter::Debug);
    assert_eq!(config.target_version, TargetVersion::V1_17_10);
    assert!(!config.extended_height);
    assert!(config.cache);
    assert_eq!(config.pool_size, 256);
  }

  #[test]
  fn invalid_values_use_defaults() {
    let config = Config::new_src(
      r#"
      [chunk]
      target-version = "1.16.100"
      pool-size = 0
      cache = "yes"
      "#,
      DEFAULT_CONFIG,
    );
    let config = ProxyConfig::from_config(&config);
    assert_eq!(config.target_version, TargetVersion::V1_18_0);
    assert_eq!(config.pool_size, 1);
    assert!(!config.cache);
  }

  #[test]
  fn missing_file() {
    assert!(matches!(
      ProxyConfig::load("/this/file/does/not/exist.toml"),
      Err(crate::Error::Config(_))
    ));
  }
}
